//! Identity normalization: one [`AuthHash`] out of whichever profile shape Slack returned.
//!
//! The normalizer reads the raw profile through a [`ResponseAdapter`], enriches workspace
//! installs with `users.info` unless `skip_info` is set, and never overwrites the five base
//! `info` members with enrichment data.

// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	adapter::{ResponseAdapter, ResponseShape},
	auth::AccessToken,
	http::SlackHttpClient,
	oauth::TransportErrorMapper,
	obs::FlowSpan,
	options::SlackOptions,
	provider::SlackMethod,
};

/// Normalized sign-in result handed back to the host.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuthHash {
	/// Always `"slack"`.
	pub provider: String,
	/// Slack user id.
	pub uid: String,
	/// Display-oriented profile members.
	pub info: Info,
	/// Token material.
	pub credentials: Credentials,
	/// Raw payloads for hosts that need more than `info`.
	pub extra: Extra,
}

/// Profile summary.
///
/// The five base members always serialize, as `null` when Slack did not provide them.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Info {
	/// Handle shown in the host UI.
	pub nickname: Option<String>,
	/// Workspace name.
	pub team: Option<String>,
	/// User handle.
	pub user: Option<String>,
	/// Workspace id.
	pub team_id: Option<String>,
	/// User id.
	pub user_id: Option<String>,
	/// Enrichment members from `users.info`; absent with `skip_info`.
	#[serde(flatten)]
	pub extended: Option<ExtendedInfo>,
}

/// Additive profile members read from `users.info`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ExtendedInfo {
	/// Full name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Display name chosen by the user.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
	/// Email address.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Given name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub last_name: Option<String>,
	/// Profile title.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// 24px avatar.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_24: Option<String>,
	/// 48px avatar.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image_48: Option<String>,
	/// Largest available avatar.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub image: Option<String>,
	/// IANA time zone.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub time_zone: Option<String>,
	/// Workspace admin flag.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_admin: Option<bool>,
	/// Workspace owner flag.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub is_owner: Option<bool>,
}
impl ExtendedInfo {
	/// Reads the members from a `users.info` user object, preferring its `profile`.
	pub fn from_user_info(user_info: &JsonObject) -> Self {
		let profile = user_info.get("profile").and_then(Value::as_object);
		let lookup = |key: &str| {
			profile.and_then(|profile| profile.get(key)).or_else(|| user_info.get(key))
		};
		let text = |key: &str| lookup(key).and_then(Value::as_str).map(str::to_owned);
		let flag = |key: &str| lookup(key).and_then(Value::as_bool);

		Self {
			name: text("real_name").or_else(|| text("name")),
			display_name: text("display_name"),
			email: text("email"),
			first_name: text("first_name"),
			last_name: text("last_name"),
			description: text("title"),
			image_24: text("image_24"),
			image_48: text("image_48"),
			image: text("image_192").or_else(|| text("image_72")),
			time_zone: text("tz"),
			is_admin: flag("is_admin"),
			is_owner: flag("is_owner"),
		}
	}
}

/// Raw payloads.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Extra {
	/// Profile as returned by `auth.test` or `users.identity`.
	pub raw_info: JsonObject,
	/// `incoming_webhook` member of the token response.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub web_hook_info: Option<JsonObject>,
	/// `bot` member of the token response.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub bot_info: Option<JsonObject>,
	/// Enrichment user object.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub user_info: Option<JsonObject>,
}

/// Token material.
///
/// `expires_at` and `refresh_token` only appear for expiring tokens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
	/// Bearer token.
	pub token: String,
	/// Whether the token expires.
	pub expires: bool,
	/// Expiry instant in epoch seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_at: Option<i64>,
	/// Refresh token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
}
impl From<&AccessToken> for Credentials {
	fn from(token: &AccessToken) -> Self {
		let expires = token.expires();

		Self {
			token: token.token.expose().to_owned(),
			expires,
			expires_at: token.expires_at.filter(|_| expires),
			refresh_token: token
				.refresh_token
				.as_ref()
				.filter(|_| expires)
				.map(|secret| secret.expose().to_owned()),
		}
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("token", &"<redacted>")
			.field("expires", &self.expires)
			.field("expires_at", &self.expires_at)
			.field("refresh_token_set", &self.refresh_token.is_some())
			.finish()
	}
}

/// Per-request normalizer.
pub struct IdentityNormalizer<'a, C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	adapter: ResponseAdapter<'a, C, M>,
	options: &'a SlackOptions,
	user_info: OnceCell<JsonObject>,
}
impl<'a, C, M> IdentityNormalizer<'a, C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Wraps an adapter with the options of the same request.
	pub fn new(adapter: ResponseAdapter<'a, C, M>, options: &'a SlackOptions) -> Self {
		Self { adapter, options, user_info: OnceCell::new() }
	}

	/// Adapter the normalizer reads through.
	pub fn adapter(&self) -> &ResponseAdapter<'a, C, M> {
		&self.adapter
	}

	/// Slack user id: `user.id` for identity-scoped profiles, `user_id` otherwise.
	pub async fn uid(&self) -> Result<String> {
		let raw = self.adapter.raw_info().await?;
		let (value, path) = match self.adapter.shape() {
			ResponseShape::IdentityScoped =>
				(raw.get("user").and_then(|user| user.get("id")), "user.id"),
			ResponseShape::Standard => (raw.get("user_id"), "user_id"),
		};

		value
			.and_then(Value::as_str)
			.filter(|uid| !uid.is_empty())
			.map(str::to_owned)
			.ok_or(Error::MissingField { path })
	}

	/// User object: `raw_info.user` for identity-scoped profiles, the `users.info` answer
	/// otherwise. Fetched at most once.
	pub async fn user_info(&self) -> Result<&JsonObject> {
		self.user_info.get_or_try_init(|| self.fetch_user_info()).await
	}

	async fn fetch_user_info(&self) -> Result<JsonObject> {
		let raw = self.adapter.raw_info().await?;

		if let ResponseShape::IdentityScoped = self.adapter.shape() {
			return Ok(raw.get("user").and_then(Value::as_object).cloned().unwrap_or_default());
		}

		let Some(user_id) = raw.get("user_id").and_then(Value::as_str) else {
			return Ok(JsonObject::new());
		};
		let span = FlowSpan::new(self.adapter.shape().flow_kind(), "user_info");
		let mut body = span
			.instrument(self.adapter.api().get(
				SlackMethod::UsersInfo,
				&self.adapter.access_token().token,
				&[("user", user_id)],
			))
			.await?;

		Ok(match body.remove("user") {
			Some(Value::Object(user)) => user,
			_ => body,
		})
	}

	/// Profile summary; enrichment is skipped with `skip_info`.
	pub async fn info(&self) -> Result<Info> {
		let raw = self.adapter.raw_info().await?;
		let text = |value: Option<&Value>| value.and_then(Value::as_str).map(str::to_owned);
		let mut info = match self.adapter.shape() {
			ResponseShape::IdentityScoped => {
				let user = raw.get("user");
				let team = raw.get("team");
				let name = text(user.and_then(|user| user.get("name")));

				Info {
					nickname: name.clone(),
					team: text(team.and_then(|team| team.get("name"))),
					user: name,
					team_id: text(team.and_then(|team| team.get("id"))),
					user_id: text(user.and_then(|user| user.get("id"))),
					extended: None,
				}
			},
			ResponseShape::Standard => {
				let user = text(raw.get("user"));

				Info {
					nickname: user.clone(),
					team: text(raw.get("team")),
					user,
					team_id: text(raw.get("team_id")),
					user_id: text(raw.get("user_id")),
					extended: None,
				}
			},
		};

		if !self.options.skip_info {
			info.extended = Some(ExtendedInfo::from_user_info(self.user_info().await?));
		}

		Ok(info)
	}

	/// Raw payloads; only `raw_info` with `skip_info`.
	pub async fn extra(&self) -> Result<Extra> {
		let raw_info = self.adapter.raw_info().await?.clone();

		if self.options.skip_info {
			return Ok(Extra { raw_info, ..Default::default() });
		}

		let token = self.adapter.access_token();
		let param = |key: &str| token.param(key).and_then(Value::as_object).cloned().unwrap_or_default();

		Ok(Extra {
			raw_info,
			web_hook_info: Some(param("incoming_webhook")),
			bot_info: Some(param("bot")),
			user_info: Some(self.user_info().await?.clone()),
		})
	}

	/// Token material of the primary token.
	pub fn credentials(&self) -> Credentials {
		Credentials::from(self.adapter.access_token())
	}

	/// Runs every stage in order and bundles the result.
	pub async fn auth_hash(&self) -> Result<AuthHash> {
		let uid = self.uid().await?;
		let info = self.info().await?;
		let extra = self.extra().await?;

		Ok(AuthHash {
			provider: SlackOptions::PROVIDER_NAME.into(),
			uid,
			info,
			credentials: self.credentials(),
			extra,
		})
	}
}
impl<C, M> Debug for IdentityNormalizer<'_, C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityNormalizer")
			.field("adapter", &self.adapter)
			.field("skip_info", &self.options.skip_info)
			.finish()
	}
}
