//! Response adapters that fetch the raw profile for one callback.
//!
//! Slack answers the two sign-in shapes from different methods: a workspace install is
//! resolved with `auth.test` and the primary token, while an identity-scoped sign-in calls
//! `users.identity` with the human's own token from `authed_user`. [`ResponseShape`] is fixed
//! once per request and [`ResponseAdapter`] memoizes everything it derives.

// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	api::SlackApi,
	auth::{self, AccessToken},
	http::SlackHttpClient,
	oauth::TransportErrorMapper,
	obs::{FlowKind, FlowSpan},
	options::SlackOptions,
	provider::SlackMethod,
};

/// Profile shape selected for a callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseShape {
	/// Flat `auth.test` profile fetched with the primary token.
	Standard,
	/// Nested `users.identity` profile fetched with the `authed_user` token.
	IdentityScoped,
}
impl ResponseShape {
	/// Classifies the options of one request.
	pub fn classify(options: &SlackOptions) -> Self {
		if auth::identity_scoped(
			&options.authorize_options,
			options.scope.as_deref(),
			options.user_scope.as_deref(),
		) {
			Self::IdentityScoped
		} else {
			Self::Standard
		}
	}

	/// Slack method that yields the raw profile.
	pub const fn profile_method(self) -> SlackMethod {
		match self {
			Self::Standard => SlackMethod::AuthTest,
			Self::IdentityScoped => SlackMethod::UsersIdentity,
		}
	}

	/// Observability label for the shape.
	pub const fn flow_kind(self) -> FlowKind {
		match self {
			Self::Standard => FlowKind::Standard,
			Self::IdentityScoped => FlowKind::IdentityScoped,
		}
	}
}

/// Per-request adapter over the primary access token.
pub struct ResponseAdapter<'a, C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	api: &'a SlackApi<C, M>,
	shape: ResponseShape,
	access_token: &'a AccessToken,
	identity_token: OnceLock<Option<AccessToken>>,
	raw_info: OnceCell<JsonObject>,
}
impl<'a, C, M> ResponseAdapter<'a, C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an adapter for one callback.
	pub fn new(api: &'a SlackApi<C, M>, shape: ResponseShape, access_token: &'a AccessToken) -> Self {
		Self { api, shape, access_token, identity_token: OnceLock::new(), raw_info: OnceCell::new() }
	}

	/// Shape the adapter was built for.
	pub fn shape(&self) -> ResponseShape {
		self.shape
	}

	/// Primary access token returned by the exchange.
	pub fn access_token(&self) -> &'a AccessToken {
		self.access_token
	}

	pub(crate) fn api(&self) -> &'a SlackApi<C, M> {
		self.api
	}

	/// Token built from the primary token's `authed_user` member, derived at most once.
	pub fn identity_access_token(&self) -> Result<&AccessToken> {
		self.identity_token
			.get_or_init(|| {
				let params = self.access_token.authed_user()?.clone();

				AccessToken::from_params(params, OffsetDateTime::now_utc()).ok()
			})
			.as_ref()
			.ok_or(Error::MissingField { path: "authed_user.access_token" })
	}

	/// Raw profile for the selected shape, fetched at most once.
	///
	/// Unusable bodies yield an empty object; transport failures abort.
	pub async fn raw_info(&self) -> Result<&JsonObject> {
		self.raw_info.get_or_try_init(|| self.fetch_raw_info()).await
	}

	async fn fetch_raw_info(&self) -> Result<JsonObject> {
		let token = match self.shape {
			ResponseShape::Standard => self.access_token,
			ResponseShape::IdentityScoped => self.identity_access_token()?,
		};
		let span = FlowSpan::new(self.shape.flow_kind(), "raw_info");

		span.instrument(self.api.get(self.shape.profile_method(), &token.token, &[])).await
	}
}
impl<C, M> Debug for ResponseAdapter<'_, C, M>
where
	C: ?Sized + SlackHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ResponseAdapter")
			.field("shape", &self.shape)
			.field("access_token", self.access_token)
			.field("raw_info_loaded", &self.raw_info.is_initialized())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{_preludet::*, options::AuthorizeOption};

	type TestApi = SlackApi<RecordingHttpClient, RecordingErrorMapper>;

	fn api(client: &Arc<RecordingHttpClient>) -> TestApi {
		SlackApi::new(test_descriptor(), client.clone(), Arc::new(RecordingErrorMapper))
	}

	fn standard_token() -> AccessToken {
		AccessToken::new("xoxb-primary").with_param(
			"authed_user",
			json!({ "id": "U1", "access_token": "xoxp-human", "token_type": "user" }),
		)
	}

	#[test]
	fn classify_follows_user_scope() {
		let identity = SlackOptions::default().with_user_scope("identity.basic,identity.email");
		let unforwarded = identity.clone().with_authorize_options([AuthorizeOption::Scope]);

		assert_eq!(ResponseShape::classify(&identity), ResponseShape::IdentityScoped);
		assert_eq!(ResponseShape::classify(&unforwarded), ResponseShape::Standard);
		assert_eq!(ResponseShape::classify(&SlackOptions::default()), ResponseShape::Standard);
	}

	#[test]
	fn identity_token_is_derived_from_authed_user() {
		let client = Arc::new(RecordingHttpClient::default());
		let api = api(&client);
		let token = standard_token();
		let adapter = ResponseAdapter::new(&api, ResponseShape::IdentityScoped, &token);
		let first = adapter.identity_access_token().expect("authed_user should yield a token.");

		assert_eq!(first.token.expose(), "xoxp-human");
		assert_eq!(first.param("token_type"), Some(&json!("user")));
		assert!(std::ptr::eq(
			first,
			adapter.identity_access_token().expect("Derived token should be cached.")
		));
	}

	#[test]
	fn identity_token_requires_authed_user() {
		let client = Arc::new(RecordingHttpClient::default());
		let api = api(&client);
		let token = AccessToken::new("xoxp-only");
		let adapter = ResponseAdapter::new(&api, ResponseShape::IdentityScoped, &token);
		let err = adapter.identity_access_token().expect_err("Missing authed_user should fail.");

		assert!(matches!(err, Error::MissingField { path: "authed_user.access_token" }));
	}

	#[tokio::test]
	async fn standard_raw_info_uses_primary_token_once() {
		let client = Arc::new(
			RecordingHttpClient::default()
				.with_json("/api/auth.test", r#"{"ok":true,"user_id":"U1","team_id":"T1"}"#),
		);
		let api = api(&client);
		let token = standard_token();
		let adapter = ResponseAdapter::new(&api, ResponseShape::Standard, &token);
		let raw = adapter.raw_info().await.expect("auth.test should succeed.");

		assert_eq!(raw.get("user_id"), Some(&json!("U1")));

		adapter.raw_info().await.expect("Memoized raw info should be returned.");

		let calls = client.calls();

		assert_eq!(calls.len(), 1);
		assert_eq!(calls[0].path_and_query, "/api/auth.test");
		assert_eq!(calls[0].authorization.as_deref(), Some("Bearer xoxb-primary"));
	}

	#[tokio::test]
	async fn identity_raw_info_uses_authed_user_token() {
		let client = Arc::new(RecordingHttpClient::default().with_json(
			"/api/users.identity",
			r#"{"ok":true,"user":{"id":"U1","name":"Ada"},"team":{"id":"T1","name":"Analytical"}}"#,
		));
		let api = api(&client);
		let token = standard_token();
		let adapter = ResponseAdapter::new(&api, ResponseShape::IdentityScoped, &token);
		let raw = adapter.raw_info().await.expect("users.identity should succeed.");

		assert_eq!(raw.get("team"), Some(&json!({ "id": "T1", "name": "Analytical" })));
		assert_eq!(client.calls_to("/api/auth.test"), 0);
		assert_eq!(
			client.calls()[0].authorization.as_deref(),
			Some("Bearer xoxp-human")
		);
	}

	#[tokio::test]
	async fn degraded_profile_is_empty() {
		let client = Arc::new(
			RecordingHttpClient::default()
				.with_json("/api/auth.test", r#"{"ok":false,"error":"invalid_auth"}"#),
		);
		let api = api(&client);
		let token = standard_token();
		let adapter = ResponseAdapter::new(&api, ResponseShape::Standard, &token);

		assert!(adapter.raw_info().await.expect("Degraded body should not fail.").is_empty());
	}
}
