//! Access tokens produced by the code exchange and derived from `authed_user`.

// self
use crate::{_prelude::*, auth::TokenSecret};

const RESERVED_KEYS: [&str; 5] = ["access_token", "refresh_token", "expires_in", "expires_at", "expires"];

/// Bearer credential plus the rest of the token response.
///
/// The token is read-only once built; the normalizer only borrows it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
	/// Bearer secret sent as `Authorization: Bearer ...`.
	pub token: TokenSecret,
	/// Expiry instant in epoch seconds; present only for rotating tokens.
	pub expires_at: Option<i64>,
	/// Refresh secret, if Slack issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Remaining token-response members (`authed_user`, `team`, `incoming_webhook`, ...).
	pub params: JsonObject,
}
impl AccessToken {
	/// Wraps a bare bearer token without expiry or extra parameters.
	pub fn new(token: impl Into<String>) -> Self {
		Self { token: TokenSecret::new(token), expires_at: None, refresh_token: None, params: JsonObject::new() }
	}

	/// Builds a token from a decoded token-response object.
	///
	/// `access_token` is required. `expires_in` (seconds after `issued_at`, number or numeric
	/// string) or `expires_at` (epoch seconds) sets the expiry; `expires_in` wins when both are
	/// present. The remaining members are kept in [`params`](Self::params).
	pub fn from_params(mut params: JsonObject, issued_at: OffsetDateTime) -> Result<Self> {
		let token = params
			.get("access_token")
			.and_then(Value::as_str)
			.filter(|token| !token.is_empty())
			.map(TokenSecret::new)
			.ok_or(Error::MissingField { path: "access_token" })?;
		let refresh_token = params
			.get("refresh_token")
			.and_then(Value::as_str)
			.map(TokenSecret::new);
		let expires_at = params
			.get("expires_in")
			.and_then(integer)
			.map(|secs| issued_at.unix_timestamp().saturating_add(secs))
			.or_else(|| params.get("expires_at").and_then(integer));

		for key in RESERVED_KEYS {
			params.remove(key);
		}

		Ok(Self { token, expires_at, refresh_token, params })
	}

	/// Sets an absolute expiry instant (epoch seconds).
	pub fn with_expires_at(mut self, expires_at: i64) -> Self {
		self.expires_at = Some(expires_at);

		self
	}

	/// Sets the refresh secret.
	pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Adds a token-response member.
	pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
		self.params.insert(key.into(), value);

		self
	}

	/// Returns true when the token carries an expiry instant.
	pub fn expires(&self) -> bool {
		self.expires_at.is_some()
	}

	/// Returns true if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| instant.unix_timestamp() >= expires_at)
	}

	/// Looks up a token-response member.
	pub fn param(&self, key: &str) -> Option<&Value> {
		self.params.get(key)
	}

	/// The `authed_user` object of a standard-flow response.
	pub fn authed_user(&self) -> Option<&JsonObject> {
		self.param("authed_user").and_then(Value::as_object)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &self.token)
			.field("expires_at", &self.expires_at)
			.field("refresh_token", &self.refresh_token)
			.field("params", &self.params.keys().collect::<Vec<_>>())
			.finish()
	}
}

fn integer(value: &Value) -> Option<i64> {
	match value {
		Value::Number(number) => number.as_i64(),
		Value::String(text) => text.trim().parse().ok(),
		_ => None,
	}
}
