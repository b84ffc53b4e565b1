//! Slack Web API method catalog with byte-exact request paths.

// self
use crate::_prelude::*;

/// Slack Web API methods called by this crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlackMethod {
	/// `oauth.v2.access`, the authorization-code exchange.
	OAuthV2Access,
	/// `auth.test`, the standard-flow profile fetch.
	AuthTest,
	/// `users.identity`, the identity-scoped profile fetch.
	UsersIdentity,
	/// `users.info`, the enrichment fetch.
	UsersInfo,
}
impl SlackMethod {
	/// Returns the Slack method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			SlackMethod::OAuthV2Access => "oauth.v2.access",
			SlackMethod::AuthTest => "auth.test",
			SlackMethod::UsersIdentity => "users.identity",
			SlackMethod::UsersInfo => "users.info",
		}
	}

	/// Returns the request path relative to the Slack site.
	pub const fn path(self) -> &'static str {
		match self {
			SlackMethod::OAuthV2Access => "/api/oauth.v2.access",
			SlackMethod::AuthTest => "/api/auth.test",
			SlackMethod::UsersIdentity => "/api/users.identity",
			SlackMethod::UsersInfo => "/api/users.info",
		}
	}
}
impl Display for SlackMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn paths_match_slack_web_api() {
		assert_eq!(SlackMethod::OAuthV2Access.path(), "/api/oauth.v2.access");
		assert_eq!(SlackMethod::AuthTest.path(), "/api/auth.test");
		assert_eq!(SlackMethod::UsersIdentity.path(), "/api/users.identity");
		assert_eq!(SlackMethod::UsersInfo.path(), "/api/users.info");
		assert_eq!(SlackMethod::UsersInfo.to_string(), "users.info");
	}
}
