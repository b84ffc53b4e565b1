//! Strategy configuration surface.
//!
//! [`SlackOptions`] deserializes from any serde format with every field defaulted, so hosts
//! can embed it in their own configuration files. Loading those files is left to the host.

// self
use crate::{_prelude::*, auth::ScopeList};

/// Options forwarded as authorize-URL query parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizeOption {
	/// Bot/workspace scopes.
	Scope,
	/// User-token scopes; `identity.basic` here selects the identity-scoped flow.
	UserScope,
	/// Workspace to preselect on the consent screen.
	Team,
}
impl AuthorizeOption {
	/// Returns the query parameter name.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthorizeOption::Scope => "scope",
			AuthorizeOption::UserScope => "user_scope",
			AuthorizeOption::Team => "team",
		}
	}
}
impl Display for AuthorizeOption {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Strategy options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackOptions {
	/// Skips the `users.info` enrichment call and the extended `info`/`extra` members.
	pub skip_info: bool,
	/// Which of `scope`/`user_scope`/`team` are forwarded to the authorize URL.
	pub authorize_options: Vec<AuthorizeOption>,
	/// Comma-separated bot scopes.
	pub scope: Option<String>,
	/// Comma-separated user scopes.
	pub user_scope: Option<String>,
	/// Team id to preselect.
	pub team: Option<String>,
	/// Callback path override.
	pub callback_path: Option<String>,
	/// Prefix used to derive the default callback path.
	pub path_prefix: String,
}
impl SlackOptions {
	/// Provider name used in the default callback path and in the auth hash.
	pub const PROVIDER_NAME: &'static str = "slack";

	/// Enables or disables `skip_info`.
	pub fn with_skip_info(mut self, skip_info: bool) -> Self {
		self.skip_info = skip_info;

		self
	}

	/// Replaces the forwarded authorize options.
	pub fn with_authorize_options<I>(mut self, options: I) -> Self
	where
		I: IntoIterator<Item = AuthorizeOption>,
	{
		self.authorize_options = options.into_iter().collect();

		self
	}

	/// Sets the bot scopes.
	pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the user scopes.
	pub fn with_user_scope(mut self, user_scope: impl Into<String>) -> Self {
		self.user_scope = Some(user_scope.into());

		self
	}

	/// Sets the team to preselect.
	pub fn with_team(mut self, team: impl Into<String>) -> Self {
		self.team = Some(team.into());

		self
	}

	/// Overrides the callback path.
	pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
		self.callback_path = Some(path.into());

		self
	}

	/// Returns the configured value of an authorize option, if any.
	pub fn authorize_value(&self, option: AuthorizeOption) -> Option<&str> {
		match option {
			AuthorizeOption::Scope => self.scope.as_deref(),
			AuthorizeOption::UserScope => self.user_scope.as_deref(),
			AuthorizeOption::Team => self.team.as_deref(),
		}
	}

	/// Authorize-URL parameters: each forwarded option with a non-empty value.
	///
	/// Scope values are normalized into Slack's comma-delimited form.
	pub fn authorize_params(&self) -> Vec<(&'static str, String)> {
		self.authorize_options
			.iter()
			.filter_map(|option| {
				let raw = self.authorize_value(*option)?;
				let value = match option {
					AuthorizeOption::Scope | AuthorizeOption::UserScope =>
						ScopeList::parse(raw).to_string(),
					AuthorizeOption::Team => raw.trim().to_owned(),
				};

				(!value.is_empty()).then_some((option.as_str(), value))
			})
			.collect()
	}

	/// Callback path: the override, or `{path_prefix}/slack/callback`.
	pub fn callback_path(&self) -> String {
		match self.callback_path.as_deref() {
			Some(path) if !path.is_empty() => path.to_owned(),
			_ => format!("{}/{}/callback", self.path_prefix.trim_end_matches('/'), Self::PROVIDER_NAME),
		}
	}
}
impl Default for SlackOptions {
	fn default() -> Self {
		Self {
			skip_info: false,
			authorize_options: vec![
				AuthorizeOption::Scope,
				AuthorizeOption::UserScope,
				AuthorizeOption::Team,
			],
			scope: None,
			user_scope: None,
			team: None,
			callback_path: None,
			path_prefix: "/auth".into(),
		}
	}
}
