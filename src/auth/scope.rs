//! Comma-delimited Slack scope lists and the identity-scope classifier.

// self
use crate::{_prelude::*, options::AuthorizeOption};

/// Scope that switches the callback into the identity-scoped flow.
pub const IDENTITY_BASIC: &str = "identity.basic";
/// Delimiter Slack uses between scopes.
pub const SCOPE_DELIMITER: char = ',';

/// Ordered, deduplicated list of Slack scopes.
///
/// Parsing never fails: entries are split on [`SCOPE_DELIMITER`], trimmed, and empty
/// entries are dropped, so a malformed string simply yields fewer (or odd) tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScopeList(Vec<String>);
impl ScopeList {
	/// Parses a comma-delimited scope string.
	pub fn parse(raw: &str) -> Self {
		let mut scopes = Vec::<String>::new();

		for entry in raw.split(SCOPE_DELIMITER).map(str::trim).filter(|entry| !entry.is_empty()) {
			if !scopes.iter().any(|known| known == entry) {
				scopes.push(entry.to_owned());
			}
		}

		Self(scopes)
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the list contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.iter().any(|candidate| candidate == scope)
	}

	/// Iterator over scopes in request order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}
}
impl Display for ScopeList {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0.join(","))
	}
}
impl FromStr for ScopeList {
	type Err = std::convert::Infallible;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(Self::parse(s))
	}
}

/// Decides whether the callback runs the legacy identity-scoped flow.
///
/// True iff `user_scope` is forwarded as an authorize option and its comma-separated
/// value carries [`IDENTITY_BASIC`]. Missing values count as empty.
pub fn identity_scoped(
	authorize_options: &[AuthorizeOption],
	_scope: Option<&str>,
	user_scope: Option<&str>,
) -> bool {
	authorize_options.contains(&AuthorizeOption::UserScope)
		&& ScopeList::parse(user_scope.unwrap_or_default()).contains(IDENTITY_BASIC)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const ALL: &[AuthorizeOption] = &[AuthorizeOption::Scope, AuthorizeOption::UserScope];

	#[test]
	fn parse_trims_and_deduplicates() {
		let scopes = ScopeList::parse(" team.read, identity.basic ,,team.read,users.read ");

		assert_eq!(scopes.len(), 3);
		assert_eq!(scopes.to_string(), "team.read,identity.basic,users.read");
		assert!(ScopeList::parse(" , ").is_empty());
	}

	#[test]
	fn identity_basic_user_scope_is_identity_scoped() {
		assert!(identity_scoped(ALL, None, Some("identity.basic")));
		assert!(identity_scoped(ALL, None, Some("team.read,identity.basic,users.read")));
		assert!(identity_scoped(ALL, Some("chat:write"), Some(" identity.email , identity.basic ")));
	}

	#[test]
	fn missing_user_scope_option_is_never_identity_scoped() {
		let scope_only = &[AuthorizeOption::Scope, AuthorizeOption::Team];

		assert!(!identity_scoped(scope_only, Some("identity.basic"), Some("identity.basic")));
		assert!(!identity_scoped(&[], None, Some("identity.basic")));
	}

	#[test]
	fn absent_or_partial_tokens_are_not_identity_scoped() {
		assert!(!identity_scoped(ALL, Some("identity.email"), None));
		assert!(!identity_scoped(ALL, None, Some("")));
		assert!(!identity_scoped(ALL, None, Some("identity.basics,identity")));
		assert!(!identity_scoped(ALL, None, Some("identity basic")));
	}
}
