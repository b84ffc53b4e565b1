//! Error classification hooks for the token exchange.
//!
//! Slack reports most failures as HTTP 200 bodies shaped `{"ok": false, "error": "<code>"}`,
//! so classification works on the error code first and the HTTP status last.

// self
use crate::{_prelude::*, provider::SlackMethod};

/// Hook that maps Slack error responses into the crate error taxonomy.
///
/// Implementors are required to be `Send + Sync`, and the hook uses crate-owned data
/// types so downstream crates never depend on reqwest-specific structures.
pub trait ErrorClassifier: Send + Sync {
	/// Maps a failed Slack response into a canonical category.
	fn classify(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by classifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Slack rejected the authorization code.
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes were refused.
	InsufficientScope,
	/// Failure is temporary.
	Transient,
}

/// Context passed to classifiers.
///
/// Only primitive data (status code, Slack error fields, body preview) is kept, so
/// classifiers stay decoupled from any HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Method associated with the failing request.
	pub method: SlackMethod,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Slack `error` code (or OAuth `error` field).
	pub error: Option<String>,
	/// OAuth `error_description` field or Slack `warning`.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided method.
	pub fn new(method: SlackMethod) -> Self {
		Self { method, http_status: None, error: None, error_description: None, body_preview: None }
	}

	/// Adds an HTTP status code (e.g., 400, 429, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the error code returned by Slack.
	pub fn with_error(mut self, error: impl Into<String>) -> Self {
		self.error = Some(error.into());

		self
	}

	/// Adds a human-readable description.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview for responses that are not JSON.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default classifier covering the error codes documented for `oauth.v2.access`.
#[derive(Debug, Default)]
pub struct DefaultErrorClassifier;
impl Display for DefaultErrorClassifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-error-classifier")
	}
}
impl ErrorClassifier for DefaultErrorClassifier {
	fn classify(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if let Some(kind) = ctx.error.as_deref().and_then(match_error_code) {
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= ProviderErrorContext::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

fn match_error_code(value: &str) -> Option<ProviderErrorKind> {
	match value.to_ascii_lowercase().as_str() {
		"invalid_code" | "code_already_used" | "code_expired" | "invalid_grant_type"
		| "invalid_grant" | "access_denied" | "invalid_refresh_token" | "bad_redirect_uri" =>
			Some(ProviderErrorKind::InvalidGrant),
		"invalid_client_id" | "bad_client_secret" | "invalid_client" | "unauthorized_client"
		| "app_missing_action_url" =>
			Some(ProviderErrorKind::InvalidClient),
		"invalid_scope" | "missing_scope" | "insufficient_scope" | "invalid_team_for_non_distributed_app" =>
			Some(ProviderErrorKind::InsufficientScope),
		"ratelimited" | "internal_error" | "service_unavailable" | "fatal_error"
		| "request_timeout" | "temporarily_unavailable" | "server_error" =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_code") || text.contains("code_already_used") =>
			Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("bad_client_secret") || text.contains("invalid_client") =>
			Some(ProviderErrorKind::InvalidClient),
		text if text.contains("invalid_scope") || text.contains("missing_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("ratelimited") || text.contains("retry") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn slack_error_codes_take_precedence() {
		let classifier = DefaultErrorClassifier;
		let ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access)
			.with_http_status(200)
			.with_error("invalid_code");

		assert_eq!(classifier.classify(&ctx), ProviderErrorKind::InvalidGrant);

		let ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access).with_error("bad_client_secret");

		assert_eq!(classifier.classify(&ctx), ProviderErrorKind::InvalidClient);

		let ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access).with_error("ratelimited");

		assert_eq!(classifier.classify(&ctx), ProviderErrorKind::Transient);
	}

	#[test]
	fn falls_back_to_body_then_status() {
		let classifier = DefaultErrorClassifier;
		let body_ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access)
			.with_body_preview("<html>missing_scope</html>");

		assert_eq!(classifier.classify(&body_ctx), ProviderErrorKind::InsufficientScope);

		let status_ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access).with_http_status(401);

		assert_eq!(classifier.classify(&status_ctx), ProviderErrorKind::InvalidClient);

		let unknown = ProviderErrorContext::new(SlackMethod::OAuthV2Access).with_error("something_new");

		assert_eq!(classifier.classify(&unknown), ProviderErrorKind::Transient);
	}

	#[test]
	fn body_preview_is_truncated() {
		let ctx = ProviderErrorContext::new(SlackMethod::OAuthV2Access).with_body_preview("x".repeat(300));
		let preview = ctx.body_preview.expect("Preview should be stored.");

		assert_eq!(preview.chars().count(), ProviderErrorContext::BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
