//! Optional observability helpers for the sign-in callback.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `slack_identity.flow` with the `flow`
//!   (callback path) and `stage` (call site) fields, plus `warn` events for degraded Slack
//!   responses.
//! - Enable `metrics` to increment the `slack_identity_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and
//!   `slack_identity_degraded_total` (labeled by `method`) for every degraded Slack response.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Callback paths observed by the strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// `oauth.v2.access` code exchange.
	TokenExchange,
	/// Workspace install resolved through `auth.test` and `users.info`.
	Standard,
	/// Sign-in resolved through `users.identity`.
	IdentityScoped,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::TokenExchange => "token_exchange",
			FlowKind::Standard => "standard",
			FlowKind::IdentityScoped => "identity_scoped",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a strategy helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
