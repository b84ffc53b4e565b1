//! Counters for sign-in attempts and degraded Slack answers.

// self
use crate::{
	obs::{FlowKind, FlowOutcome},
	provider::SlackMethod,
};

/// Bumps `slack_identity_flow_total{flow, outcome}`.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"slack_identity_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Bumps `slack_identity_degraded_total{method}`.
pub(crate) fn record_degraded_total(method: SlackMethod) {
	#[cfg(feature = "metrics")]
	metrics::counter!("slack_identity_degraded_total", "method" => method.as_str()).increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = method;
}
