//! Spans around callback stages and warnings for degraded Slack answers.

// self
use crate::{_prelude::*, obs::FlowKind, provider::SlackMethod};

/// Future returned by [`FlowSpan::instrument`]; the bare future when `tracing` is off.
#[cfg(feature = "tracing")]
pub type InstrumentedStage<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; the bare future when `tracing` is off.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedStage<F> = F;

/// `slack_identity.flow` span for one stage of a sign-in (`exchange_code`, `raw_info`, ...).
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens the span for `stage` of the `kind` path.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("slack_identity.flow", flow = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span until the returned guard drops; for stages that never await.
	pub fn entered(self) -> StageGuard {
		#[cfg(feature = "tracing")]
		{
			StageGuard { _entered: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			StageGuard {}
		}
	}

	/// Attaches the span to an awaited stage.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedStage<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Keeps a synchronous stage's span entered.
pub struct StageGuard {
	#[cfg(feature = "tracing")]
	_entered: tracing::span::EnteredSpan,
}
impl Debug for StageGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("StageGuard(..)")
	}
}

/// Warns that a Slack answer for `method` was replaced by an empty object, and counts it.
pub fn record_degraded_response(method: SlackMethod, reason: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(method = method.as_str(), reason, "Slack response degraded to an empty object.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}

	super::record_degraded_total(method);
}
