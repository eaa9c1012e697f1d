// self
use crate::obs::{RefreshStep, RequestOutcome};

/// Records a settled request via the global metrics recorder (when enabled).
pub fn record_request_outcome(outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("request_gateway_outcome_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a refresh transition via the global metrics recorder (when enabled).
pub fn record_refresh_step(step: RefreshStep) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("request_gateway_refresh_total", "step" => step.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = step;
	}
}
