// self
use crate::{
	_prelude::*,
	error::RefreshError,
	obs::RequestOutcome,
	request::HttpMethod,
	session::SessionError,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span wrapping one logical request, including its refresh and replay.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the request line and call site.
	pub fn new(stage: &'static str, method: HttpMethod, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"request_gateway.request",
				method = method.as_str(),
				path,
				stage
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, method, path);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn log_outcome(outcome: RequestOutcome, status: Option<u16>) {
	#[cfg(feature = "tracing")]
	{
		if matches!(outcome, RequestOutcome::NetworkError) {
			tracing::warn!(outcome = outcome.as_str(), "backend unreachable");
		} else {
			tracing::debug!(outcome = outcome.as_str(), status, "request settled");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, status);
	}
}

pub(crate) fn log_session_expired(err: &RefreshError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %err, "session expired");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = err;
	}
}

pub(crate) fn log_session_failure(operation: &'static str, err: &SessionError) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(operation, error = %err, "session store failure");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, err);
	}
}
