//! Optional observability helpers for gateway requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run every request inside a span named `request_gateway.request` with the
//!   `method`, `path`, and `stage` fields, and to log request outcomes and session expiry.
//! - Enable `metrics` to increment `request_gateway_outcome_total` (labeled by `outcome`) for
//!   every settled request and `request_gateway_refresh_total` (labeled by `step`) for every
//!   refresh transition.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Classification of a settled request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// 2xx response.
	Success,
	/// 401 that entered the refresh protocol.
	AuthExpired,
	/// No response was received.
	NetworkError,
	/// Any other non-2xx response.
	ApplicationError,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Success => "success",
			RequestOutcome::AuthExpired => "auth_expired",
			RequestOutcome::NetworkError => "network_error",
			RequestOutcome::ApplicationError => "application_error",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Refresh protocol transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefreshStep {
	/// A request claimed the refresh.
	Attempt,
	/// A request queued behind an in-flight refresh.
	Queued,
	/// The refresh issued a new access token.
	Success,
	/// The refresh failed and the session expired.
	Failure,
}
impl RefreshStep {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshStep::Attempt => "attempt",
			RefreshStep::Queued => "queued",
			RefreshStep::Success => "success",
			RefreshStep::Failure => "failure",
		}
	}
}
impl Display for RefreshStep {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
