//! Gateway-level error types shared across configuration, transport, session, and refresh code.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Session store failure.
	#[error("{0}")]
	Session(
		#[from]
		#[source]
		crate::session::SessionError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Coordinated token refresh failed.
	#[error(transparent)]
	Refresh(#[from] RefreshError),

	/// Backend answered with an error result.
	#[error("Request failed: {message}.")]
	Api {
		/// Message extracted from the error result.
		message: String,
		/// Whether a process-wide listener already notified the user.
		handled: bool,
	},
	/// Backend answered with a body that does not match the expected shape.
	#[error("Response body is malformed.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Configuration and validation failures raised while assembling a gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL or endpoint path cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending input.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},

	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Scheme that failed validation.
		scheme: String,
	},
	/// API system segment is blank.
	#[error("API system segment must not be empty.")]
	EmptyApiSystem,
	/// Request timeout is zero.
	#[error("Request timeout must be positive.")]
	ZeroTimeout,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures where no HTTP response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Terminal refresh failures.
///
/// The type is `Clone` because one failure is fanned out to every queued request.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RefreshError {
	/// The session holds no refresh token.
	#[error("No refresh token is stored for the current session.")]
	MissingRefreshToken,
	/// Refresh endpoint answered without issuing a new access token.
	#[error("Refresh endpoint rejected the session with HTTP {status}: {message}.")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
		/// Message extracted from the response body.
		message: String,
	},
	/// Refresh endpoint answered 200 with a body that lacks the new tokens.
	#[error("Refresh response is malformed at `{path}`: {message}.")]
	MalformedResponse {
		/// JSON path of the failing field.
		path: String,
		/// Parser message.
		message: String,
	},
	/// Refresh endpoint could not be resolved against the base URL.
	#[error("Refresh endpoint is invalid: {message}")]
	InvalidEndpoint {
		/// Resolution failure.
		message: String,
	},
	/// Refresh endpoint was unreachable.
	#[error("Network error occurred while calling the refresh endpoint: {message}.")]
	Network {
		/// Transport message.
		message: String,
	},
	/// Rotated tokens could not be stored.
	#[error("Session store failed while rotating tokens: {0}")]
	Session(#[from] crate::session::SessionError),
	/// The request that owned the refresh was dropped before the refresh settled.
	#[error("Token refresh was abandoned before it settled.")]
	Abandoned,
}
impl From<serde_path_to_error::Error<serde_json::Error>> for RefreshError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::MalformedResponse { path: e.path().to_string(), message: e.inner().to_string() }
	}
}
impl From<TransportError> for RefreshError {
	fn from(e: TransportError) -> Self {
		let message = match e.source() {
			Some(source) => format!("{e} ({source})"),
			None => e.to_string(),
		};

		Self::Network { message }
	}
}
