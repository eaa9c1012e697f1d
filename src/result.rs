//! Uniform result shape returned by every gateway call.

// self
use crate::_prelude::*;

/// Outcome status of an [`ApiResult`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
	/// The backend answered 2xx.
	Success,
	/// The call failed for any reason.
	Error,
}

/// Result contract consumed by every backend service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
	/// Outcome status.
	pub status: ApiStatus,
	/// Response body on success.
	pub data: Option<Value>,
	/// Human-readable message.
	pub message: Option<String>,
	/// True when a process-wide listener already notified the user about this failure.
	#[serde(default)]
	pub handled: bool,
}
impl ApiResult {
	/// Message used when a successful body carries no `Response` text.
	pub const DEFAULT_SUCCESS_MESSAGE: &'static str = "Success";
	/// Fallback message of [`ApiResult::with_fallback_message`] for successes.
	pub const FALLBACK_SUCCESS_MESSAGE: &'static str = "ok";
	/// Fallback message of [`ApiResult::with_fallback_message`] for errors.
	pub const FALLBACK_ERROR_MESSAGE: &'static str = "error";

	/// Builds a success result, taking the message from the body's `Response` field.
	pub fn success(data: Value) -> Self {
		let message = data
			.get("Response")
			.and_then(Value::as_str)
			.filter(|text| !text.is_empty())
			.unwrap_or(Self::DEFAULT_SUCCESS_MESSAGE)
			.to_owned();

		Self {
			status: ApiStatus::Success,
			data: Some(data),
			message: Some(message),
			handled: false,
		}
	}

	/// Builds an error result that callers must surface themselves.
	pub fn unhandled(message: impl Into<String>) -> Self {
		Self { status: ApiStatus::Error, data: None, message: Some(message.into()), handled: false }
	}

	/// Builds an error result that was already announced through the event bus.
	pub fn handled(message: impl Into<String>) -> Self {
		Self { status: ApiStatus::Error, data: None, message: Some(message.into()), handled: true }
	}

	/// Returns true for successful results.
	pub fn is_success(&self) -> bool {
		self.status == ApiStatus::Success
	}

	/// Unwraps the backend's `Data` envelope, falling back to the whole body when absent.
	pub fn into_data_payload(mut self) -> Self {
		self.data = match self.data.take() {
			Some(Value::Object(mut body)) => match body.remove("Data") {
				Some(Value::Null) | None => Some(Value::Object(body)),
				Some(inner) => Some(inner),
			},
			other => other,
		};

		self
	}

	/// Passes the result through unchanged, filling a missing or empty message with `ok` or
	/// `error`.
	pub fn with_fallback_message(mut self) -> Self {
		if self.message.as_deref().is_none_or(str::is_empty) {
			let fallback = match self.status {
				ApiStatus::Success => Self::FALLBACK_SUCCESS_MESSAGE,
				ApiStatus::Error => Self::FALLBACK_ERROR_MESSAGE,
			};

			self.message = Some(fallback.into());
		}

		self
	}

	/// Converts an error result into [`Error::Api`], keeping successes.
	pub fn into_result(self) -> Result<Self> {
		let result = self.with_fallback_message();

		match result.status {
			ApiStatus::Success => Ok(result),
			ApiStatus::Error => Err(Error::Api {
				message: result.message.unwrap_or_default(),
				handled: result.handled,
			}),
		}
	}
}
