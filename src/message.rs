//! Human-readable message extraction for error response bodies.
//!
//! Backends disagree on where they put the reason for a failure. [`EXTRACTORS`] lists the known
//! fields in precedence order; the first one present (and not `null`) wins.

// self
use crate::_prelude::*;

/// Fallback when an error body carries none of the known fields.
pub const DEFAULT_ERROR_MESSAGE: &str = "API Error";

/// Known error fields of a backend error body.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
	/// Detailed description (`ErrorDescription`).
	#[serde(rename = "ErrorDescription", default)]
	pub error_description: Option<Value>,
	/// Generic response text (`Response`).
	#[serde(rename = "Response", default)]
	pub response: Option<Value>,
	/// Generic error field (`error`).
	#[serde(default)]
	pub error: Option<Value>,
}

/// Typed accessor for one [`ErrorBody`] field.
#[derive(Clone, Copy)]
pub struct MessageExtractor {
	/// Wire name of the field.
	pub field: &'static str,
	read: fn(&ErrorBody) -> Option<&Value>,
}
impl MessageExtractor {
	/// Returns the rendered field value, if present.
	pub fn extract(&self, body: &ErrorBody) -> Option<String> {
		(self.read)(body).map(render)
	}
}
impl Debug for MessageExtractor {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("MessageExtractor").field(&self.field).finish()
	}
}

/// Extractors in precedence order.
pub const EXTRACTORS: [MessageExtractor; 3] = [
	MessageExtractor { field: "ErrorDescription", read: read_error_description },
	MessageExtractor { field: "Response", read: read_response },
	MessageExtractor { field: "error", read: read_error },
];

/// Extracts the message for a non-2xx response.
///
/// An empty body reports the status code; a body that is not a JSON object, or that carries
/// none of the known fields, yields [`DEFAULT_ERROR_MESSAGE`].
pub fn extract_message(status: u16, body: &[u8]) -> String {
	if body.iter().all(u8::is_ascii_whitespace) {
		return format!("Request failed with status code {status}");
	}

	let Ok(value @ Value::Object(_)) = serde_json::from_slice::<Value>(body) else {
		return DEFAULT_ERROR_MESSAGE.into();
	};
	let Ok(parsed) = serde_json::from_value::<ErrorBody>(value) else {
		return DEFAULT_ERROR_MESSAGE.into();
	};

	EXTRACTORS
		.iter()
		.find_map(|extractor| extractor.extract(&parsed))
		.unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.into())
}

fn read_error_description(body: &ErrorBody) -> Option<&Value> {
	body.error_description.as_ref()
}

fn read_response(body: &ErrorBody) -> Option<&Value> {
	body.response.as_ref()
}

fn read_error(body: &ErrorBody) -> Option<&Value> {
	body.error.as_ref()
}

/// Renders a message field, keeping strings unquoted.
pub fn render(value: &Value) -> String {
	match value {
		Value::String(text) => text.clone(),
		other => other.to_string(),
	}
}
