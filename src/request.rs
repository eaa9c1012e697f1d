//! Request descriptions handed to the gateway.

// self
use crate::_prelude::*;

/// HTTP verbs the backend exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl HttpMethod {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Patch => "PATCH",
			HttpMethod::Delete => "DELETE",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Body encoding applied to a request payload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
	/// `application/json`
	#[default]
	Json,
	/// `application/x-www-form-urlencoded`; each top-level field becomes a pair.
	FormUrlEncoded,
	/// `multipart/form-data`; each top-level field becomes a text part.
	Multipart,
}

/// Per-request options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
	/// Payload encoding.
	pub content_type: ContentType,
	/// Query string parameters, appended in insertion order.
	pub query: Vec<(String, String)>,
	/// Extra headers; never used for `Authorization`.
	pub headers: Vec<(String, String)>,
	/// Timeout override for this request only.
	pub timeout: Option<StdDuration>,
}
impl RequestOptions {
	/// Selects the payload encoding.
	pub fn with_content_type(mut self, content_type: ContentType) -> Self {
		self.content_type = content_type;

		self
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Display) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Appends a JSON-encoded `filter` query parameter unless `filter` is empty.
	pub fn with_filter(mut self, filter: &serde_json::Map<String, Value>) -> Self {
		if !filter.is_empty() {
			self.query.push(("filter".into(), Value::Object(filter.clone()).to_string()));
		}

		self
	}

	/// Appends an extra header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Overrides the timeout for this request.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

/// A logical request tracked across refresh and replay.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayRequest {
	/// HTTP verb.
	pub method: HttpMethod,
	/// Path relative to the configured base URL.
	pub path: String,
	/// Optional payload.
	pub body: Option<Value>,
	/// Encoding and transport options.
	pub options: RequestOptions,
	/// Set once the request has been replayed (or claimed a refresh); a retried request never
	/// enters the refresh protocol again.
	pub retried: bool,
}
impl GatewayRequest {
	/// Creates a fresh, not yet retried request.
	pub fn new(
		method: HttpMethod,
		path: impl Into<String>,
		body: Option<Value>,
		options: RequestOptions,
	) -> Self {
		Self { method, path: path.into(), body, options, retried: false }
	}

	/// Marks the request as retried.
	pub fn mark_retried(&mut self) {
		self.retried = true;
	}
}

/// Flattens a JSON object into string pairs for form and multipart encodings.
///
/// Strings are used verbatim, `null` becomes an empty string, and every other value uses its
/// JSON rendering. Non-object payloads yield no fields.
pub fn form_fields(body: Option<&Value>) -> Vec<(String, String)> {
	match body {
		Some(Value::Object(map)) => map
			.iter()
			.map(|(key, value)| {
				let rendered = match value {
					Value::String(text) => text.clone(),
					Value::Null => String::new(),
					other => other.to_string(),
				};

				(key.clone(), rendered)
			})
			.collect(),
		_ => Vec::new(),
	}
}
