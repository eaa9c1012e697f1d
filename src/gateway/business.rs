//! Legacy module-dispatcher calls and their `statusCode/content/pagination` result shape.
//!
//! Business calls bypass the refresh protocol. The dispatcher answers `Unauthorized access` once
//! the session is gone, which ends the session immediately.

// self
use crate::{
	_prelude::*,
	event::GatewayEvent,
	gateway::Gateway,
	http::{GatewayHttpClient, OutboundRequest},
	message,
	obs::{self, RequestOutcome, RequestSpan},
	request::{ContentType, HttpMethod},
};

/// Dispatcher message that ends the session.
pub const UNAUTHORIZED_ACCESS: &str = "Unauthorized access";
/// Business function exempt from session expiry; logging out must never re-trigger it.
pub const LOGOUT_FUNCTION: &str = "Logout";

/// One call to a named business function.
#[derive(Clone, Debug, PartialEq)]
pub struct BusinessRequest {
	/// Function the dispatcher routes to (`whichFunction`).
	pub which_function: String,
	/// Verb forwarded to the dispatcher as the lowercase `method` field.
	pub method: HttpMethod,
	/// Body field copied into `responseData` instead of `QueryTableData`.
	pub return_data_key: Option<String>,
	/// Remaining parameters, sent as top-level body fields.
	pub params: serde_json::Map<String, Value>,
}
impl BusinessRequest {
	/// Starts a `get` call to `which_function`.
	pub fn new(which_function: impl Into<String>) -> Self {
		Self {
			which_function: which_function.into(),
			method: HttpMethod::Get,
			return_data_key: None,
			params: Default::default(),
		}
	}

	/// Overrides the forwarded verb.
	pub fn with_method(mut self, method: HttpMethod) -> Self {
		self.method = method;

		self
	}

	/// Adds a body parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.params.insert(key.into(), value.into());

		self
	}

	/// Reads `responseData` from `key` instead of `QueryTableData`.
	pub fn with_return_data_key(mut self, key: impl Into<String>) -> Self {
		self.return_data_key = Some(key.into());

		self
	}

	/// Builds the JSON body posted to the dispatcher.
	pub fn body(&self) -> Value {
		let mut body = self.params.clone();

		body.remove("methods");
		body.insert("method".into(), self.method.as_str().to_ascii_lowercase().into());
		body.insert("whichFunction".into(), self.which_function.clone().into());

		Value::Object(body)
	}
}

/// Result shape of a business call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessResult {
	/// HTTP status, or 500 when no response arrived.
	pub status_code: u16,
	/// Response message and payloads.
	pub content: BusinessContent,
	/// Paging counters.
	pub pagination: Pagination,
}
impl BusinessResult {
	/// Message reported when no response arrived.
	pub const INTERNAL_SERVER_ERROR: &'static str = "Internal Server Error";

	/// Returns true for HTTP 200 results.
	pub fn is_success(&self) -> bool {
		self.status_code == 200
	}

	fn internal_error(response_data: Vec<Value>) -> Self {
		Self {
			status_code: 500,
			content: BusinessContent::new(Self::INTERNAL_SERVER_ERROR, Value::Array(response_data)),
			..Default::default()
		}
	}

	fn from_success(request: &BusinessRequest, body: &Value) -> Self {
		let mut result = Self::default();

		if let Some(response) = truthy_field(body, "/Response") {
			result.content.response = message::render(response);
		}

		let response_data = match &request.return_data_key {
			Some(key) => body.get(key.as_str()).filter(|value| is_truthy(value)),
			None => truthy_field(body, "/QueryTableData")
				.or_else(|| truthy_field(body, "/data/QueryTableData")),
		};

		if let Some(data) = response_data {
			result.content.response_data = data.clone();
		}
		// Later fields win.
		for key in ["QueryRedisData", "Sessions", "DataCUDStatus"] {
			if let Some(data) = body.get(key) {
				result.content.response_data2 = data.clone();
			}
		}

		result.pagination.total = match body.get("FilterCounts") {
			Some(counts) => counts
				.as_u64()
				.or_else(|| counts.as_str().and_then(|text| text.trim().parse().ok()))
				.unwrap_or_default(),
			None => match &result.content.response_data {
				Value::Array(rows) => rows.len() as u64,
				_ => 1,
			},
		};

		result
	}

	fn from_failure(status: u16, body: &[u8], data: Value) -> Self {
		let response_data = match data {
			Value::Null => Value::Array(Vec::new()),
			Value::String(text) if text.is_empty() => Value::Array(Vec::new()),
			rows @ Value::Array(_) => rows,
			other => Value::Array(vec![other]),
		};

		Self {
			status_code: status,
			content: BusinessContent::new(message::extract_message(status, body), response_data),
			..Default::default()
		}
	}
}
impl Default for BusinessResult {
	fn default() -> Self {
		Self {
			status_code: 200,
			content: BusinessContent::new("ok", Value::Array(Vec::new())),
			pagination: Pagination::default(),
		}
	}
}

/// Message and payloads of a [`BusinessResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BusinessContent {
	/// `Response` text on success, the extracted error message otherwise.
	pub response: String,
	/// Primary rows.
	#[serde(rename = "responseData")]
	pub response_data: Value,
	/// Secondary payload (`QueryRedisData`, `Sessions`, or `DataCUDStatus`).
	#[serde(rename = "responseData2")]
	pub response_data2: Value,
}
impl BusinessContent {
	fn new(response: impl Into<String>, response_data: Value) -> Self {
		Self { response: response.into(), response_data, response_data2: Value::Array(Vec::new()) }
	}
}

/// Paging counters of a [`BusinessResult`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
	/// Current page.
	pub page: u64,
	/// Page size.
	pub limit: u64,
	/// `FilterCounts`, else the row count, else 1 for non-array payloads.
	pub total: u64,
}

impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Posts a business call to the module dispatcher (or the per-function mock route).
	///
	/// The call never fails: transport errors become a 500 result and emit `network-error`; an
	/// `Unauthorized access` 401 clears the session and emits `session-expired`.
	pub async fn business_call(&self, request: BusinessRequest) -> BusinessResult {
		let span = RequestSpan::new("business_call", request.method, &request.which_function);

		span.instrument(async move {
			let url = match self.config.business_endpoint(&request.which_function) {
				Ok(url) => url,
				Err(err) => {
					obs::record_request_outcome(RequestOutcome::ApplicationError);
					obs::log_outcome(RequestOutcome::ApplicationError, None);

					return BusinessResult::internal_error(vec![Value::String(err.to_string())]);
				},
			};
			let outbound = OutboundRequest {
				method: HttpMethod::Post,
				url,
				bearer: self.current_access_token(),
				content_type: ContentType::Json,
				body: Some(request.body()),
				query: Vec::new(),
				headers: Vec::new(),
				timeout: self.config.business_timeout,
			};
			let response = match self.http_client.execute(outbound).await {
				Ok(response) => response,
				Err(_) => {
					obs::record_request_outcome(RequestOutcome::NetworkError);
					obs::log_outcome(RequestOutcome::NetworkError, None);
					self.events.emit(GatewayEvent::NetworkError);

					return BusinessResult::internal_error(Vec::new());
				},
			};

			if response.status == 200 {
				obs::record_request_outcome(RequestOutcome::Success);
				obs::log_outcome(RequestOutcome::Success, Some(response.status));

				return BusinessResult::from_success(&request, &response.data());
			}

			obs::record_request_outcome(RequestOutcome::ApplicationError);
			obs::log_outcome(RequestOutcome::ApplicationError, Some(response.status));

			let result =
				BusinessResult::from_failure(response.status, &response.body, response.data());

			if result.status_code == 401
				&& result.content.response == UNAUTHORIZED_ACCESS
				&& request.which_function != LOGOUT_FUNCTION
			{
				self.end_business_session();
			}

			result
		})
		.await
	}

	fn end_business_session(&self) {
		if let Err(err) = self.session.clear() {
			obs::log_session_failure("clear", &err);
		}

		self.events.emit(GatewayEvent::SessionExpired);
	}
}

fn truthy_field<'a>(body: &'a Value, pointer: &str) -> Option<&'a Value> {
	body.pointer(pointer).filter(|value| is_truthy(value))
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(flag) => *flag,
		Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
		Value::String(text) => !text.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
