//! Transport primitives for gateway requests.
//!
//! [`GatewayHttpClient`] is the gateway's only dependency on an HTTP stack. Implementations
//! receive a fully resolved [`OutboundRequest`] and report either the raw response (any status
//! code) or a [`TransportError`] when no response was received at all. Status classification,
//! message extraction, and refresh handling stay in the gateway so custom transports cannot
//! diverge from them.

// self
use crate::{
	_prelude::*,
	error::TransportError,
	request::{ContentType, HttpMethod},
	session::TokenSecret,
};
#[cfg(feature = "reqwest")]
use crate::{config::GatewayConfig, error::ConfigError, request::form_fields};

/// Boxed future returned by [`GatewayHttpClient::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports used by the gateway.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by every
/// clone of a gateway, and the returned futures must be `Send` so requests can hop executors.
pub trait GatewayHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Performs `request` and returns the raw response, whatever its status.
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_>;
}

/// Fully resolved request handed to a transport.
#[derive(Clone, Debug)]
pub struct OutboundRequest {
	/// HTTP verb.
	pub method: HttpMethod,
	/// Absolute target URL.
	pub url: Url,
	/// Bearer credential for the `Authorization` header.
	pub bearer: Option<TokenSecret>,
	/// Payload encoding.
	pub content_type: ContentType,
	/// Optional payload.
	pub body: Option<Value>,
	/// Query string parameters.
	pub query: Vec<(String, String)>,
	/// Extra headers.
	pub headers: Vec<(String, String)>,
	/// Timeout for this request.
	pub timeout: StdDuration,
}

/// Raw HTTP response captured by a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl RawResponse {
	/// Returns true for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Decodes the body: JSON when possible, otherwise lossy text; empty bodies become `null`.
	pub fn data(&self) -> Value {
		if self.body.iter().all(u8::is_ascii_whitespace) {
			return Value::Null;
		}

		serde_json::from_slice(&self.body)
			.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&self.body).into_owned()))
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client whose default timeout matches `config`.
	pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(config.timeout).build()?;

		Ok(Self(client))
	}

	fn build(&self, request: OutboundRequest) -> reqwest::RequestBuilder {
		let OutboundRequest { method, url, bearer, content_type, body, query, headers, timeout } =
			request;
		let mut builder = self.0.request(reqwest_method(method), url).timeout(timeout);

		if !query.is_empty() {
			builder = builder.query(&query);
		}
		for (name, value) in &headers {
			builder = builder.header(name.as_str(), value.as_str());
		}
		if let Some(secret) = &bearer {
			builder = builder.header(reqwest::header::AUTHORIZATION, secret.bearer());
		}

		match (content_type, body) {
			(_, None) => builder,
			(ContentType::Json, Some(body)) => builder.json(&body),
			(ContentType::FormUrlEncoded, Some(body)) => builder.form(&form_fields(Some(&body))),
			(ContentType::Multipart, Some(body)) => {
				let form = form_fields(Some(&body))
					.into_iter()
					.fold(reqwest::multipart::Form::new(), |form, (key, value)| {
						form.text(key, value)
					});

				builder.multipart(form)
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl GatewayHttpClient for ReqwestHttpClient {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		let builder = self.build(request);

		Box::pin(async move {
			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(RawResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: HttpMethod) -> reqwest::Method {
	match method {
		HttpMethod::Get => reqwest::Method::GET,
		HttpMethod::Post => reqwest::Method::POST,
		HttpMethod::Put => reqwest::Method::PUT,
		HttpMethod::Patch => reqwest::Method::PATCH,
		HttpMethod::Delete => reqwest::Method::DELETE,
	}
}
