//! The request gateway: bearer attachment, outcome classification, and 401 recovery.

pub mod auth;
pub mod business;

mod recover;

pub use auth::*;
pub use business::*;

// self
use crate::{
	_prelude::*,
	config::GatewayConfig,
	error::TransportError,
	event::{EventSink, GatewayEvent},
	http::{GatewayHttpClient, OutboundRequest, RawResponse},
	message,
	obs::{self, RequestOutcome, RequestSpan},
	refresh::{RefreshCoordinator, RefreshPhase},
	request::{GatewayRequest, HttpMethod, RequestOptions},
	result::ApiResult,
	session::{SessionStore, TokenSecret},
};
#[cfg(feature = "reqwest")]
use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestHttpClient>;

/// Issues backend calls with the session's bearer credential and recovers from expired access
/// tokens through a shared [`RefreshCoordinator`].
///
/// Clones share the transport, session, event sink, and coordinator, so the single-flight
/// guarantee holds across every clone. Build one gateway per process (or per session) and hand
/// clones to the services that need it.
pub struct Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// HTTP client used for every outbound request, including the refresh call.
	pub http_client: Arc<C>,
	/// Credential store consulted before every dispatch.
	pub session: Arc<dyn SessionStore>,
	/// Receiver of `network-error` and `session-expired` notifications.
	pub events: Arc<dyn EventSink>,
	/// Validated configuration.
	pub config: Arc<GatewayConfig>,
	/// Refresh state machine shared by every clone.
	pub refresh: Arc<RefreshCoordinator>,
}
impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_http_client(
		config: GatewayConfig,
		session: Arc<dyn SessionStore>,
		events: Arc<dyn EventSink>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			session,
			events,
			config: Arc::new(config),
			refresh: Default::default(),
		}
	}

	/// Replaces the refresh coordinator, e.g. to share one across several gateways.
	pub fn with_refresh_coordinator(mut self, coordinator: Arc<RefreshCoordinator>) -> Self {
		self.refresh = coordinator;

		self
	}

	/// Current phase of the refresh protocol.
	pub fn refresh_phase(&self) -> RefreshPhase {
		self.refresh.phase()
	}

	/// Sends a request and classifies its outcome.
	///
	/// A 401 on a non-authentication path runs the refresh protocol before this resolves; every
	/// request is replayed at most once.
	pub async fn send(
		&self,
		method: HttpMethod,
		path: impl Into<String>,
		body: Option<Value>,
		options: RequestOptions,
	) -> ApiResult {
		self.execute(GatewayRequest::new(method, path, body, options)).await
	}

	/// Sends a prepared request.
	pub async fn execute(&self, request: GatewayRequest) -> ApiResult {
		let span = RequestSpan::new("execute", request.method, &request.path);

		span.instrument(async move {
			let bearer = self.current_access_token();

			match self.dispatch(&request, bearer).await {
				Classified::AuthExpired { .. } => {
					obs::record_request_outcome(RequestOutcome::AuthExpired);

					self.recover(request).await
				},
				other => self.conclude(other),
			}
		})
		.await
	}

	/// `GET path`
	pub async fn get(&self, path: impl Into<String>, options: RequestOptions) -> ApiResult {
		self.send(HttpMethod::Get, path, None, options).await
	}

	/// `POST path`
	pub async fn post(
		&self,
		path: impl Into<String>,
		body: Option<Value>,
		options: RequestOptions,
	) -> ApiResult {
		self.send(HttpMethod::Post, path, body, options).await
	}

	/// `PUT path`
	pub async fn put(
		&self,
		path: impl Into<String>,
		body: Option<Value>,
		options: RequestOptions,
	) -> ApiResult {
		self.send(HttpMethod::Put, path, body, options).await
	}

	/// `PATCH path`
	pub async fn patch(
		&self,
		path: impl Into<String>,
		body: Option<Value>,
		options: RequestOptions,
	) -> ApiResult {
		self.send(HttpMethod::Patch, path, body, options).await
	}

	/// `DELETE path`
	pub async fn delete(&self, path: impl Into<String>, options: RequestOptions) -> ApiResult {
		self.send(HttpMethod::Delete, path, None, options).await
	}

	fn current_access_token(&self) -> Option<TokenSecret> {
		self.session.access_token().unwrap_or_else(|err| {
			obs::log_session_failure("access_token", &err);

			None
		})
	}

	async fn dispatch(&self, request: &GatewayRequest, bearer: Option<TokenSecret>) -> Classified {
		let url = match self.config.endpoint(&request.path) {
			Ok(url) => url,
			Err(err) =>
				return Classified::ApplicationError { status: None, message: err.to_string() },
		};
		let outbound = OutboundRequest {
			method: request.method,
			url,
			bearer,
			content_type: request.options.content_type,
			body: request.body.clone(),
			query: request.options.query.clone(),
			headers: request.options.headers.clone(),
			timeout: request.options.timeout.unwrap_or(self.config.timeout),
		};

		match self.http_client.execute(outbound).await {
			Ok(response) => self.classify(request, response),
			Err(err) => Classified::NetworkError(err),
		}
	}

	fn classify(&self, request: &GatewayRequest, response: RawResponse) -> Classified {
		if response.is_success() {
			return Classified::Success { status: response.status, data: response.data() };
		}

		let message =
			self.config.translate(message::extract_message(response.status, &response.body));

		if response.status == 401 && !request.retried && !self.config.is_exempt(&request.path) {
			Classified::AuthExpired { message }
		} else {
			Classified::ApplicationError { status: Some(response.status), message }
		}
	}

	fn conclude(&self, classified: Classified) -> ApiResult {
		let outcome = classified.outcome();

		obs::record_request_outcome(outcome);

		match classified {
			Classified::Success { status, data } => {
				obs::log_outcome(outcome, Some(status));

				ApiResult::success(data)
			},
			Classified::NetworkError(err) => {
				obs::log_outcome(outcome, None);
				self.events.emit(GatewayEvent::NetworkError);

				ApiResult::handled(err.to_string())
			},
			// `execute` routes this variant into recovery and replays are marked retried.
			Classified::AuthExpired { message } => {
				obs::log_outcome(outcome, Some(401));

				ApiResult::unhandled(message)
			},
			Classified::ApplicationError { status, message } => {
				obs::log_outcome(outcome, status);

				ApiResult::unhandled(message)
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestHttpClient> {
	/// Creates a gateway with its own reqwest transport configured from `config`.
	pub fn new(
		config: GatewayConfig,
		session: Arc<dyn SessionStore>,
		events: Arc<dyn EventSink>,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_config(&config)?;

		Ok(Self::with_http_client(config, session, events, http_client))
	}
}
impl<C> Clone for Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			session: self.session.clone(),
			events: self.events.clone(),
			config: self.config.clone(),
			refresh: self.refresh.clone(),
		}
	}
}
impl<C> Debug for Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_phase", &self.refresh.phase())
			.finish()
	}
}

/// Classification of a single dispatch.
#[derive(Debug)]
enum Classified {
	Success { status: u16, data: Value },
	AuthExpired { message: String },
	NetworkError(TransportError),
	ApplicationError { status: Option<u16>, message: String },
}
impl Classified {
	fn outcome(&self) -> RequestOutcome {
		match self {
			Classified::Success { .. } => RequestOutcome::Success,
			Classified::AuthExpired { .. } => RequestOutcome::AuthExpired,
			Classified::NetworkError(_) => RequestOutcome::NetworkError,
			Classified::ApplicationError { .. } => RequestOutcome::ApplicationError,
		}
	}
}
