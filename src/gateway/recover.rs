//! Expired-token recovery: the refresh call, queue release, and the single replay.

// self
use crate::{
	_prelude::*,
	error::RefreshError,
	event::GatewayEvent,
	gateway::Gateway,
	http::{GatewayHttpClient, OutboundRequest},
	message,
	obs,
	refresh::{Admission, RefreshTicket},
	request::{ContentType, GatewayRequest, HttpMethod},
	result::ApiResult,
	session::{CredentialPair, TokenSecret},
};

/// `{"Data": {...}}` envelope returned by the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshEnvelope {
	#[serde(rename = "Data")]
	data: RefreshGrant,
}

#[derive(Debug, Deserialize)]
struct RefreshGrant {
	access_token: TokenSecret,
	#[serde(default)]
	refresh_token: Option<TokenSecret>,
	#[serde(default)]
	expires_in: Option<i64>,
}

impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Runs the refresh protocol for a request that received an expired-token 401.
	pub(super) async fn recover(&self, mut request: GatewayRequest) -> ApiResult {
		request.mark_retried();

		let ticket = match self.refresh.admit() {
			Admission::Follower(waiter) =>
				return match waiter.wait().await {
					Ok(access) => self.replay(request, access).await,
					// The leader already announced the expiry.
					Err(err) => ApiResult::handled(err.to_string()),
				},
			Admission::Leader(ticket) => ticket,
		};
		let refresh_token = match self.session.refresh_token() {
			Ok(Some(token)) => token,
			Ok(None) => return self.expire_session(ticket, RefreshError::MissingRefreshToken),
			Err(err) => {
				obs::log_session_failure("refresh_token", &err);

				return self.expire_session(ticket, RefreshError::MissingRefreshToken);
			},
		};

		match self.rotate(refresh_token).await {
			Ok(access) => {
				ticket.settle(Ok(access.clone()));

				self.replay(request, access).await
			},
			Err(err) => self.expire_session(ticket, err),
		}
	}

	/// Calls the refresh endpoint and stores the rotated pair; returns the new access token.
	async fn rotate(&self, refresh_token: TokenSecret) -> Result<TokenSecret, RefreshError> {
		let grant = self.call_refresh(&refresh_token).await?;
		// An omitted or blank refresh token keeps the current one.
		let next_refresh = grant
			.refresh_token
			.filter(|token| !token.is_empty())
			.unwrap_or(refresh_token);
		let mut pair = CredentialPair::new(grant.access_token.clone(), Some(next_refresh));

		if let Some(seconds) = grant.expires_in.filter(|seconds| *seconds > 0) {
			pair = pair.with_expires_in(Duration::seconds(seconds));
		}

		self.session.set_credentials(pair)?;

		Ok(grant.access_token)
	}

	async fn call_refresh(
		&self,
		refresh_token: &TokenSecret,
	) -> Result<RefreshGrant, RefreshError> {
		let url = self
			.config
			.endpoint(&self.config.refresh_path)
			.map_err(|err| RefreshError::InvalidEndpoint { message: err.to_string() })?;
		let outbound = OutboundRequest {
			method: HttpMethod::Post,
			url,
			bearer: Some(refresh_token.clone()),
			content_type: ContentType::Json,
			body: Some(Value::Object(Default::default())),
			query: Vec::new(),
			headers: Vec::new(),
			timeout: self.config.timeout,
		};
		let response = self.http_client.execute(outbound).await?;

		if response.status != 200 {
			return Err(RefreshError::Rejected {
				status: response.status,
				message: message::extract_message(response.status, &response.body),
			});
		}

		let deserializer = &mut serde_json::Deserializer::from_slice(&response.body);
		let envelope: RefreshEnvelope = serde_path_to_error::deserialize(deserializer)?;

		if envelope.data.access_token.is_empty() {
			return Err(RefreshError::MalformedResponse {
				path: "Data.access_token".into(),
				message: "access token is empty".into(),
			});
		}

		Ok(envelope.data)
	}

	/// Replays a request once with a freshly issued access token.
	async fn replay(&self, request: GatewayRequest, access: TokenSecret) -> ApiResult {
		self.refresh.metrics().record_replay();

		let classified = self.dispatch(&request, Some(access)).await;

		self.conclude(classified)
	}

	/// Tears the session down after an unrecoverable refresh failure.
	///
	/// Clears the session before rejecting the queued requests.
	fn expire_session(&self, ticket: RefreshTicket<'_>, err: RefreshError) -> ApiResult {
		obs::log_session_expired(&err);

		if let Err(clear_err) = self.session.clear() {
			obs::log_session_failure("clear", &clear_err);
		}

		ticket.settle(Err(err.clone()));
		self.events.emit(GatewayEvent::SessionExpired);

		ApiResult::handled(err.to_string())
	}
}
