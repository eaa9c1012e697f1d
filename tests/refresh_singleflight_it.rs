// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use futures::channel::oneshot;
use parking_lot::Mutex;
// self
use request_gateway::{
	config::{ApiTarget, GatewayConfig},
	event::{EventSink, GatewayEvent},
	gateway::Gateway,
	http::{GatewayHttpClient, OutboundRequest, RawResponse, TransportFuture},
	refresh::{RefreshCoordinator, RefreshPhase},
	request::RequestOptions,
	result::ApiStatus,
	session::{CredentialPair, MemorySessionStore, SessionError, SessionStore, TokenSecret},
	url::Url,
};

/// Transport whose refresh endpoint blocks until the test opens the gate.
///
/// Data requests answer 200 for `Bearer newToken` and 401 for anything else.
#[derive(Default)]
struct ScriptedTransport {
	gate: Mutex<Option<oneshot::Receiver<()>>>,
	reject_refresh: bool,
	refresh_calls: AtomicUsize,
	data_calls: Mutex<Vec<Option<String>>>,
}
impl ScriptedTransport {
	fn gated(gate: oneshot::Receiver<()>) -> Self {
		Self { gate: Mutex::new(Some(gate)), ..Default::default() }
	}

	fn rejecting(gate: oneshot::Receiver<()>) -> Self {
		Self { reject_refresh: true, ..Self::gated(gate) }
	}
}
impl GatewayHttpClient for ScriptedTransport {
	fn execute(&self, request: OutboundRequest) -> TransportFuture<'_> {
		let bearer = request.bearer.as_ref().map(|secret| secret.expose().to_owned());

		if request.url.path().ends_with("auth/refresh") {
			self.refresh_calls.fetch_add(1, Ordering::SeqCst);

			let gate = self.gate.lock().take();
			let reject = self.reject_refresh;

			return Box::pin(async move {
				if let Some(gate) = gate {
					let _ = gate.await;
				}
				if reject {
					return Ok(RawResponse {
						status: 401,
						body: br#"{"ErrorDescription":"refresh token revoked"}"#.to_vec(),
					});
				}

				Ok(RawResponse {
					status: 200,
					body: br#"{"Data":{"access_token":"newToken","refresh_token":"refresh-new"}}"#
						.to_vec(),
				})
			});
		}

		self.data_calls.lock().push(bearer.clone());

		Box::pin(async move {
			match bearer.as_deref() {
				Some("newToken") =>
					Ok(RawResponse { status: 200, body: br#"{"Response":"ok"}"#.to_vec() }),
				_ => Ok(RawResponse {
					status: 401,
					body: br#"{"error":"token_expired"}"#.to_vec(),
				}),
			}
		})
	}
}

#[derive(Default)]
struct CountingSink(Mutex<Vec<GatewayEvent>>);
impl EventSink for CountingSink {
	fn emit(&self, event: GatewayEvent) {
		self.0.lock().push(event);
	}
}

/// Memory store that records the refresh phase observed when the session is cleared.
struct PhaseRecordingStore {
	inner: MemorySessionStore,
	coordinator: Arc<RefreshCoordinator>,
	cleared_during: Mutex<Option<RefreshPhase>>,
}
impl SessionStore for PhaseRecordingStore {
	fn credentials(&self) -> Result<Option<CredentialPair>, SessionError> {
		self.inner.credentials()
	}

	fn set_credentials(&self, pair: CredentialPair) -> Result<(), SessionError> {
		self.inner.set_credentials(pair)
	}

	fn clear(&self) -> Result<(), SessionError> {
		*self.cleared_during.lock() = Some(self.coordinator.phase());

		self.inner.clear()
	}
}

fn test_config() -> GatewayConfig {
	let url = Url::parse("http://gateway.test/").expect("Test base URL should parse.");

	GatewayConfig::builder(ApiTarget::Api { url })
		.build()
		.expect("Test configuration should build.")
}

fn build(
	transport: ScriptedTransport,
) -> (Gateway<ScriptedTransport>, Arc<MemorySessionStore>, Arc<CountingSink>) {
	let config = test_config();
	let session = Arc::new(MemorySessionStore::default());
	let sink = Arc::new(CountingSink::default());

	session
		.set_tokens(TokenSecret::new("oldToken"), Some(TokenSecret::new("refresh-old")))
		.expect("Seeding the session should succeed.");

	let gateway = Gateway::with_http_client(config, session.clone(), sink.clone(), transport);

	(gateway, session, sink)
}

async fn wait_for_phase(gateway: &Gateway<ScriptedTransport>, phase: RefreshPhase) {
	while gateway.refresh_phase() != phase {
		tokio::task::yield_now().await;
	}
}

#[tokio::test]
async fn queued_requests_share_one_refresh_and_replay_with_the_new_token() {
	let (release, gate) = oneshot::channel();
	let (gateway, session, sink) = build(ScriptedTransport::gated(gate));
	let requests = async {
		tokio::join!(
			gateway.get("TSC/1.0/a", RequestOptions::default()),
			gateway.get("TSC/1.0/b", RequestOptions::default()),
			gateway.get("TSC/1.0/c", RequestOptions::default()),
		)
	};
	let driver = async {
		wait_for_phase(&gateway, RefreshPhase::Queued(2)).await;

		release.send(()).expect("Refresh call should still be waiting on the gate.");
	};
	let ((a, b, c), ()) = tokio::join!(requests, driver);

	for result in [a, b, c] {
		assert!(result.is_success());
	}

	let transport = &gateway.http_client;
	let calls = transport.data_calls.lock().clone();

	assert_eq!(transport.refresh_calls.load(Ordering::SeqCst), 1);
	assert_eq!(calls.len(), 6);
	assert_eq!(calls.iter().filter(|bearer| bearer.as_deref() == Some("oldToken")).count(), 3);
	assert_eq!(calls.iter().filter(|bearer| bearer.as_deref() == Some("newToken")).count(), 3);

	let stored = session.access_token().expect("Session read should succeed.");

	assert_eq!(stored.as_ref().map(TokenSecret::expose), Some("newToken"));
	assert!(sink.0.lock().is_empty());
	assert_eq!(gateway.refresh_phase(), RefreshPhase::Idle);
	assert_eq!(gateway.refresh.metrics().queued(), 2);
	assert_eq!(gateway.refresh.metrics().replays(), 3);
}

#[tokio::test]
async fn dropping_the_leader_releases_queued_requests() {
	let (_release, gate) = oneshot::channel::<()>();
	let (gateway, session, sink) = build(ScriptedTransport::gated(gate));
	let leader = tokio::time::timeout(
		Duration::from_millis(50),
		gateway.get("TSC/1.0/a", RequestOptions::default()),
	);
	let follower = async {
		wait_for_phase(&gateway, RefreshPhase::Refreshing).await;

		gateway.get("TSC/1.0/b", RequestOptions::default()).await
	};
	let (leader, follower) = tokio::join!(leader, follower);

	assert!(leader.is_err(), "Leader should have been cancelled by the timeout.");
	assert_eq!(follower.status, ApiStatus::Error);
	assert!(follower.handled);
	assert_eq!(gateway.refresh_phase(), RefreshPhase::Idle);
	assert!(sink.0.lock().is_empty());
	assert!(
		session.refresh_token().expect("Session read should succeed.").is_some(),
		"An abandoned refresh must not clear the session."
	);
}

#[tokio::test]
async fn failed_refresh_clears_the_session_before_releasing_the_queue() {
	let (release, gate) = oneshot::channel();
	let coordinator = Arc::new(RefreshCoordinator::default());
	let session = Arc::new(PhaseRecordingStore {
		inner: MemorySessionStore::default(),
		coordinator: coordinator.clone(),
		cleared_during: Mutex::new(None),
	});
	let sink = Arc::new(CountingSink::default());

	session
		.set_tokens(TokenSecret::new("oldToken"), Some(TokenSecret::new("refresh-old")))
		.expect("Seeding the session should succeed.");

	let gateway = Gateway::with_http_client(
		test_config(),
		session.clone(),
		sink.clone(),
		ScriptedTransport::rejecting(gate),
	)
	.with_refresh_coordinator(coordinator);
	let requests = async {
		tokio::join!(
			gateway.get("TSC/1.0/a", RequestOptions::default()),
			gateway.get("TSC/1.0/b", RequestOptions::default()),
		)
	};
	let driver = async {
		wait_for_phase(&gateway, RefreshPhase::Queued(1)).await;

		release.send(()).expect("Refresh call should still be waiting on the gate.");
	};
	let ((a, b), ()) = tokio::join!(requests, driver);

	for result in [a, b] {
		assert_eq!(result.status, ApiStatus::Error);
		assert!(result.handled);
	}

	assert_eq!(*session.cleared_during.lock(), Some(RefreshPhase::Queued(1)));
	assert!(session.credentials().expect("Session read should succeed.").is_none());
	assert_eq!(*sink.0.lock(), vec![GatewayEvent::SessionExpired]);
	assert_eq!(gateway.refresh_phase(), RefreshPhase::Idle);
	assert_eq!(gateway.http_client.refresh_calls.load(Ordering::SeqCst), 1);
}
