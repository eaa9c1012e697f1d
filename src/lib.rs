//! Bearer-authenticated request gateway with single-flight token refresh, queued request replay,
//! and a uniform result shape for every backend call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod event;
pub mod gateway;
pub mod http;
pub mod message;
pub mod obs;
pub mod refresh;
pub mod request;
pub mod result;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.
	//!
	//! Compiled for unit tests and for integration tests built with the `test` feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{ApiTarget, GatewayConfig},
		event::{EventBus, EventSink, GatewayEvent},
		gateway::Gateway,
		http::ReqwestHttpClient,
		session::{MemorySessionStore, SessionStore},
	};

	/// Gateway type alias used by reqwest-backed integration tests.
	pub type ReqwestTestGateway = Gateway<ReqwestHttpClient>;

	/// Listener that records every event published on an [`EventBus`].
	#[derive(Clone, Debug, Default)]
	pub struct RecordedEvents(Arc<Mutex<Vec<GatewayEvent>>>);
	impl RecordedEvents {
		/// Returns a snapshot of the recorded events in dispatch order.
		pub fn snapshot(&self) -> Vec<GatewayEvent> {
			self.0.lock().clone()
		}

		/// Counts how many times `event` was dispatched.
		pub fn count(&self, event: GatewayEvent) -> usize {
			self.0.lock().iter().filter(|recorded| **recorded == event).count()
		}
	}

	/// Builds a reqwest HTTP client suitable for talking to `httpmock` servers.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.timeout(StdDuration::from_secs(10))
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a gateway configuration that targets `base_url` directly.
	pub fn test_config(base_url: &str) -> GatewayConfig {
		let url = Url::parse(base_url).expect("Failed to parse test base URL.");

		GatewayConfig::builder(ApiTarget::Api { url })
			.build()
			.expect("Failed to build test gateway configuration.")
	}

	/// Constructs a [`Gateway`] backed by an in-memory session, a recording event bus, and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_gateway(
		base_url: &str,
	) -> (ReqwestTestGateway, Arc<MemorySessionStore>, RecordedEvents) {
		build_reqwest_test_gateway_with_config(test_config(base_url))
	}

	/// Same as [`build_reqwest_test_gateway`] with a caller-supplied configuration.
	pub fn build_reqwest_test_gateway_with_config(
		config: GatewayConfig,
	) -> (ReqwestTestGateway, Arc<MemorySessionStore>, RecordedEvents) {
		let session_backend = Arc::new(MemorySessionStore::default());
		let session: Arc<dyn SessionStore> = session_backend.clone();
		let recorded = RecordedEvents::default();
		let bus = EventBus::default();
		let sink = recorded.clone();

		bus.subscribe(move |event| sink.0.lock().push(event));

		let events: Arc<dyn EventSink> = Arc::new(bus);
		let gateway =
			Gateway::with_http_client(config, session, events, test_reqwest_http_client());

		(gateway, session_backend, recorded)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, VecDeque},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
