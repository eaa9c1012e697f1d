//! Process-wide gateway notifications.
//!
//! The gateway never shows errors itself. Conditions that are handled centrally (the backend is
//! unreachable, the session could not be recovered) are published as [`GatewayEvent`]s so one
//! notification/logout collaborator can react exactly once per occurrence.

// self
use crate::_prelude::*;

/// Notifications raised by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GatewayEvent {
	/// A request failed before any HTTP response was received.
	NetworkError,
	/// The session could not be refreshed and must be torn down.
	SessionExpired,
}
impl GatewayEvent {
	/// Returns the stable event name.
	pub const fn as_str(self) -> &'static str {
		match self {
			GatewayEvent::NetworkError => "network-error",
			GatewayEvent::SessionExpired => "session-expired",
		}
	}
}
impl Display for GatewayEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Receiver of gateway notifications.
pub trait EventSink: Send + Sync {
	/// Publishes `event` to every interested party.
	fn emit(&self, event: GatewayEvent);
}

/// Sink that discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;
impl EventSink for NoopEventSink {
	fn emit(&self, _event: GatewayEvent) {}
}

/// Handle returned by [`EventBus::subscribe`], used to remove the listener again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(GatewayEvent) + Send + Sync>;

/// Listener registry that dispatches events synchronously in subscription order.
#[derive(Clone, Default)]
pub struct EventBus {
	inner: Arc<Mutex<EventBusState>>,
}
impl EventBus {
	/// Registers `listener` for every subsequent event.
	pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
	where
		F: 'static + Fn(GatewayEvent) + Send + Sync,
	{
		let mut state = self.inner.lock();
		let id = SubscriptionId(state.next_id);

		state.next_id += 1;
		state.listeners.push((id, Arc::new(listener)));

		id
	}

	/// Removes a listener; returns false when the id was unknown.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut state = self.inner.lock();
		let before = state.listeners.len();

		state.listeners.retain(|(candidate, _)| *candidate != id);

		state.listeners.len() != before
	}

	/// Number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.inner.lock().listeners.len()
	}
}
impl EventSink for EventBus {
	fn emit(&self, event: GatewayEvent) {
		// Snapshot first so listeners may subscribe or unsubscribe while being notified.
		let listeners: Vec<Listener> =
			self.inner.lock().listeners.iter().map(|(_, listener)| listener.clone()).collect();

		for listener in listeners {
			listener(event);
		}
	}
}
impl Debug for EventBus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EventBus").field("listeners", &self.listener_count()).finish()
	}
}

#[derive(Default)]
struct EventBusState {
	next_id: u64,
	listeners: Vec<(SubscriptionId, Listener)>,
}
