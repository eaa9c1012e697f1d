//! Single-flight token refresh coordination.
//!
//! [`RefreshCoordinator`] is the state machine behind the gateway's 401 recovery. The first
//! request that observes an expired access token while the coordinator is idle becomes the
//! leader and receives a [`RefreshTicket`]; every request that arrives while the leader's refresh
//! is in flight receives a [`RefreshWaiter`] and suspends. Settling the ticket drains the
//! waiters in arrival order with the same outcome and returns the coordinator to idle.
//!
//! State is checked and transitioned under a short synchronous lock that is never held across an
//! `.await`, so admission is decided before the caller's first suspension point. Dropping a ticket
//! without settling it rejects every waiter with [`RefreshError::Abandoned`], which keeps the
//! coordinator from getting stuck when a leader's future is cancelled.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::mem;
// crates.io
use futures::channel::oneshot;
// self
use crate::{
	_prelude::*,
	error::RefreshError,
	obs::{self, RefreshStep},
	session::TokenSecret,
};

/// Outcome fanned out to every queued request.
pub type RefreshOutcome = Result<TokenSecret, RefreshError>;

/// Observable state of the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshPhase {
	/// No refresh in flight.
	Idle,
	/// A refresh is in flight and nobody is waiting on it.
	Refreshing,
	/// A refresh is in flight with the given number of queued requests.
	Queued(usize),
}

/// Result of [`RefreshCoordinator::admit`].
#[derive(Debug)]
pub enum Admission<'a> {
	/// The caller owns the refresh and must settle the ticket.
	Leader(RefreshTicket<'a>),
	/// A refresh is already in flight; wait for its outcome.
	Follower(RefreshWaiter),
}

/// Process- or session-wide refresh state shared by every clone of a gateway.
#[derive(Debug, Default)]
pub struct RefreshCoordinator {
	state: Mutex<RefreshState>,
	metrics: RefreshMetrics,
}
impl RefreshCoordinator {
	/// Claims the refresh or joins the queue of the one in flight.
	pub fn admit(&self) -> Admission<'_> {
		let mut state = self.state.lock();

		if let RefreshState::Refreshing { waiters } = &mut *state {
			let (sender, receiver) = oneshot::channel();

			waiters.push_back(sender);
			self.metrics.record_queued();
			obs::record_refresh_step(RefreshStep::Queued);

			return Admission::Follower(RefreshWaiter(receiver));
		}

		*state = RefreshState::Refreshing { waiters: VecDeque::new() };
		self.metrics.record_attempt();
		obs::record_refresh_step(RefreshStep::Attempt);

		Admission::Leader(RefreshTicket { coordinator: self, settled: false })
	}

	/// Returns the current phase.
	pub fn phase(&self) -> RefreshPhase {
		match &*self.state.lock() {
			RefreshState::Idle => RefreshPhase::Idle,
			RefreshState::Refreshing { waiters } if waiters.is_empty() => RefreshPhase::Refreshing,
			RefreshState::Refreshing { waiters } => RefreshPhase::Queued(waiters.len()),
		}
	}

	/// Shared counters.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	fn settle(&self, outcome: RefreshOutcome) -> usize {
		let waiters = match mem::take(&mut *self.state.lock()) {
			RefreshState::Idle => VecDeque::new(),
			RefreshState::Refreshing { waiters } => waiters,
		};
		let released = waiters.len();

		match &outcome {
			Ok(_) => {
				self.metrics.record_success();
				obs::record_refresh_step(RefreshStep::Success);
			},
			Err(_) => {
				self.metrics.record_failure();
				obs::record_refresh_step(RefreshStep::Failure);
			},
		}

		for waiter in waiters {
			// A waiter whose request future was dropped is simply skipped.
			let _ = waiter.send(outcome.clone());
		}

		released
	}
}

/// Leadership over the in-flight refresh.
#[derive(Debug)]
#[must_use = "dropping the ticket rejects every queued request"]
pub struct RefreshTicket<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl RefreshTicket<'_> {
	/// Resolves or rejects every queued request and returns the coordinator to idle.
	///
	/// Returns the number of queued requests that were released.
	pub fn settle(mut self, outcome: RefreshOutcome) -> usize {
		self.settled = true;

		self.coordinator.settle(outcome)
	}
}
impl Drop for RefreshTicket<'_> {
	fn drop(&mut self) {
		if !self.settled {
			self.coordinator.settle(Err(RefreshError::Abandoned));
		}
	}
}

/// Continuation of a request queued behind an in-flight refresh.
#[derive(Debug)]
pub struct RefreshWaiter(oneshot::Receiver<RefreshOutcome>);
impl RefreshWaiter {
	/// Suspends until the in-flight refresh settles.
	pub async fn wait(self) -> RefreshOutcome {
		self.0.await.unwrap_or(Err(RefreshError::Abandoned))
	}
}

#[derive(Debug, Default)]
enum RefreshState {
	#[default]
	Idle,
	Refreshing {
		waiters: VecDeque<oneshot::Sender<RefreshOutcome>>,
	},
}
