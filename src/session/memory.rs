//! Thread-safe in-memory [`SessionStore`] implementation.

// self
use crate::{
	_prelude::*,
	session::{CredentialPair, SessionError, SessionStore},
};

/// Keeps the credential pair in-process; the default store for short-lived clients and tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(Arc<RwLock<Option<CredentialPair>>>);
impl MemorySessionStore {
	/// Creates a store already holding `pair`.
	pub fn with_credentials(pair: CredentialPair) -> Self {
		Self(Arc::new(RwLock::new(Some(pair))))
	}
}
impl SessionStore for MemorySessionStore {
	fn credentials(&self) -> Result<Option<CredentialPair>, SessionError> {
		Ok(self.0.read().clone())
	}

	fn set_credentials(&self, pair: CredentialPair) -> Result<(), SessionError> {
		*self.0.write() = Some(pair);

		Ok(())
	}

	fn clear(&self) -> Result<(), SessionError> {
		self.0.write().take();

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::session::TokenSecret;

	#[test]
	fn set_tokens_replaces_pair_and_clear_drops_it() {
		let store = MemorySessionStore::default();

		assert!(store.access_token().expect("Empty store read should succeed.").is_none());

		store
			.set_tokens(TokenSecret::new("access-1"), Some(TokenSecret::new("refresh-1")))
			.expect("Storing the first pair should succeed.");

		let access = store.access_token().expect("Access token read should succeed.");
		let refresh = store.refresh_token().expect("Refresh token read should succeed.");

		assert_eq!(access.as_ref().map(TokenSecret::expose), Some("access-1"));
		assert_eq!(refresh.as_ref().map(TokenSecret::expose), Some("refresh-1"));

		store.clear().expect("Clearing the store should succeed.");

		assert!(store.credentials().expect("Cleared store read should succeed.").is_none());
	}

	#[test]
	fn clones_share_the_same_session() {
		let store = MemorySessionStore::default();
		let handle = store.clone();

		store
			.set_tokens(TokenSecret::new("shared"), None)
			.expect("Storing the shared pair should succeed.");

		assert_eq!(
			handle.access_token().expect("Clone read should succeed.").as_ref().map(TokenSecret::expose),
			Some("shared")
		);
		assert!(handle.refresh_token().expect("Clone read should succeed.").is_none());
	}
}
