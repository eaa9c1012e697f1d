//! Session store contracts and built-in credential stores.
//!
//! A session store owns the process-wide credential pair. The gateway reads the access token
//! before every dispatch and rotates the pair only after a successful login or refresh; an
//! unrecoverable refresh failure clears it.

pub mod file;
pub mod memory;
pub mod secret;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use secret::TokenSecret;

// self
use crate::_prelude::*;

/// Storage backend contract implemented by credential stores.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the stored credential pair, if any.
	fn credentials(&self) -> Result<Option<CredentialPair>, SessionError>;

	/// Persists or replaces the stored credential pair.
	fn set_credentials(&self, pair: CredentialPair) -> Result<(), SessionError>;

	/// Drops the stored credential pair.
	fn clear(&self) -> Result<(), SessionError>;

	/// Returns the current access token.
	fn access_token(&self) -> Result<Option<TokenSecret>, SessionError> {
		Ok(self.credentials()?.map(|pair| pair.access_token))
	}

	/// Returns the current refresh token.
	fn refresh_token(&self) -> Result<Option<TokenSecret>, SessionError> {
		Ok(self.credentials()?.and_then(|pair| pair.refresh_token))
	}

	/// Stores a new access token, optionally alongside a new refresh token.
	fn set_tokens(
		&self,
		access: TokenSecret,
		refresh: Option<TokenSecret>,
	) -> Result<(), SessionError> {
		self.set_credentials(CredentialPair::new(access, refresh))
	}
}

/// Bearer credential pair issued by login or refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Access token attached to every outbound request.
	pub access_token: TokenSecret,
	/// Refresh token used to mint a new access token.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the pair was stored.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
	/// Expiry advertised by the backend, when known.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
}
impl CredentialPair {
	/// Creates a pair issued now without a known expiry.
	pub fn new(access_token: TokenSecret, refresh_token: Option<TokenSecret>) -> Self {
		Self {
			access_token,
			refresh_token,
			issued_at: OffsetDateTime::now_utc(),
			expires_at: None,
		}
	}

	/// Records the backend's `expires_in` hint relative to [`CredentialPair::issued_at`].
	///
	/// A hint that lands outside the representable date range leaves the expiry unknown.
	pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
		self.expires_at = self.issued_at.checked_add(expires_in);

		self
	}

	/// Returns true when the advertised expiry has passed at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| expires_at <= now)
	}
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn expiry_tracks_expires_in_hint() {
		let mut pair = CredentialPair::new(TokenSecret::new("access"), None);

		pair.issued_at = macros::datetime!(2025-08-24 10:00 UTC);

		let pair = pair.with_expires_in(Duration::seconds(1800));

		assert_eq!(pair.expires_at, Some(macros::datetime!(2025-08-24 10:30 UTC)));
		assert!(!pair.is_expired_at(macros::datetime!(2025-08-24 10:29 UTC)));
		assert!(pair.is_expired_at(macros::datetime!(2025-08-24 10:30 UTC)));
	}

	#[test]
	fn out_of_range_expires_in_leaves_expiry_unknown() {
		let pair = CredentialPair::new(TokenSecret::new("access"), None)
			.with_expires_in(Duration::seconds(9_000_000_000_000));

		assert!(pair.expires_at.is_none());
		assert!(!pair.is_expired_at(OffsetDateTime::now_utc()));
	}

	#[test]
	fn pair_without_expiry_never_expires() {
		let pair = CredentialPair::new(TokenSecret::new("access"), None);

		assert!(!pair.is_expired_at(OffsetDateTime::now_utc() + Duration::days(365)));
	}

	#[test]
	fn credential_pair_serializes_with_rfc3339_instants() {
		let mut pair =
			CredentialPair::new(TokenSecret::new("access"), Some(TokenSecret::new("refresh")));

		pair.issued_at = macros::datetime!(2025-08-24 10:00 UTC);

		let payload = serde_json::to_value(&pair).expect("Credential pair should serialize.");

		assert_eq!(payload["access_token"], "access");
		assert_eq!(payload["refresh_token"], "refresh");
		assert_eq!(payload["issued_at"], "2025-08-24T10:00:00Z");
		assert!(payload["expires_at"].is_null());
	}
}
