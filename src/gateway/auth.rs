//! Login and logout helpers that own the session's credential lifecycle.

// self
use crate::{
	_prelude::*,
	gateway::Gateway,
	http::GatewayHttpClient,
	request::RequestOptions,
	result::ApiResult,
	session::{CredentialPair, TokenSecret},
};

/// User session returned by the login endpoint's `Data` envelope.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LoginSession {
	/// Numeric user identifier.
	pub user_id: u64,
	/// Login name, when echoed back.
	#[serde(default)]
	pub username: Option<String>,
	/// Display name.
	#[serde(default)]
	pub fullname: String,
	/// Role names granted to the user.
	#[serde(default)]
	pub user_roles: Vec<String>,
	/// Permission tree, kept opaque.
	#[serde(default)]
	pub permissions: Value,
	/// Backend-formatted login timestamp.
	#[serde(default)]
	pub login_time: String,
	/// Issued credentials.
	pub tokens: IssuedTokens,
}

/// Token block of a login response.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct IssuedTokens {
	/// Access token for subsequent requests.
	pub access_token: TokenSecret,
	/// Refresh token for the coordinated refresh.
	#[serde(default)]
	pub refresh_token: Option<TokenSecret>,
	/// Access token lifetime in seconds.
	#[serde(default)]
	pub expires_in: Option<i64>,
	/// Token type, normally `Bearer`.
	#[serde(default)]
	pub token_type: Option<String>,
}
impl IssuedTokens {
	/// Converts the issued tokens into a storable credential pair.
	pub fn into_credentials(self) -> CredentialPair {
		let refresh = self.refresh_token.filter(|token| !token.is_empty());
		let pair = CredentialPair::new(self.access_token, refresh);

		match self.expires_in.filter(|seconds| *seconds > 0) {
			Some(seconds) => pair.with_expires_in(Duration::seconds(seconds)),
			None => pair,
		}
	}
}

#[derive(Deserialize)]
struct LoginEnvelope {
	#[serde(rename = "Data")]
	data: LoginSession,
}

impl<C> Gateway<C>
where
	C: ?Sized + GatewayHttpClient,
{
	/// Authenticates and stores the issued credential pair.
	///
	/// Failed logins surface as [`Error::Api`] carrying the extracted message and the `handled`
	/// flag of the underlying result.
	pub async fn login(&self, username: &str, password: &str) -> Result<LoginSession> {
		let body = serde_json::json!({ "username": username, "password": password });
		let result = self
			.post(self.config.login_path.clone(), Some(body), RequestOptions::default())
			.await
			.into_result()?;
		let data = result.data.unwrap_or(Value::Null);
		let envelope: LoginEnvelope = serde_path_to_error::deserialize(data)
			.map_err(|source| Error::MalformedResponse { source })?;
		let session = envelope.data;

		self.session.set_credentials(session.tokens.clone().into_credentials())?;

		Ok(session)
	}

	/// Ends the session.
	///
	/// Unless `expired`, the logout endpoint is called first and its result returned. The local
	/// session is cleared either way.
	pub async fn logout(&self, expired: bool) -> Result<Option<ApiResult>> {
		let result = if expired {
			None
		} else {
			let body = Value::Object(Default::default());

			Some(
				self.post(self.config.logout_path.clone(), Some(body), RequestOptions::default())
					.await,
			)
		};

		self.session.clear()?;

		Ok(result)
	}
}
