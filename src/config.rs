//! Gateway configuration: backend target selection, endpoint paths, and message overrides.

// self
use crate::{_prelude::*, error::ConfigError};

/// Where the gateway sends requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiTarget {
	/// Mock backend served under `{origin}/mock/api`.
	Mock {
		/// Origin hosting the mock endpoints.
		origin: Url,
	},
	/// Legacy module dispatcher served under `{origin}/php/modules.php`.
	Php {
		/// Origin hosting the dispatcher.
		origin: Url,
	},
	/// Live API reachable at an explicit base URL.
	Api {
		/// Base URL every request path is resolved against.
		url: Url,
	},
}
impl ApiTarget {
	/// Resolves the base URL for this target.
	pub fn base_url(&self) -> Result<Url, ConfigError> {
		match self {
			Self::Mock { origin } => join_origin(origin, "/mock/api"),
			Self::Php { origin } => join_origin(origin, "/php/modules.php"),
			Self::Api { url } => Ok(url.clone()),
		}
	}
}

/// Validated gateway configuration.
#[derive(Clone, Debug)]
pub struct GatewayConfig {
	/// Base URL, always ending with `/` so relative paths append instead of replacing.
	pub base_url: Url,
	/// Per-request timeout applied by the transport.
	pub timeout: StdDuration,
	/// Backend system segment used in versioned paths (`{system}/1.0/...`).
	pub api_system: String,
	/// Login endpoint path.
	pub login_path: String,
	/// Logout endpoint path.
	pub logout_path: String,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Path fragments that never trigger the refresh protocol.
	pub exempt_markers: Vec<String>,
	/// Fixed replacements for known backend messages.
	pub message_overrides: BTreeMap<String, String>,
	/// Module dispatcher URL that receives business calls.
	pub dispatcher_url: Url,
	/// Mock backends expose one route per business function instead of a single dispatcher.
	pub route_by_function: bool,
	/// Timeout applied to business calls.
	pub business_timeout: StdDuration,
}
impl GatewayConfig {
	/// Default per-request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);
	/// Default business call timeout.
	pub const DEFAULT_BUSINESS_TIMEOUT: StdDuration = StdDuration::from_secs(10);
	/// Default backend system segment.
	pub const DEFAULT_API_SYSTEM: &'static str = "TSC";
	/// Backend message reported when the caller lacks a permission.
	pub const INSUFFICIENT_PERMISSIONS: &'static str = "insufficient_permissions";
	/// Localized replacement for [`GatewayConfig::INSUFFICIENT_PERMISSIONS`].
	pub const INSUFFICIENT_PERMISSIONS_MESSAGE: &'static str = "缺少必要權限，無法執行此操作";

	/// Starts a builder for the provided target.
	pub fn builder(target: ApiTarget) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(target)
	}

	/// Resolves `path` against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let relative = path.trim_start_matches('/');

		self.base_url
			.join(relative)
			.map_err(|source| ConfigError::InvalidUrl { url: relative.to_owned(), source })
	}

	/// Resolves where a business call for `which_function` is posted.
	pub fn business_endpoint(&self, which_function: &str) -> Result<Url, ConfigError> {
		if self.route_by_function {
			self.endpoint(which_function)
		} else {
			Ok(self.dispatcher_url.clone())
		}
	}

	/// Returns true when `path` targets an authentication endpoint.
	pub fn is_exempt(&self, path: &str) -> bool {
		self.exempt_markers.iter().any(|marker| path.contains(marker.as_str()))
	}

	/// Applies the message override table.
	pub fn translate(&self, message: String) -> String {
		match self.message_overrides.get(&message) {
			Some(replacement) => replacement.clone(),
			None => message,
		}
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Backend target.
	pub target: ApiTarget,
	/// Per-request timeout.
	pub timeout: StdDuration,
	/// Backend system segment.
	pub api_system: String,
	/// Login endpoint path.
	pub login_path: String,
	/// Logout endpoint path.
	pub logout_path: String,
	/// Explicit refresh path; derived from the system segment when absent.
	pub refresh_path: Option<String>,
	/// Path fragments exempt from the refresh protocol.
	pub exempt_markers: Vec<String>,
	/// Message replacements.
	pub message_overrides: BTreeMap<String, String>,
	/// Business call timeout.
	pub business_timeout: StdDuration,
}
impl GatewayConfigBuilder {
	/// Creates a builder seeded with the defaults.
	pub fn new(target: ApiTarget) -> Self {
		Self {
			target,
			timeout: GatewayConfig::DEFAULT_TIMEOUT,
			api_system: GatewayConfig::DEFAULT_API_SYSTEM.into(),
			login_path: "auth/login".into(),
			logout_path: "auth/logout".into(),
			refresh_path: None,
			exempt_markers: ["auth/login", "auth/token", "auth/logout", "auth/refresh"]
				.into_iter()
				.map(String::from)
				.collect(),
			message_overrides: BTreeMap::from([(
				GatewayConfig::INSUFFICIENT_PERMISSIONS.to_owned(),
				GatewayConfig::INSUFFICIENT_PERMISSIONS_MESSAGE.to_owned(),
			)]),
			business_timeout: GatewayConfig::DEFAULT_BUSINESS_TIMEOUT,
		}
	}

	/// Overrides the per-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the backend system segment.
	pub fn api_system(mut self, system: impl Into<String>) -> Self {
		self.api_system = system.into();

		self
	}

	/// Overrides the login endpoint path.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the logout endpoint path.
	pub fn logout_path(mut self, path: impl Into<String>) -> Self {
		self.logout_path = path.into();

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = Some(path.into());

		self
	}

	/// Adds a path fragment exempt from the refresh protocol.
	pub fn exempt_marker(mut self, marker: impl Into<String>) -> Self {
		self.exempt_markers.push(marker.into());

		self
	}

	/// Adds or replaces a message override.
	pub fn message_override(
		mut self,
		message: impl Into<String>,
		replacement: impl Into<String>,
	) -> Self {
		self.message_overrides.insert(message.into(), replacement.into());

		self
	}

	/// Overrides the business call timeout.
	pub fn business_timeout(mut self, timeout: StdDuration) -> Self {
		self.business_timeout = timeout;

		self
	}

	/// Validates the builder and produces a [`GatewayConfig`].
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let dispatcher_url = self.target.base_url()?;
		let mut base_url = dispatcher_url.clone();

		match base_url.scheme() {
			"http" | "https" => {},
			other => return Err(ConfigError::UnsupportedScheme { scheme: other.to_owned() }),
		}

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		let api_system = self.api_system.trim().trim_matches('/').to_owned();

		if api_system.is_empty() {
			return Err(ConfigError::EmptyApiSystem);
		}
		if self.timeout.is_zero() || self.business_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}

		let refresh_path =
			self.refresh_path.unwrap_or_else(|| format!("{api_system}/1.0/auth/refresh"));
		let config = GatewayConfig {
			base_url,
			timeout: self.timeout,
			api_system,
			login_path: self.login_path,
			logout_path: self.logout_path,
			refresh_path,
			exempt_markers: self.exempt_markers,
			message_overrides: self.message_overrides,
			dispatcher_url,
			route_by_function: matches!(self.target, ApiTarget::Mock { .. }),
			business_timeout: self.business_timeout,
		};

		config.endpoint(&config.refresh_path)?;
		config.endpoint(&config.login_path)?;
		config.endpoint(&config.logout_path)?;

		Ok(config)
	}
}

fn join_origin(origin: &Url, suffix: &str) -> Result<Url, ConfigError> {
	origin
		.join(suffix)
		.map_err(|source| ConfigError::InvalidUrl { url: format!("{origin}{suffix}"), source })
}
