//! Deployment configuration: backend service roots and OAuth polling cadence.
//!
//! Configuration arrives as a JSON document (or is assembled with the `with_*` setters) and
//! is validated once up front so flows can rely on well-formed URLs and positive durations.

// self
use crate::{_prelude::*, error::ConfigError, obs::obs_event};

/// Polling cadence used while waiting for the provider to confirm an authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuthPollingConfig {
	/// Milliseconds between two status checks.
	pub poll_interval_ms: u64,
	/// Milliseconds before the session gives up and reports a timeout.
	pub timeout_ms: u64,
}
impl OAuthPollingConfig {
	/// Default polling interval (one second).
	pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
	/// Default authorization deadline (one minute).
	pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
	/// Minimum number of polls a deadline is expected to leave room for.
	pub const EXPECTED_POLLS_PER_DEADLINE: u64 = 3;

	/// Interval between polls.
	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	/// Overall authorization deadline.
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	/// Rejects zero durations; warns when the deadline leaves room for only a couple of polls.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.poll_interval_ms == 0 {
			return Err(ConfigError::NonPositiveDuration { field: "poll_interval" });
		}
		if self.timeout_ms == 0 {
			return Err(ConfigError::NonPositiveDuration { field: "timeout" });
		}
		if self.timeout_ms < self.poll_interval_ms.saturating_mul(Self::EXPECTED_POLLS_PER_DEADLINE)
		{
			obs_event!(
				warn,
				poll_interval_ms = self.poll_interval_ms,
				timeout_ms = self.timeout_ms,
				"Authorization deadline leaves room for fewer than three polls."
			);
		}

		Ok(())
	}
}
impl Default for OAuthPollingConfig {
	fn default() -> Self {
		Self {
			poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
			timeout_ms: Self::DEFAULT_TIMEOUT_MS,
		}
	}
}

/// Service roots and polling settings for the admin portal collaborators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
	/// LMS root; hosts the integrated-channel configuration API and the OAuth landing page.
	pub lms_base_url: Url,
	/// Enterprise-access service root (subsidy request configurations).
	pub enterprise_access_base_url: Url,
	/// Ecommerce service root (coupon orders).
	pub ecommerce_base_url: Url,
	/// License-manager service root (subscriptions).
	pub license_manager_base_url: Url,
	/// OAuth polling cadence.
	#[serde(default)]
	pub oauth: OAuthPollingConfig,
}
impl PortalConfig {
	const CANVAS_OAUTH_COMPLETE_PATH: &'static str = "canvas/oauth-complete";

	/// Creates a configuration that points every service at the same root.
	pub fn new(base_url: Url) -> Self {
		Self {
			lms_base_url: base_url.clone(),
			enterprise_access_base_url: base_url.clone(),
			ecommerce_base_url: base_url.clone(),
			license_manager_base_url: base_url,
			oauth: OAuthPollingConfig::default(),
		}
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(&mut de)?;

		config.validate()?;

		Ok(config)
	}

	/// Overrides the LMS root.
	pub fn with_lms_base_url(mut self, url: Url) -> Self {
		self.lms_base_url = url;

		self
	}

	/// Overrides the enterprise-access root.
	pub fn with_enterprise_access_base_url(mut self, url: Url) -> Self {
		self.enterprise_access_base_url = url;

		self
	}

	/// Overrides the ecommerce root.
	pub fn with_ecommerce_base_url(mut self, url: Url) -> Self {
		self.ecommerce_base_url = url;

		self
	}

	/// Overrides the license-manager root.
	pub fn with_license_manager_base_url(mut self, url: Url) -> Self {
		self.license_manager_base_url = url;

		self
	}

	/// Overrides the polling cadence.
	pub fn with_oauth(mut self, oauth: OAuthPollingConfig) -> Self {
		self.oauth = oauth;

		self
	}

	/// Validates every URL and the polling cadence.
	pub fn validate(&self) -> Result<(), ConfigError> {
		validate_service_url("lms_base_url", &self.lms_base_url)?;
		validate_service_url("enterprise_access_base_url", &self.enterprise_access_base_url)?;
		validate_service_url("ecommerce_base_url", &self.ecommerce_base_url)?;
		validate_service_url("license_manager_base_url", &self.license_manager_base_url)?;

		self.oauth.validate()
	}

	/// Landing page the LMS redirects to once the administrator approves the integration.
	pub fn canvas_redirect_url(&self) -> Result<Url, ConfigError> {
		join_path(&self.lms_base_url, Self::CANVAS_OAUTH_COMPLETE_PATH, "lms_base_url")
	}
}

/// Joins `path` onto `base`, treating `base` as a directory even without a trailing slash.
pub(crate) fn join_path(base: &Url, path: &str, field: &'static str) -> Result<Url, ConfigError> {
	let mut root = base.clone();

	if !root.path().ends_with('/') {
		let with_slash = format!("{}/", root.path());

		root.set_path(&with_slash);
	}

	root.join(path).map_err(|source| ConfigError::InvalidUrl { field, source })
}

fn validate_service_url(field: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"http" | "https" if url.has_host() => Ok(()),
		_ => Err(ConfigError::UnsupportedScheme { field, url: url.to_string() }),
	}
}
