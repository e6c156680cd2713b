//! Validated LMS provider metadata and authorize URL construction.

// self
use crate::{_prelude::*, error::ConfigError};

/// Path of Canvas' OAuth 2.0 authorize endpoint, relative to the instance root.
pub const CANVAS_AUTHORIZATION_PATH: &str = "login/oauth2/auth";

/// Validated description of an LMS instance acting as OAuth provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Root URL of the LMS instance.
	pub base_url: Url,
	/// Authorize endpoint, resolved against `base_url`.
	pub authorization_endpoint: Url,
}
impl ProviderDescriptor {
	/// Describes a Canvas instance rooted at `base_url`.
	pub fn canvas(base_url: Url) -> Result<Self, ConfigError> {
		Self::new(base_url, CANVAS_AUTHORIZATION_PATH)
	}

	/// Describes an instance whose authorize endpoint lives at `authorization_path`.
	pub fn new(base_url: Url, authorization_path: &str) -> Result<Self, ConfigError> {
		if !matches!(base_url.scheme(), "http" | "https") || !base_url.has_host() {
			return Err(ConfigError::UnsupportedScheme {
				field: "provider_base_url",
				url: base_url.to_string(),
			});
		}

		let authorization_endpoint =
			crate::config::join_path(&base_url, authorization_path, "provider_base_url")?;

		Ok(Self { base_url, authorization_endpoint })
	}

	/// Parses and describes a Canvas instance from raw form input.
	pub fn parse_canvas(raw: &str) -> Result<Self, ConfigError> {
		let base_url = Url::parse(raw.trim())
			.map_err(|source| ConfigError::InvalidUrl { field: "provider_base_url", source })?;

		Self::canvas(base_url)
	}

	/// Authorize URL the administrator must visit to approve the integration.
	///
	/// `state` round-trips through the provider back to the redirect handler, which uses it to
	/// find the enterprise the record belongs to.
	pub fn authorize_url(&self, client_id: &str, state: &str, redirect_uri: &Url) -> Url {
		let mut url = self.authorization_endpoint.clone();

		url.query_pairs_mut()
			.append_pair("client_id", client_id)
			.append_pair("state", state)
			.append_pair("response_type", "code")
			.append_pair("redirect_uri", redirect_uri.as_str());

		url
	}
}
