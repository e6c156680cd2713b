//! Hand-off of authorize URLs to a browsing context.

// std
use std::io;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	obs::obs_event,
	provider::ProviderDescriptor,
};

/// Opens an authorize URL in a new browsing context.
pub trait AuthorizationLauncher
where
	Self: Send + Sync,
{
	/// Hands `url` to the browsing context. Fire-and-forget from the caller's perspective.
	fn launch(&self, url: &Url) -> io::Result<()>;
}

/// Launcher backed by the operating system's default browser.
#[cfg(feature = "browser")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserLauncher;
#[cfg(feature = "browser")]
impl AuthorizationLauncher for BrowserLauncher {
	fn launch(&self, url: &Url) -> io::Result<()> {
		open::that_detached(url.as_str())
	}
}

/// Builds the provider's authorize URL and opens it through `launcher`.
///
/// A launcher failure (for example a blocked pop-up) is logged and otherwise ignored; the
/// polling session keeps running and eventually times out. Only URL construction errors are
/// returned.
pub fn launch_external_authorization(
	launcher: &dyn AuthorizationLauncher,
	provider_base_url: &str,
	client_id: &str,
	state: &str,
	redirect_uri: &Url,
) -> Result<Url, ConfigError> {
	let descriptor = ProviderDescriptor::parse_canvas(provider_base_url)?;
	let url = descriptor.authorize_url(client_id, state, redirect_uri);

	open_authorization_url(launcher, &url);

	Ok(url)
}

pub(crate) fn open_authorization_url(launcher: &dyn AuthorizationLauncher, url: &Url) {
	if let Err(e) = launcher.launch(url) {
		obs_event!(warn, error = %e, "Could not open the provider authorization page.");
	}
}
