//! Saves a Canvas configuration, prints the authorize URL instead of opening a browser, and
//! waits for the LMS to record the credential.
//!
//! Point `LMS_PORTAL_CONFIG` at a JSON portal configuration to target a real deployment.

// std
use std::{io, sync::Arc};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use lms_auth_coordinator::{
	auth::EnterpriseId,
	config::PortalConfig,
	flows::{CanvasAuthorizationFlow, SessionState},
	http::{ConfigurationApi, ReqwestConfigurationApi, ReqwestHttpClient},
	lms::{CanvasConfigForm, ConfigField},
	provider::AuthorizationLauncher,
};

struct PrintLauncher;
impl AuthorizationLauncher for PrintLauncher {
	fn launch(&self, url: &Url) -> io::Result<()> {
		println!("Approve the integration at {url}.");

		Ok(())
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = match std::env::var("LMS_PORTAL_CONFIG") {
		Ok(path) => PortalConfig::from_json_str(&std::fs::read_to_string(path)?)?,
		Err(_) => PortalConfig::new(Url::parse("http://localhost:18000")?),
	};
	let api: Arc<dyn ConfigurationApi> =
		Arc::new(ReqwestConfigurationApi::from_config(ReqwestHttpClient::default(), &config)?);
	let mut flow = CanvasAuthorizationFlow::new(
		api,
		Arc::new(PrintLauncher),
		EnterpriseId::new("85b08dde-0877-4474-a4e9-8408fe47ce88")?,
		&config,
	)?;
	let mut form = CanvasConfigForm::new();

	form.set_field(ConfigField::DisplayName, "Demo Canvas")?;
	form.set_field(ConfigField::ClientId, "10000000000001")?;
	form.set_field(ConfigField::ClientSecret, "demo-developer-key")?;
	form.set_field(ConfigField::CanvasAccountId, "1")?;
	form.set_field(ConfigField::CanvasBaseUrl, "https://canvas.example.edu")?;

	let token = flow.authorize(&form).await?;

	println!(
		"Polling configuration {:?} (session {}).",
		flow.config_id(),
		token.generation()
	);

	match flow.coordinator().wait_for_terminal().await {
		SessionState::Authorized => println!("Canvas confirmed the integration."),
		_ =>
			if let Some(e) = flow.coordinator().outcome_error() {
				eprintln!("{e}");
			},
	}

	Ok(())
}
