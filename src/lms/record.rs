//! Wire shapes exchanged with the integrated-channels Canvas configuration API.

// self
use crate::{
	_prelude::*,
	auth::{ConfigId, EnterpriseId, Secret},
};

/// Body sent when creating or updating a Canvas configuration record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfigPayload {
	/// Administrator-chosen label.
	pub display_name: String,
	/// Canvas developer key identifier.
	pub client_id: String,
	/// Canvas developer key secret.
	pub client_secret: Secret,
	/// Canvas account the integration is attached to.
	pub canvas_account_id: u64,
	/// Root URL of the Canvas instance.
	pub canvas_base_url: String,
	/// Records stay inactive until the administrator submits the finished form.
	pub active: bool,
	/// Enterprise that owns the record.
	pub enterprise_customer: EnterpriseId,
}

/// Canvas configuration record as returned by the integrated-channels API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfigRecord {
	/// Record identifier.
	pub id: ConfigId,
	/// Record UUID, when the service exposes one.
	#[serde(default)]
	pub uuid: Option<String>,
	/// Administrator-chosen label.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Canvas developer key identifier.
	#[serde(default)]
	pub client_id: Option<String>,
	/// Canvas developer key secret.
	#[serde(default)]
	pub client_secret: Option<Secret>,
	/// Canvas account the integration is attached to.
	#[serde(default)]
	pub canvas_account_id: Option<u64>,
	/// Root URL of the Canvas instance.
	#[serde(default)]
	pub canvas_base_url: Option<String>,
	/// Refresh token minted once the administrator approved the integration in Canvas.
	#[serde(default)]
	pub refresh_token: Option<Secret>,
	/// Whether the integration is live.
	#[serde(default)]
	pub active: bool,
}
impl CanvasConfigRecord {
	/// Creates an empty record shell for the given identifier.
	pub fn new(id: ConfigId) -> Self {
		Self {
			id,
			uuid: None,
			display_name: None,
			client_id: None,
			client_secret: None,
			canvas_account_id: None,
			canvas_base_url: None,
			refresh_token: None,
			active: false,
		}
	}

	/// Whether the provider has completed authorization for this record.
	pub fn credential_present(&self) -> bool {
		self.refresh_token.as_ref().is_some_and(|token| !token.is_blank())
	}

	/// Status snapshot used by the authorization poller.
	pub fn status(&self) -> ConfigurationStatus {
		ConfigurationStatus { id: self.id, credential_present: self.credential_present() }
	}
}

/// Authorization status of a remote configuration record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationStatus {
	/// Record the status belongs to.
	pub id: ConfigId,
	/// Whether the provider has issued a credential for the record.
	pub credential_present: bool,
}
