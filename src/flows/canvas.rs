//! Canvas integration setup: persist the configuration form, then hand the administrator to
//! Canvas and wait for the LMS to record the resulting credential.

// self
use crate::{
	_prelude::*,
	auth::{ConfigId, EnterpriseId},
	config::{OAuthPollingConfig, PortalConfig},
	flows::{AuthorizationCoordinator, SessionState, SessionToken},
	http::ConfigurationApi,
	lms::{CanvasConfigForm, CanvasConfigPayload, RecordAction},
	obs::{self, FlowKind, FlowOutcome, FlowSpan, obs_event},
	provider::{AuthorizationLauncher, ProviderDescriptor, launcher},
};

/// Drives one Canvas configuration form through save and authorization.
pub struct CanvasAuthorizationFlow {
	api: Arc<dyn ConfigurationApi>,
	launcher: Arc<dyn AuthorizationLauncher>,
	coordinator: AuthorizationCoordinator,
	enterprise: EnterpriseId,
	polling: OAuthPollingConfig,
	redirect_uri: Url,
	config_id: Option<ConfigId>,
}
impl CanvasAuthorizationFlow {
	/// Creates a flow for `enterprise` using the polling cadence and redirect from `config`.
	pub fn new(
		api: Arc<dyn ConfigurationApi>,
		launcher: Arc<dyn AuthorizationLauncher>,
		enterprise: EnterpriseId,
		config: &PortalConfig,
	) -> Result<Self> {
		config.oauth.validate()?;

		let redirect_uri = config.canvas_redirect_url()?;

		Ok(Self {
			coordinator: AuthorizationCoordinator::new(Arc::clone(&api)),
			api,
			launcher,
			enterprise,
			polling: config.oauth,
			redirect_uri,
			config_id: None,
		})
	}

	/// Saves the form as needed, arms the coordinator, and opens the Canvas authorize page.
	///
	/// Remote failures while saving abort the attempt before anything is armed.
	pub async fn authorize(&mut self, form: &CanvasConfigForm) -> Result<SessionToken> {
		const KIND: FlowKind = FlowKind::CanvasConfiguration;

		let span = FlowSpan::new(KIND, "authorize");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.start_authorization(form)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Persists the form without authorizing and returns the record id.
	pub async fn submit(&mut self, form: &CanvasConfigForm) -> Result<ConfigId> {
		const KIND: FlowKind = FlowKind::CanvasConfiguration;

		let span = FlowSpan::new(KIND, "submit");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.save(form)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Whether the record behind `form` holds a credential, either from before the form was
	/// opened or from the latest authorization session.
	pub fn is_authorized(&self, form: &CanvasConfigForm) -> bool {
		form.existing_authorized() || self.coordinator.state() == SessionState::Authorized
	}

	/// Coordinator polling the record; use it to observe or cancel the session.
	pub fn coordinator(&self) -> &AuthorizationCoordinator {
		&self.coordinator
	}

	/// Record id resolved by the last save or authorization.
	pub fn config_id(&self) -> Option<ConfigId> {
		self.config_id
	}

	async fn start_authorization(&mut self, form: &CanvasConfigForm) -> Result<SessionToken> {
		let payload = form.to_payload(&self.enterprise, "authorization")?;
		let descriptor = ProviderDescriptor::parse_canvas(&payload.canvas_base_url)?;
		let config_id = self.persist(form.authorization_action(self.config_id), &payload).await?;

		self.config_id = Some(config_id);

		let token = self.coordinator.begin_authorization(
			config_id,
			self.polling.poll_interval(),
			self.polling.timeout(),
		)?;
		let url =
			descriptor.authorize_url(&payload.client_id, &self.enterprise, &self.redirect_uri);

		launcher::open_authorization_url(self.launcher.as_ref(), &url);

		Ok(token)
	}

	async fn save(&mut self, form: &CanvasConfigForm) -> Result<ConfigId> {
		let payload = form.to_payload(&self.enterprise, "submission")?;
		let id = self.persist(form.save_action(self.config_id), &payload).await?;

		self.config_id = Some(id);

		Ok(id)
	}

	async fn persist(
		&self,
		action: RecordAction,
		payload: &CanvasConfigPayload,
	) -> Result<ConfigId> {
		let id = match action {
			RecordAction::Create => self.api.create_configuration(payload).await?,
			RecordAction::Update(id) => self.api.update_configuration(id, payload).await?,
			RecordAction::Reuse(id) => id,
		};

		obs_event!(debug, config_id = id.0, action = ?action, "Canvas configuration persisted.");

		Ok(id)
	}
}
impl Debug for CanvasAuthorizationFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CanvasAuthorizationFlow")
			.field("enterprise", &self.enterprise)
			.field("config_id", &self.config_id)
			.field("polling", &self.polling)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
