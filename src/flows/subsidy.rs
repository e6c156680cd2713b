//! Subsidy request configuration bootstrap.
//!
//! An enterprise's subsidy request configuration lives in the enterprise-access service. When
//! none exists yet, [`SubsidyRequestConfigurator::load`] creates one whose subsidy type is
//! inferred from the coupon orders and subscription plans the enterprise already holds.

// self
use crate::{
	_prelude::*,
	auth::EnterpriseId,
	http::SubsidyApi,
	obs::{self, FlowKind, FlowOutcome, FlowSpan, obs_event},
};

/// Subsidy kinds learners may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsidyType {
	/// Coupon codes.
	Coupon,
	/// Subscription licenses.
	License,
}
impl SubsidyType {
	/// Wire label.
	pub const fn as_str(self) -> &'static str {
		match self {
			SubsidyType::Coupon => "coupon",
			SubsidyType::License => "license",
		}
	}
}
impl Display for SubsidyType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Picks the subsidy type for a new configuration.
///
/// Enterprises holding both kinds (or neither) are not eligible and get `None`.
pub fn infer_subsidy_type(has_coupons: bool, has_subscriptions: bool) -> Option<SubsidyType> {
	match (has_coupons, has_subscriptions) {
		(true, false) => Some(SubsidyType::Coupon),
		(false, true) => Some(SubsidyType::License),
		_ => None,
	}
}

/// Enterprise-access view of an enterprise's subsidy request settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsidyRequestConfiguration {
	/// Owning enterprise.
	#[serde(default)]
	pub enterprise_customer_uuid: Option<String>,
	/// Subsidy type requests are fulfilled with; `None` means not eligible.
	#[serde(default)]
	pub subsidy_type: Option<SubsidyType>,
	/// Learners may submit requests.
	#[serde(default)]
	pub subsidy_requests_enabled: bool,
}

/// Partial update sent to the enterprise-access service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SubsidyConfigurationUpdate {
	/// New subsidy type.
	pub subsidy_type: Option<SubsidyType>,
	/// New enablement flag.
	pub subsidy_requests_enabled: bool,
}

/// Loads (or bootstraps) and updates one enterprise's subsidy request configuration.
pub struct SubsidyRequestConfigurator {
	api: Arc<dyn SubsidyApi>,
	enterprise: EnterpriseId,
	state: Mutex<ConfiguratorState>,
}
impl SubsidyRequestConfigurator {
	/// Creates a configurator; it reports loading until [`Self::load`] finishes.
	pub fn new(api: Arc<dyn SubsidyApi>, enterprise: EnterpriseId) -> Self {
		Self {
			api,
			enterprise,
			state: Mutex::new(ConfiguratorState { configuration: None, is_loading: true }),
		}
	}

	/// Fetches the configuration, creating it when the service reports none.
	///
	/// Failures are logged rather than returned; the loading flag clears either way.
	pub async fn load(&self) -> Option<SubsidyRequestConfiguration> {
		const KIND: FlowKind = FlowKind::SubsidyConfiguration;

		let span = FlowSpan::new(KIND, "load");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let loaded = span
			.instrument(async {
				match self.api.get_subsidy_request_configuration(&self.enterprise, false).await {
					Ok(configuration) => Some(configuration),
					Err(e) if e.is_not_found() => self.create().await,
					Err(e) => {
						obs_event!(
							error,
							enterprise = %self.enterprise,
							error = %e,
							"Failed to load the subsidy request configuration."
						);

						None
					},
				}
			})
			.await;
		let mut state = self.state.lock();

		state.is_loading = false;

		match loaded {
			Some(configuration) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				state.configuration = Some(configuration.clone());

				Some(configuration)
			},
			None => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				state.configuration.clone()
			},
		}
	}

	/// Applies an update, then refreshes the cached copy bypassing intermediary caches.
	pub async fn update(
		&self,
		subsidy_type: Option<SubsidyType>,
		subsidy_requests_enabled: bool,
	) -> Result<SubsidyRequestConfiguration> {
		const KIND: FlowKind = FlowKind::SubsidyConfiguration;

		let span = FlowSpan::new(KIND, "update");
		let update = SubsidyConfigurationUpdate { subsidy_type, subsidy_requests_enabled };

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.apply_update(&update)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Last known configuration.
	pub fn configuration(&self) -> Option<SubsidyRequestConfiguration> {
		self.state.lock().configuration.clone()
	}

	/// Whether the initial load is still outstanding.
	pub fn is_loading(&self) -> bool {
		self.state.lock().is_loading
	}

	/// Enterprise this configurator manages.
	pub fn enterprise(&self) -> &EnterpriseId {
		&self.enterprise
	}

	async fn apply_update(
		&self,
		update: &SubsidyConfigurationUpdate,
	) -> Result<SubsidyRequestConfiguration> {
		let updated = self
			.api
			.update_subsidy_request_configuration(&self.enterprise, update)
			.await
			.inspect_err(|e| {
				obs_event!(
					error,
					enterprise = %self.enterprise,
					error = %e,
					"Failed to update the subsidy request configuration."
				);
			})?;

		self.state.lock().configuration = Some(updated.clone());

		match self.api.get_subsidy_request_configuration(&self.enterprise, true).await {
			Ok(fresh) => {
				self.state.lock().configuration = Some(fresh.clone());

				Ok(fresh)
			},
			Err(e) => {
				obs_event!(
					warn,
					enterprise = %self.enterprise,
					error = %e,
					"Failed to reload the subsidy request configuration after an update."
				);

				Ok(updated)
			},
		}
	}

	async fn create(&self) -> Option<SubsidyRequestConfiguration> {
		match self.try_create().await {
			Ok(configuration) => {
				obs_event!(
					info,
					enterprise = %self.enterprise,
					subsidy_type = ?configuration.subsidy_type,
					"Created the subsidy request configuration."
				);

				Some(configuration)
			},
			Err(e) => {
				obs_event!(
					error,
					enterprise = %self.enterprise,
					error = %e,
					"Failed to create the subsidy request configuration."
				);

				None
			},
		}
	}

	async fn try_create(&self) -> Result<SubsidyRequestConfiguration, ApiError> {
		let (coupons, subscriptions) = tokio::join!(
			self.api.fetch_coupon_order_count(&self.enterprise),
			self.api.fetch_subscription_count(&self.enterprise),
		);
		let subsidy_type = infer_subsidy_type(coupons? > 0, subscriptions? > 0);

		self.api.create_subsidy_request_configuration(&self.enterprise, subsidy_type).await
	}
}
impl Debug for SubsidyRequestConfigurator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let state = self.state.lock();

		f.debug_struct("SubsidyRequestConfigurator")
			.field("enterprise", &self.enterprise)
			.field("configuration", &state.configuration)
			.field("is_loading", &state.is_loading)
			.finish()
	}
}

#[derive(Debug)]
struct ConfiguratorState {
	configuration: Option<SubsidyRequestConfiguration>,
	is_loading: bool,
}
