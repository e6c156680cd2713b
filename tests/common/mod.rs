//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, io, sync::Arc, time::Duration};
// crates.io
use parking_lot::Mutex;
use tokio::time::Instant;
// self
use lms_auth_coordinator::{
	auth::{ConfigId, EnterpriseId},
	error::ApiError,
	flows::{SubsidyConfigurationUpdate, SubsidyRequestConfiguration, SubsidyType},
	http::{ApiFuture, ConfigurationApi, SubsidyApi},
	lms::{CanvasConfigPayload, ConfigurationStatus},
	provider::AuthorizationLauncher,
	url::Url,
};

pub fn enterprise() -> EnterpriseId {
	EnterpriseId::new("8d6f2a1c-4e3b-4a7d-9c25-61f0b8e4d3a9")
		.expect("Enterprise fixture should be valid.")
}

/// One scripted answer to a status check.
#[derive(Clone, Copy, Debug)]
pub struct Step {
	pub delay: Duration,
	pub reply: Reply,
}
impl Step {
	pub fn pending() -> Self {
		Self { delay: Duration::ZERO, reply: Reply::Pending }
	}

	pub fn authorized() -> Self {
		Self { delay: Duration::ZERO, reply: Reply::Authorized }
	}

	pub fn failure(status: u16) -> Self {
		Self { delay: Duration::ZERO, reply: Reply::Failure(status) }
	}

	pub fn after(mut self, delay: Duration) -> Self {
		self.delay = delay;

		self
	}
}

#[derive(Clone, Copy, Debug)]
pub enum Reply {
	Pending,
	Authorized,
	Failure(u16),
}

/// Status check observed by the scripted API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fetch {
	pub config_id: ConfigId,
	pub at: Instant,
}

/// Configuration API double that answers status checks from a script.
///
/// Once the script runs dry every further check reports a pending record.
#[derive(Debug, Default)]
pub struct ScriptedConfigurationApi {
	script: Mutex<VecDeque<Step>>,
	fetches: Mutex<Vec<Fetch>>,
	creates: Mutex<Vec<CanvasConfigPayload>>,
	updates: Mutex<Vec<(ConfigId, CanvasConfigPayload)>>,
	write_failure: Mutex<Option<u16>>,
	next_id: Mutex<u64>,
}
impl ScriptedConfigurationApi {
	pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
		Arc::new(Self {
			script: Mutex::new(steps.into_iter().collect()),
			next_id: Mutex::new(100),
			..Self::default()
		})
	}

	pub fn fail_writes(&self, status: u16) {
		*self.write_failure.lock() = Some(status);
	}

	pub fn fetches(&self) -> Vec<Fetch> {
		self.fetches.lock().clone()
	}

	pub fn fetch_count(&self) -> usize {
		self.fetches.lock().len()
	}

	/// Offsets of every status check from `start`.
	pub fn fetch_offsets(&self, start: Instant) -> Vec<Duration> {
		self.fetches.lock().iter().map(|fetch| fetch.at - start).collect()
	}

	pub fn creates(&self) -> Vec<CanvasConfigPayload> {
		self.creates.lock().clone()
	}

	pub fn updates(&self) -> Vec<(ConfigId, CanvasConfigPayload)> {
		self.updates.lock().clone()
	}

	fn write_result(&self) -> Result<(), ApiError> {
		match *self.write_failure.lock() {
			Some(status) => Err(ApiError::status("canvas_configuration", status, "write rejected")),
			None => Ok(()),
		}
	}
}
impl ConfigurationApi for ScriptedConfigurationApi {
	fn create_configuration<'a>(
		&'a self,
		payload: &'a CanvasConfigPayload,
	) -> ApiFuture<'a, ConfigId> {
		Box::pin(async move {
			self.write_result()?;
			self.creates.lock().push(payload.clone());

			let mut next_id = self.next_id.lock();
			let id = ConfigId(*next_id);

			*next_id += 1;

			Ok(id)
		})
	}

	fn update_configuration<'a>(
		&'a self,
		id: ConfigId,
		payload: &'a CanvasConfigPayload,
	) -> ApiFuture<'a, ConfigId> {
		Box::pin(async move {
			self.write_result()?;
			self.updates.lock().push((id, payload.clone()));

			Ok(id)
		})
	}

	fn fetch_configuration_status(&self, id: ConfigId) -> ApiFuture<'_, ConfigurationStatus> {
		Box::pin(async move {
			self.fetches.lock().push(Fetch { config_id: id, at: Instant::now() });

			let step = self.script.lock().pop_front().unwrap_or_else(Step::pending);

			if !step.delay.is_zero() {
				tokio::time::sleep(step.delay).await;
			}

			match step.reply {
				Reply::Pending => Ok(ConfigurationStatus { id, credential_present: false }),
				Reply::Authorized => Ok(ConfigurationStatus { id, credential_present: true }),
				Reply::Failure(status) =>
					Err(ApiError::status("canvas_configuration", status, "status check failed")),
			}
		})
	}
}

/// Launcher double that records every URL and optionally refuses to open it.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
	urls: Mutex<Vec<Url>>,
	blocked: bool,
}
impl RecordingLauncher {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn blocked() -> Arc<Self> {
		Arc::new(Self { blocked: true, ..Self::default() })
	}

	pub fn urls(&self) -> Vec<Url> {
		self.urls.lock().clone()
	}
}
impl AuthorizationLauncher for RecordingLauncher {
	fn launch(&self, url: &Url) -> io::Result<()> {
		self.urls.lock().push(url.clone());

		if self.blocked { Err(io::Error::other("pop-up blocked")) } else { Ok(()) }
	}
}

/// Subsidy API double with canned answers and a call log.
#[derive(Debug)]
pub struct ScriptedSubsidyApi {
	pub coupon_orders: Result<usize, u16>,
	pub subscriptions: Result<usize, u16>,
	gets: Mutex<VecDeque<Result<SubsidyRequestConfiguration, u16>>>,
	get_calls: Mutex<Vec<bool>>,
	create_result: Mutex<Option<u16>>,
	creates: Mutex<Vec<Option<SubsidyType>>>,
	update_result: Mutex<Option<u16>>,
	updates: Mutex<Vec<SubsidyConfigurationUpdate>>,
}
impl ScriptedSubsidyApi {
	pub fn new(
		coupon_orders: Result<usize, u16>,
		subscriptions: Result<usize, u16>,
		gets: impl IntoIterator<Item = Result<SubsidyRequestConfiguration, u16>>,
	) -> Self {
		Self {
			coupon_orders,
			subscriptions,
			gets: Mutex::new(gets.into_iter().collect()),
			get_calls: Mutex::default(),
			create_result: Mutex::default(),
			creates: Mutex::default(),
			update_result: Mutex::default(),
			updates: Mutex::default(),
		}
	}

	pub fn fail_create(&self, status: u16) {
		*self.create_result.lock() = Some(status);
	}

	pub fn fail_update(&self, status: u16) {
		*self.update_result.lock() = Some(status);
	}

	/// `clear_cache` flag of every read, in order.
	pub fn get_calls(&self) -> Vec<bool> {
		self.get_calls.lock().clone()
	}

	pub fn creates(&self) -> Vec<Option<SubsidyType>> {
		self.creates.lock().clone()
	}

	pub fn updates(&self) -> Vec<SubsidyConfigurationUpdate> {
		self.updates.lock().clone()
	}
}
impl SubsidyApi for ScriptedSubsidyApi {
	fn fetch_coupon_order_count<'a>(&'a self, _: &'a EnterpriseId) -> ApiFuture<'a, usize> {
		Box::pin(async move {
			self.coupon_orders.map_err(|status| ApiError::status("coupon_orders", status, "down"))
		})
	}

	fn fetch_subscription_count<'a>(&'a self, _: &'a EnterpriseId) -> ApiFuture<'a, usize> {
		Box::pin(async move {
			self.subscriptions.map_err(|status| ApiError::status("subscriptions", status, "down"))
		})
	}

	fn get_subsidy_request_configuration<'a>(
		&'a self,
		_: &'a EnterpriseId,
		clear_cache: bool,
	) -> ApiFuture<'a, SubsidyRequestConfiguration> {
		Box::pin(async move {
			self.get_calls.lock().push(clear_cache);

			match self.gets.lock().pop_front() {
				Some(Ok(configuration)) => Ok(configuration),
				Some(Err(status)) =>
					Err(ApiError::status("subsidy_request_configuration", status, "read failed")),
				None => Err(ApiError::status("subsidy_request_configuration", 404, "not found")),
			}
		})
	}

	fn create_subsidy_request_configuration<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
		subsidy_type: Option<SubsidyType>,
	) -> ApiFuture<'a, SubsidyRequestConfiguration> {
		Box::pin(async move {
			if let Some(status) = *self.create_result.lock() {
				return Err(ApiError::status(
					"subsidy_request_configuration",
					status,
					"create failed",
				));
			}

			self.creates.lock().push(subsidy_type);

			Ok(SubsidyRequestConfiguration {
				enterprise_customer_uuid: Some(enterprise.to_string()),
				subsidy_type,
				subsidy_requests_enabled: false,
			})
		})
	}

	fn update_subsidy_request_configuration<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
		update: &'a SubsidyConfigurationUpdate,
	) -> ApiFuture<'a, SubsidyRequestConfiguration> {
		Box::pin(async move {
			if let Some(status) = *self.update_result.lock() {
				return Err(ApiError::status(
					"subsidy_request_configuration",
					status,
					"update failed",
				));
			}

			self.updates.lock().push(*update);

			Ok(SubsidyRequestConfiguration {
				enterprise_customer_uuid: Some(enterprise.to_string()),
				subsidy_type: update.subsidy_type,
				subsidy_requests_enabled: update.subsidy_requests_enabled,
			})
		})
	}
}
