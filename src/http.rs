//! Collaborator contracts for the portal's backend services plus reqwest-backed adapters.
//!
//! Flows only ever see [`ConfigurationApi`] and [`SubsidyApi`], so tests can inject scripted
//! doubles and deployments can swap transports without touching coordinator logic. With the
//! `reqwest` feature the crate ships [`ReqwestConfigurationApi`] and [`ReqwestSubsidyApi`],
//! both built on [`ReqwestHttpClient`], which keeps request encoding, status classification, and
//! path-aware JSON decoding in one place.

// self
use crate::{
	_prelude::*,
	auth::{ConfigId, EnterpriseId},
	flows::{SubsidyConfigurationUpdate, SubsidyRequestConfiguration, SubsidyType},
	lms::{CanvasConfigPayload, ConfigurationStatus},
};
#[cfg(feature = "reqwest")]
use crate::{
	config::{PortalConfig, join_path},
	error::ConfigError,
	lms::CanvasConfigRecord,
};
#[cfg(feature = "reqwest")]
use reqwest::{
	Method, RequestBuilder,
	header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE},
};
#[cfg(feature = "reqwest")] use serde::de::DeserializeOwned;

/// Boxed future returned by collaborator calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + 'a + Send>>;

/// LMS integrated-channels API as seen by the authorization flow.
pub trait ConfigurationApi
where
	Self: Send + Sync,
{
	/// Creates a configuration record and returns its identifier.
	fn create_configuration<'a>(
		&'a self,
		payload: &'a CanvasConfigPayload,
	) -> ApiFuture<'a, ConfigId>;

	/// Replaces an existing configuration record and returns its identifier.
	fn update_configuration<'a>(
		&'a self,
		id: ConfigId,
		payload: &'a CanvasConfigPayload,
	) -> ApiFuture<'a, ConfigId>;

	/// Reads the record's authorization status; this is the polling target.
	fn fetch_configuration_status(&self, id: ConfigId) -> ApiFuture<'_, ConfigurationStatus>;
}

/// Enterprise-access, ecommerce, and license-manager calls used by the subsidy bootstrap.
pub trait SubsidyApi
where
	Self: Send + Sync,
{
	/// Number of coupon orders the enterprise holds.
	fn fetch_coupon_order_count<'a>(&'a self, enterprise: &'a EnterpriseId) -> ApiFuture<'a, usize>;

	/// Number of subscription plans the enterprise holds.
	fn fetch_subscription_count<'a>(&'a self, enterprise: &'a EnterpriseId) -> ApiFuture<'a, usize>;

	/// Reads the enterprise's subsidy request configuration.
	///
	/// `clear_cache` asks intermediaries for a fresh copy instead of a cached one.
	fn get_subsidy_request_configuration<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
		clear_cache: bool,
	) -> ApiFuture<'a, SubsidyRequestConfiguration>;

	/// Creates the enterprise's subsidy request configuration.
	fn create_subsidy_request_configuration<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
		subsidy_type: Option<SubsidyType>,
	) -> ApiFuture<'a, SubsidyRequestConfiguration>;

	/// Partially updates the enterprise's subsidy request configuration.
	fn update_subsidy_request_configuration<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
		update: &'a SubsidyConfigurationUpdate,
	) -> ApiFuture<'a, SubsidyRequestConfiguration>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with a per-request timeout.
	pub fn with_timeout(timeout: Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self(client))
	}

	fn request(&self, method: Method, url: Url) -> RequestBuilder {
		self.0.request(method, url).header(ACCEPT, "application/json")
	}

	fn json_request<B>(
		&self,
		endpoint: &'static str,
		method: Method,
		url: Url,
		body: &B,
	) -> Result<RequestBuilder, ApiError>
	where
		B: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body).map_err(|e| ApiError::request(endpoint, e))?;

		Ok(self.request(method, url).header(CONTENT_TYPE, "application/json").body(bytes))
	}

	async fn send<T>(&self, endpoint: &'static str, request: RequestBuilder) -> Result<T, ApiError>
	where
		T: DeserializeOwned,
	{
		let response = request.send().await.map_err(|e| ApiError::network(endpoint, e))?;
		let status = response.status();
		let bytes = response.bytes().await.map_err(|e| ApiError::network(endpoint, e))?;

		if !status.is_success() {
			let body = String::from_utf8_lossy(&bytes);

			return Err(ApiError::status(endpoint, status.as_u16(), &body));
		}

		let mut de = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ApiError::Parse { endpoint, source })
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

/// Canvas configuration endpoints of the LMS integrated-channels API.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestConfigurationApi {
	http: ReqwestHttpClient,
	collection_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestConfigurationApi {
	const ENDPOINT: &'static str = "canvas_configuration";
	const COLLECTION_PATH: &'static str = "integrated_channels/api/v1/canvas/configuration/";

	/// Builds an adapter rooted at `lms_base_url`.
	pub fn new(http: ReqwestHttpClient, lms_base_url: &Url) -> Result<Self, ConfigError> {
		let collection_url = join_path(lms_base_url, Self::COLLECTION_PATH, "lms_base_url")?;

		Ok(Self { http, collection_url })
	}

	/// Builds an adapter from the portal configuration.
	pub fn from_config(
		http: ReqwestHttpClient,
		config: &PortalConfig,
	) -> Result<Self, ConfigError> {
		Self::new(http, &config.lms_base_url)
	}

	fn record_url(&self, id: ConfigId) -> Result<Url, ApiError> {
		join_path(&self.collection_url, &format!("{id}/"), "lms_base_url")
			.map_err(|e| ApiError::request(Self::ENDPOINT, e))
	}
}
#[cfg(feature = "reqwest")]
impl ConfigurationApi for ReqwestConfigurationApi {
	fn create_configuration<'a>(
		&'a self,
		payload: &'a CanvasConfigPayload,
	) -> ApiFuture<'a, ConfigId> {
		Box::pin(async move {
			let request = self.http.json_request(
				Self::ENDPOINT,
				Method::POST,
				self.collection_url.clone(),
				payload,
			)?;
			let record: CanvasConfigRecord = self.http.send(Self::ENDPOINT, request).await?;

			Ok(record.id)
		})
	}

	fn update_configuration<'a>(
		&'a self,
		id: ConfigId,
		payload: &'a CanvasConfigPayload,
	) -> ApiFuture<'a, ConfigId> {
		Box::pin(async move {
			let request =
				self.http.json_request(Self::ENDPOINT, Method::PUT, self.record_url(id)?, payload)?;
			let record: CanvasConfigRecord = self.http.send(Self::ENDPOINT, request).await?;

			Ok(record.id)
		})
	}

	fn fetch_configuration_status(&self, id: ConfigId) -> ApiFuture<'_, ConfigurationStatus> {
		Box::pin(async move {
			let request = self.http.request(Method::GET, self.record_url(id)?);
			let record: CanvasConfigRecord = self.http.send(Self::ENDPOINT, request).await?;

			Ok(record.status())
		})
	}
}

/// Subsidy-related endpoints spread across enterprise-access, ecommerce, and license-manager.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestSubsidyApi {
	http: ReqwestHttpClient,
	customer_configurations_url: Url,
	ecommerce_base_url: Url,
	subscriptions_url: Url,
}
#[cfg(feature = "reqwest")]
impl ReqwestSubsidyApi {
	const CONFIGURATION_ENDPOINT: &'static str = "subsidy_request_configuration";
	const COUPONS_ENDPOINT: &'static str = "coupon_orders";
	const SUBSCRIPTIONS_ENDPOINT: &'static str = "subscriptions";

	/// Builds an adapter from the portal configuration.
	pub fn from_config(
		http: ReqwestHttpClient,
		config: &PortalConfig,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			http,
			customer_configurations_url: join_path(
				&config.enterprise_access_base_url,
				"api/v1/customer-configurations/",
				"enterprise_access_base_url",
			)?,
			ecommerce_base_url: config.ecommerce_base_url.clone(),
			subscriptions_url: join_path(
				&config.license_manager_base_url,
				"api/v1/subscriptions/",
				"license_manager_base_url",
			)?,
		})
	}

	fn configuration_url(&self, enterprise: &EnterpriseId) -> Result<Url, ApiError> {
		join_path(&self.customer_configurations_url, &format!("{enterprise}/"), "enterprise_id")
			.map_err(|e| ApiError::request(Self::CONFIGURATION_ENDPOINT, e))
	}
}
#[cfg(feature = "reqwest")]
impl SubsidyApi for ReqwestSubsidyApi {
	fn fetch_coupon_order_count<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
	) -> ApiFuture<'a, usize> {
		Box::pin(async move {
			let url = join_path(
				&self.ecommerce_base_url,
				&format!("api/v2/enterprise/coupons/{enterprise}/overview/"),
				"ecommerce_base_url",
			)
			.map_err(|e| ApiError::request(Self::COUPONS_ENDPOINT, e))?;
			let page: ResultsPage =
				self.http.send(Self::COUPONS_ENDPOINT, self.http.request(Method::GET, url)).await?;

			Ok(page.results.len())
		})
	}

	fn fetch_subscription_count<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
	) -> ApiFuture<'a, usize> {
		Box::pin(async move {
			let mut url = self.subscriptions_url.clone();

			url.query_pairs_mut().append_pair("enterprise_customer_uuid", enterprise);

			let page: ResultsPage = self
				.http
				.send(Self::SUBSCRIPTIONS_ENDPOINT, self.http.request(Method::GET, url))
				.await?;

			Ok(page.results.len())
		})
	}

	fn get_subsidy_request_configuration<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
		clear_cache: bool,
	) -> ApiFuture<'a, SubsidyRequestConfiguration> {
		Box::pin(async move {
			let mut request = self.http.request(Method::GET, self.configuration_url(enterprise)?);

			if clear_cache {
				request = request.header(CACHE_CONTROL, "no-cache");
			}

			self.http.send(Self::CONFIGURATION_ENDPOINT, request).await
		})
	}

	fn create_subsidy_request_configuration<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
		subsidy_type: Option<SubsidyType>,
	) -> ApiFuture<'a, SubsidyRequestConfiguration> {
		#[derive(Serialize)]
		struct CreateBody<'b> {
			enterprise_customer_uuid: &'b EnterpriseId,
			subsidy_type: Option<SubsidyType>,
		}

		Box::pin(async move {
			let body = CreateBody { enterprise_customer_uuid: enterprise, subsidy_type };
			let request = self.http.json_request(
				Self::CONFIGURATION_ENDPOINT,
				Method::POST,
				self.customer_configurations_url.clone(),
				&body,
			)?;

			self.http.send(Self::CONFIGURATION_ENDPOINT, request).await
		})
	}

	fn update_subsidy_request_configuration<'a>(
		&'a self,
		enterprise: &'a EnterpriseId,
		update: &'a SubsidyConfigurationUpdate,
	) -> ApiFuture<'a, SubsidyRequestConfiguration> {
		Box::pin(async move {
			let request = self.http.json_request(
				Self::CONFIGURATION_ENDPOINT,
				Method::PATCH,
				self.configuration_url(enterprise)?,
				update,
			)?;

			self.http.send(Self::CONFIGURATION_ENDPOINT, request).await
		})
	}
}

#[cfg(feature = "reqwest")]
#[derive(Deserialize)]
struct ResultsPage {
	#[serde(default)]
	results: Vec<serde_json::Value>,
}
