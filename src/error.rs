//! Coordinator-level error types shared across flows, collaborators, and configuration.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or form validation problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A backend service could not complete the request (network, non-2xx, malformed body).
	#[error("Remote service is unavailable: {0}")]
	RemoteUnavailable(
		#[from]
		#[source]
		ApiError,
	),

	/// The authorization deadline elapsed before the provider confirmed the integration.
	#[error(
		"We were unable to confirm your authorization within {}s. Please return to your LMS to authorize edX as an integration.",
		.timeout.as_secs()
	)]
	TimeoutExceeded {
		/// Deadline that was armed for the session.
		timeout: Duration,
	},
}

/// Configuration and validation failures raised before any remote call is made.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configured URL cannot be parsed.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which setting or form field carried the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured URL uses an unsupported scheme.
	#[error("The {field} URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// Which setting or form field carried the URL.
		field: &'static str,
		/// URL that failed validation.
		url: String,
	},
	/// Polling durations must be positive.
	#[error("The {field} duration must be positive.")]
	NonPositiveDuration {
		/// Name of the duration setting.
		field: &'static str,
	},
	/// Duration is too large to schedule from the current instant.
	#[error("The {field} duration is too large to schedule.")]
	DurationOverflow {
		/// Name of the duration setting.
		field: &'static str,
	},
	/// Configuration document could not be parsed.
	#[error("Configuration document is malformed.")]
	Parse(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Form contents failed validation.
	#[error(transparent)]
	InvalidField(#[from] crate::lms::FieldError),
	/// Form is missing required values.
	#[error("Every configuration field must be filled in before {action}.")]
	IncompleteForm {
		/// Action that was refused (authorization or submission).
		action: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures reported by the remote collaborators (LMS, enterprise-access, ecommerce,
/// license-manager).
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request could not be assembled locally, so nothing was sent.
	#[error("Could not build the {endpoint} request.")]
	Request {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// URL or body encoding failure.
		#[source]
		source: BoxError,
	},
	/// Service answered with a non-success status.
	#[error("{endpoint} returned HTTP {status}: {message}.")]
	Status {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		message: String,
	},
	/// Service responded with JSON that did not match the expected shape.
	#[error("{endpoint} returned malformed JSON.")]
	Parse {
		/// Logical endpoint label.
		endpoint: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ApiError {
	const MESSAGE_PREVIEW_LIMIT: usize = 256;

	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}

	/// Wraps a failure to build the request URL or body.
	pub fn request(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Request { endpoint, source: Box::new(src) }
	}

	/// Builds a status error, truncating the body preview.
	pub fn status(endpoint: &'static str, status: u16, body: &str) -> Self {
		let message = body.trim().chars().take(Self::MESSAGE_PREVIEW_LIMIT).collect();

		Self::Status { endpoint, status, message }
	}

	/// HTTP status attached to the failure, when one was received.
	pub fn http_status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Whether the service reported the resource as missing.
	pub fn is_not_found(&self) -> bool {
		self.http_status() == Some(404)
	}
}

/// Clonable, timestamped snapshot of a failure kept on session state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
	/// Rendered error message.
	pub message: String,
	/// HTTP status code, when available.
	pub status: Option<u16>,
	/// Instant the failure was observed.
	pub observed_at: OffsetDateTime,
}
impl ErrorDescriptor {
	/// Captures the given API failure at the current instant.
	pub fn capture(err: &ApiError) -> Self {
		Self {
			message: err.to_string(),
			status: err.http_status(),
			observed_at: OffsetDateTime::now_utc(),
		}
	}
}
