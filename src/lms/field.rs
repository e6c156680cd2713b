//! Closed set of Canvas form fields and their validators.

// self
use crate::_prelude::*;

const DISPLAY_NAME_MAX_CHARS: usize = 20;

/// Closed set of editable Canvas configuration fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
	/// Administrator-chosen label for the integration.
	DisplayName,
	/// Canvas developer key identifier.
	ClientId,
	/// Canvas developer key secret.
	ClientSecret,
	/// Numeric Canvas account the integration is attached to.
	CanvasAccountId,
	/// Root URL of the Canvas instance.
	CanvasBaseUrl,
}
impl ConfigField {
	/// Every field, in form order.
	pub const ALL: [ConfigField; 5] = [
		ConfigField::DisplayName,
		ConfigField::ClientId,
		ConfigField::ClientSecret,
		ConfigField::CanvasAccountId,
		ConfigField::CanvasBaseUrl,
	];

	/// Human-facing label.
	pub const fn label(self) -> &'static str {
		match self {
			ConfigField::DisplayName => "Display Name",
			ConfigField::ClientId => "API Client ID",
			ConfigField::ClientSecret => "API Client Secret",
			ConfigField::CanvasAccountId => "Canvas Account Number",
			ConfigField::CanvasBaseUrl => "Canvas Base URL",
		}
	}

	/// Validates raw input for this field.
	///
	/// Empty input is always accepted here; completeness is checked separately when the form
	/// is submitted.
	pub fn validate(self, input: &str) -> Result<(), FieldError> {
		match self {
			ConfigField::DisplayName =>
				if input.chars().count() <= DISPLAY_NAME_MAX_CHARS {
					Ok(())
				} else {
					Err(FieldError::NameTooLong { max: DISPLAY_NAME_MAX_CHARS })
				},
			ConfigField::CanvasAccountId =>
				if input.chars().all(|c| c.is_ascii_digit()) {
					Ok(())
				} else {
					Err(FieldError::NotNumeric { field: self })
				},
			ConfigField::CanvasBaseUrl =>
				if input.is_empty() || is_web_url(input) {
					Ok(())
				} else {
					Err(FieldError::InvalidLink)
				},
			ConfigField::ClientId | ConfigField::ClientSecret => Ok(()),
		}
	}
}
impl Display for ConfigField {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.label())
	}
}

/// Validation failure for a single form field.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum FieldError {
	/// Display name exceeds the allowed length.
	#[error("Display name should be {max} characters or less.")]
	NameTooLong {
		/// Maximum permitted character count.
		max: usize,
	},
	/// URL is not an absolute http(s) link.
	#[error("Link must be properly formatted and start with http or https.")]
	InvalidLink,
	/// Field only accepts digits.
	#[error("{field} must be a number.")]
	NotNumeric {
		/// Offending field.
		field: ConfigField,
	},
}

pub(crate) fn is_web_url(input: &str) -> bool {
	Url::parse(input)
		.map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
		.unwrap_or(false)
}
