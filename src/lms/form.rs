//! Local Canvas configuration form state and the save/authorize decisions derived from it.

// self
use crate::{
	_prelude::*,
	auth::{ConfigId, EnterpriseId, Secret},
	error::ConfigError,
	lms::{CanvasConfigPayload, CanvasConfigRecord, ConfigField, FieldError},
};

/// What the flow must do with the remote record before authorization can start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordAction {
	/// No record exists yet; create one.
	Create,
	/// A record exists and the local copy changed; push the update.
	Update(ConfigId),
	/// A record exists and nothing changed; use it as is.
	Reuse(ConfigId),
}

/// What the cancel button should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelDecision {
	/// Unsaved edits exist; ask before discarding them.
	ConfirmDiscard,
	/// Nothing to lose; close the form.
	Close,
}

/// Local state of the Canvas configuration form.
#[derive(Clone, Debug, Default)]
pub struct CanvasConfigForm {
	display_name: String,
	client_id: String,
	client_secret: Secret,
	canvas_account_id: String,
	canvas_base_url: String,
	errors: Vec<(ConfigField, FieldError)>,
	edited: bool,
	existing: Option<CanvasConfigRecord>,
}
impl CanvasConfigForm {
	/// Blank form for a brand-new integration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Form pre-filled from an existing remote record.
	pub fn from_existing(record: CanvasConfigRecord) -> Self {
		let mut form = Self {
			display_name: record.display_name.clone().unwrap_or_default(),
			client_id: record.client_id.clone().unwrap_or_default(),
			client_secret: record.client_secret.clone().unwrap_or_default(),
			canvas_account_id: record
				.canvas_account_id
				.map(|id| id.to_string())
				.unwrap_or_default(),
			canvas_base_url: record.canvas_base_url.clone().unwrap_or_default(),
			existing: Some(record),
			..Self::default()
		};

		for field in ConfigField::ALL {
			form.revalidate(field);
		}

		form
	}

	/// Records a new value for `field`, marking the form as edited.
	///
	/// The value is kept even when it fails validation so the administrator can keep typing;
	/// the error is returned and remembered until the field becomes valid again.
	pub fn set_field(
		&mut self,
		field: ConfigField,
		value: impl Into<String>,
	) -> Result<(), FieldError> {
		let value = value.into();

		match field {
			ConfigField::DisplayName => self.display_name = value,
			ConfigField::ClientId => self.client_id = value,
			ConfigField::ClientSecret => self.client_secret = Secret::new(value),
			ConfigField::CanvasAccountId => self.canvas_account_id = value,
			ConfigField::CanvasBaseUrl => self.canvas_base_url = value,
		}

		self.edited = true;

		self.revalidate(field)
	}

	/// Current raw value of `field`.
	pub fn value(&self, field: ConfigField) -> &str {
		match field {
			ConfigField::DisplayName => &self.display_name,
			ConfigField::ClientId => &self.client_id,
			ConfigField::ClientSecret => self.client_secret.expose(),
			ConfigField::CanvasAccountId => &self.canvas_account_id,
			ConfigField::CanvasBaseUrl => &self.canvas_base_url,
		}
	}

	/// Outstanding validation error for `field`, if any.
	pub fn error(&self, field: ConfigField) -> Option<&FieldError> {
		self.errors.iter().find(|(f, _)| *f == field).map(|(_, err)| err)
	}

	/// Whether any field changed since the form was opened.
	pub fn is_edited(&self) -> bool {
		self.edited
	}

	/// Remote record the form was opened from.
	pub fn existing(&self) -> Option<&CanvasConfigRecord> {
		self.existing.as_ref()
	}

	/// Whether the remote record was already authorized before the form was opened.
	pub fn existing_authorized(&self) -> bool {
		self.existing.as_ref().is_some_and(CanvasConfigRecord::credential_present)
	}

	/// Every field carries a value.
	pub fn is_complete(&self) -> bool {
		ConfigField::ALL.iter().all(|field| !self.value(*field).trim().is_empty())
	}

	/// No field has an outstanding validation error.
	pub fn is_valid(&self) -> bool {
		self.errors.is_empty()
	}

	/// The form may kick off an authorization attempt.
	pub fn can_authorize(&self) -> bool {
		self.is_complete() && self.is_valid()
	}

	/// The form may be saved.
	pub fn can_submit(&self) -> bool {
		self.is_complete() && self.is_valid()
	}

	/// Decides what the cancel button should do.
	pub fn cancel_decision(&self) -> CancelDecision {
		if self.edited { CancelDecision::ConfirmDiscard } else { CancelDecision::Close }
	}

	/// Decides how to obtain a record id before authorizing.
	///
	/// `known_id` is the record created by an earlier attempt in the same form session, so a
	/// resubmission updates that record instead of creating a duplicate.
	pub fn authorization_action(&self, known_id: Option<ConfigId>) -> RecordAction {
		match (&self.existing, known_id) {
			(Some(existing), _) if self.edited => RecordAction::Update(existing.id),
			(Some(existing), _) => RecordAction::Reuse(existing.id),
			(None, Some(id)) => RecordAction::Update(id),
			(None, None) => RecordAction::Create,
		}
	}

	/// Decides how to persist the form on submit.
	pub fn save_action(&self, known_id: Option<ConfigId>) -> RecordAction {
		match self.existing.as_ref().map(|existing| existing.id).or(known_id) {
			Some(id) => RecordAction::Update(id),
			None => RecordAction::Create,
		}
	}

	/// Builds the wire payload, refusing incomplete or invalid forms.
	pub fn to_payload(
		&self,
		enterprise: &EnterpriseId,
		action: &'static str,
	) -> Result<CanvasConfigPayload, ConfigError> {
		if !self.is_complete() {
			return Err(ConfigError::IncompleteForm { action });
		}
		if let Some((_, err)) = self.errors.first() {
			return Err(err.clone().into());
		}

		let canvas_account_id = self
			.canvas_account_id
			.trim()
			.parse()
			.map_err(|_| FieldError::NotNumeric { field: ConfigField::CanvasAccountId })?;

		Ok(CanvasConfigPayload {
			display_name: self.display_name.clone(),
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			canvas_account_id,
			canvas_base_url: self.canvas_base_url.clone(),
			active: false,
			enterprise_customer: enterprise.clone(),
		})
	}

	fn revalidate(&mut self, field: ConfigField) -> Result<(), FieldError> {
		self.errors.retain(|(f, _)| *f != field);

		let result = field.validate(self.value(field));

		if let Err(err) = &result {
			self.errors.push((field, err.clone()));
		}

		result
	}
}
