//! Canvas LMS integration model: wire records, field validation, and form state.
//!
//! `record` holds the JSON shapes exchanged with the integrated-channels API, `field` maps the
//! closed set of form fields to their validators, and `form` tracks what the administrator has
//! typed so flows can decide whether to create, update, or reuse a remote record.

pub mod field;
pub mod form;
pub mod record;

pub use field::*;
pub use form::*;
pub use record::*;
