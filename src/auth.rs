//! Identifiers and redacted secrets shared by the LMS integration domain.

pub mod id;
pub mod secret;

pub use id::*;
pub use secret::*;
