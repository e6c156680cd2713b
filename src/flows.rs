//! Flow orchestrators built on the collaborator traits in [`crate::http`].

pub mod authorization;
pub mod canvas;
pub mod subsidy;

pub use authorization::*;
pub use canvas::*;
pub use subsidy::*;
