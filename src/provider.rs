//! External OAuth provider metadata (data) and the browser hand-off (behavior).
//!
//! `descriptor` validates an LMS instance's root URL and builds its authorize URL. `launcher`
//! defines [`AuthorizationLauncher`], the seam through which the authorize URL reaches a new
//! browsing context, and [`launch_external_authorization`], which ties the two together.

pub mod descriptor;
pub mod launcher;

pub use descriptor::*;
pub use launcher::*;
