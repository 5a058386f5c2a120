//! Utilities module

pub mod errors;
pub mod helpers;
pub mod logging;

pub use errors::{PayGateError, Result};
