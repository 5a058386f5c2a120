//! PayGate Telegram Bot
//!
//! A Telegram bot that sells subscription access to gated premium channels.
//! This library provides the abuse-control engine, the payment verification
//! workflow, the durable entity store and the thin Telegram command surface
//! gluing them together.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{PayGateError, Result};

// Re-export main components for easy access
pub use services::ServiceFactory;
pub use storage::{FlushScheduler, JsonStore, StoreService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
