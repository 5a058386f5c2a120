//! Error handling for PayGate
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

use crate::models::Plan;

/// Main error type for PayGate application
#[derive(Error, Debug)]
pub enum PayGateError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No pending verification for user {user_id}")]
    NoPendingIntent { user_id: i64 },

    #[error("No abuse record for user {user_id}")]
    AbuseRecordNotFound { user_id: i64 },

    #[error("Another operation is in flight for user {user_id}")]
    Conflict { user_id: i64 },

    #[error("No channel configured for plan {plan}")]
    ChannelNotConfigured { plan: Plan },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PayGate operations
pub type Result<T> = std::result::Result<T, PayGateError>;
