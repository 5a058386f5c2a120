//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{PayGateError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_storage_config(&settings.storage)?;
    validate_spam_config(&settings.spam)?;
    validate_plans_config(&settings.plans)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(PayGateError::Config("Bot token is required".to_string()));
    }

    if config.admin_id == 0 {
        return Err(PayGateError::Config(
            "Admin ID must be configured".to_string(),
        ));
    }

    Ok(())
}

/// Validate durable store configuration
fn validate_storage_config(config: &super::StorageConfig) -> Result<()> {
    if config.data_dir.is_empty() {
        return Err(PayGateError::Config(
            "Storage data directory is required".to_string(),
        ));
    }

    if config.flush_interval_seconds == 0 {
        return Err(PayGateError::Config(
            "Flush interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate spam protection configuration
fn validate_spam_config(config: &super::SpamConfig) -> Result<()> {
    if config.max_requests == 0 {
        return Err(PayGateError::Config(
            "Max requests must be greater than 0".to_string(),
        ));
    }

    if config.window_seconds == 0 {
        return Err(PayGateError::Config(
            "Spam window must be greater than 0".to_string(),
        ));
    }

    // Automatic escalation has exactly two levels
    if config.block_durations.len() != 2 {
        return Err(PayGateError::Config(
            "Exactly two automatic block durations are required".to_string(),
        ));
    }

    Ok(())
}

/// Validate plan catalogue configuration
fn validate_plans_config(config: &super::PlansConfig) -> Result<()> {
    for plan in [&config.monthly, &config.lifetime] {
        if plan.name.is_empty() {
            return Err(PayGateError::Config("Plan name is required".to_string()));
        }
        if plan.amount == 0 {
            return Err(PayGateError::Config(
                "Plan amount must be greater than 0".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(PayGateError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(PayGateError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
