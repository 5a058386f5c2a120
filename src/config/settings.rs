//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

use crate::models::Plan;

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub spam: SpamConfig,
    pub plans: PlansConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    /// Identity allowed to run privileged operations
    pub admin_id: i64,
    /// Channel receiving admin prompts, decision logs and abuse alerts
    pub log_channel: i64,
    pub support_username: String,
    pub demo_channel_link: String,
    pub payment_address: String,
    pub payment_name: String,
}

/// Durable store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub data_dir: String,
    pub flush_interval_seconds: u64,
}

/// Spam protection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpamConfig {
    /// Requests inside the window that trigger a block (>= comparison)
    pub max_requests: usize,
    /// Trailing window length in seconds
    pub window_seconds: u64,
    /// Block durations for automatic levels 1 and 2, in seconds
    pub block_durations: Vec<u64>,
}

/// Plan catalogue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlansConfig {
    pub monthly: PlanConfig,
    pub lifetime: PlanConfig,
}

/// A single purchasable plan
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlanConfig {
    pub name: String,
    pub amount: u32,
    /// Gated channel this plan grants access to; 0 = not configured
    pub channel_id: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
}

impl PlansConfig {
    pub fn get(&self, plan: Plan) -> &PlanConfig {
        match plan {
            Plan::Monthly => &self.monthly,
            Plan::Lifetime => &self.lifetime,
        }
    }
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("PAYGATE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::PayGateError> {
        super::validation::validate_settings(self)
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.bot.admin_id == user_id
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                admin_id: 0,
                log_channel: 0,
                support_username: "support".to_string(),
                demo_channel_link: String::new(),
                payment_address: String::new(),
                payment_name: String::new(),
            },
            storage: StorageConfig {
                data_dir: "/data".to_string(),
                flush_interval_seconds: 30,
            },
            spam: SpamConfig {
                max_requests: 5,
                window_seconds: 10,
                block_durations: vec![300, 900],
            },
            plans: PlansConfig {
                monthly: PlanConfig {
                    name: "1 Month Premium".to_string(),
                    amount: 99,
                    channel_id: 0,
                },
                lifetime: PlanConfig {
                    name: "Lifetime Premium".to_string(),
                    amount: 149,
                    channel_id: 0,
                },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/paygate".to_string(),
            },
        }
    }
}
