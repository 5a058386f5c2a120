//! Bot handlers module
//!
//! This module contains all Telegram bot handlers organized by type:
//! - Command handlers for bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for payment screenshots

pub mod callbacks;
pub mod commands;
pub mod messages;

use teloxide::{
    payloads::SendMessageSetters,
    prelude::Request,
    requests::Requester,
    types::{ChatId, ParseMode},
    Bot,
};
use tracing::warn;

use crate::services::{Decision, ServiceFactory};

/// Run the admission gate for a user-initiated action.
///
/// Sends the block notice (best-effort) and returns false when the identity
/// is blocked; the calling handler must stop there.
pub(crate) async fn admission_passed(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    services: &ServiceFactory,
) -> bool {
    match services.abuse.admit(user_id, chrono::Utc::now()).await {
        Decision::Allowed => true,
        Decision::Blocked { message } => {
            if let Err(e) = bot
                .send_message(chat_id, message)
                .parse_mode(ParseMode::Html)
                .send()
                .await
            {
                warn!(user_id = user_id, error = %e, "Failed to deliver block notice");
            }
            false
        }
    }
}
