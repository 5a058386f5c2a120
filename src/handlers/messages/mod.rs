//! Message handlers module
//!
//! Handles incoming photo messages carrying payment screenshots. Photos
//! from identities without an open purchase intent are ignored silently,
//! as is every other message kind.

use chrono::Utc;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Request,
    requests::Requester,
    types::{Message, ParseMode},
    Bot,
};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::handlers::admission_passed;
use crate::models::MessageRef;
use crate::services::ServiceFactory;
use crate::utils::errors::{PayGateError, Result};
use crate::utils::logging::log_user_action;

/// Handle incoming non-command messages
pub async fn handle_message(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    let user = match msg.from.as_ref() {
        Some(user) => user,
        None => return Ok(()),
    };
    let user_id = user.id.0 as i64;

    // Only private-chat photos can be payment evidence
    if !msg.chat.id.is_user() {
        return Ok(());
    }
    let photos = match msg.photo() {
        Some(photos) if !photos.is_empty() => photos,
        _ => return Ok(()),
    };

    // Photos without an open intent are not evidence
    if services.store.pending.get(user_id).await.is_none() {
        debug!(user_id = user_id, "Photo without pending verification, ignored");
        return Ok(());
    }

    if !admission_passed(&bot, msg.chat.id, user_id, &services).await {
        return Ok(());
    }
    let now = Utc::now();
    services.abuse.reset(user_id, now);

    // Largest rendition carries the readable screenshot
    let file_id = photos[photos.len() - 1].file.id.to_string();
    let origin = MessageRef {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
    };

    match services
        .verification
        .submit_evidence(user_id, origin, file_id, now)
        .await
    {
        Ok(_) => {
            log_user_action(user_id, "screenshot_submitted", None);
            bot.send_message(
                msg.chat.id,
                "✅ <b>Screenshot received!</b>\n\n\
                 Admin will verify your payment soon.\n\
                 You'll receive unique join link within few minutes.\n\n\
                 ⏳ <i>Thank you for your patience!</i>",
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        Err(PayGateError::NoPendingIntent { .. }) => {
            // Intent vanished between the check and the submit; nothing to do
        }
        Err(PayGateError::Conflict { .. }) => {
            bot.send_message(msg.chat.id, "⏳ Still processing your previous screenshot...")
                .send()
                .await?;
        }
        Err(e) => {
            warn!(user_id = user_id, error = %e, "Evidence forward failed");
            bot.send_message(
                msg.chat.id,
                format!(
                    "❌ Error sending screenshot. Please try again or contact @{}",
                    settings.bot.support_username
                ),
            )
            .send()
            .await?;
        }
    }

    Ok(())
}
