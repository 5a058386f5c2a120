//! Notification sink implementation
//!
//! All outbound messages from the engines go through the `NotificationSink`
//! trait. Every call is best-effort and reports `Delivered` or `Suppressed`
//! instead of propagating transport failures into engine control flow; the
//! single exception is `forward_evidence`, whose failure the verification
//! workflow must surface to the caller.

use async_trait::async_trait;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Request,
    requests::Requester,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode},
    Bot,
};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::models::MessageRef;
use crate::utils::errors::Result;
use crate::utils::helpers::format_timestamp;

/// Outcome of a best-effort notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The send failed; the failure was logged and swallowed
    Suppressed,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered)
    }
}

/// Payment evidence handed to the review surface
#[derive(Debug, Clone)]
pub struct EvidenceForward {
    pub user_id: i64,
    pub username: Option<String>,
    pub plan_name: String,
    pub amount: u32,
    /// Message holding the screenshot in the user's chat
    pub origin: MessageRef,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Outbound messaging boundary used by both engines
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Best-effort message to a user.
    async fn notify_user(&self, user_id: i64, text: String) -> Delivery;

    /// Best-effort alert to the administrator.
    async fn notify_admin(&self, text: String) -> Delivery;

    /// Best-effort entry on the log channel.
    async fn log_event(&self, text: String) -> Delivery;

    /// Forward evidence plus a decision prompt to the review surface and
    /// return a reference to the prompt message. The only sink operation
    /// whose failure propagates.
    async fn forward_evidence(&self, forward: EvidenceForward) -> Result<MessageRef>;

    /// Best-effort replacement of a review message after a decision.
    async fn update_review_message(&self, message: MessageRef, text: String) -> Delivery;
}

/// Telegram-backed notification sink
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    settings: Settings,
}

impl TelegramNotifier {
    pub fn new(bot: Bot, settings: Settings) -> Self {
        Self { bot, settings }
    }

    async fn send(&self, chat_id: ChatId, text: String) -> Delivery {
        match self
            .bot
            .send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .send()
            .await
        {
            Ok(_) => {
                debug!(chat_id = ?chat_id, "Notification sent");
                Delivery::Delivered
            }
            Err(e) => {
                warn!(chat_id = ?chat_id, error = %e, "Notification suppressed");
                Delivery::Suppressed
            }
        }
    }

    fn review_keyboard(user_id: i64) -> InlineKeyboardMarkup {
        InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("✅ Verify Payment", format!("approve:{}", user_id)),
            InlineKeyboardButton::callback("❌ Reject", format!("reject:{}", user_id)),
        ]])
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn notify_user(&self, user_id: i64, text: String) -> Delivery {
        self.send(ChatId(user_id), text).await
    }

    async fn notify_admin(&self, text: String) -> Delivery {
        self.send(ChatId(self.settings.bot.admin_id), text).await
    }

    async fn log_event(&self, text: String) -> Delivery {
        self.send(ChatId(self.settings.bot.log_channel), text).await
    }

    async fn forward_evidence(&self, forward: EvidenceForward) -> Result<MessageRef> {
        let log_channel = ChatId(self.settings.bot.log_channel);

        // Put the actual screenshot in front of the reviewer first
        self.bot
            .forward_message(
                log_channel,
                ChatId(forward.origin.chat_id),
                MessageId(forward.origin.message_id),
            )
            .send()
            .await?;

        let username = forward.username.as_deref().unwrap_or("N/A");
        let caption = format!(
            "📸 <b>PAYMENT SCREENSHOT RECEIVED</b>\n\n\
             👤 User: @{}\n\
             🆔 User ID: <code>{}</code>\n\
             📅 Plan: {}\n\
             💰 Amount: ₹{}\n\
             ⏰ Time: {}\n\n\
             <b>Verify payment and send join link:</b>",
            username,
            forward.user_id,
            forward.plan_name,
            forward.amount,
            format_timestamp(forward.submitted_at),
        );

        let sent = self
            .bot
            .send_message(log_channel, caption)
            .parse_mode(ParseMode::Html)
            .reply_markup(Self::review_keyboard(forward.user_id))
            .send()
            .await?;

        Ok(MessageRef {
            chat_id: sent.chat.id.0,
            message_id: sent.id.0,
        })
    }

    async fn update_review_message(&self, message: MessageRef, text: String) -> Delivery {
        use teloxide::payloads::EditMessageTextSetters;

        match self
            .bot
            .edit_message_text(ChatId(message.chat_id), MessageId(message.message_id), text)
            .parse_mode(ParseMode::Html)
            .send()
            .await
        {
            Ok(_) => Delivery::Delivered,
            Err(e) => {
                warn!(
                    chat_id = message.chat_id,
                    message_id = message.message_id,
                    error = %e,
                    "Review message update suppressed"
                );
                Delivery::Suppressed
            }
        }
    }
}
