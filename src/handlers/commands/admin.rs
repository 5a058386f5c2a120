//! Admin command handlers
//!
//! Privileged operations: manual verification, bans, listings and
//! statistics. The admin gate is the configured admin identity; these
//! commands bypass the admission check.

use chrono::{Duration, Utc};
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Request,
    requests::Requester,
    types::{ChatId, Message, ParseMode},
    Bot,
};
use tracing::{info, warn};

use crate::config::Settings;
use crate::models::VerificationState;
use crate::services::ServiceFactory;
use crate::utils::errors::{PayGateError, Result};
use crate::utils::helpers::format_remaining_short;
use crate::utils::logging::log_admin_action;

/// Telegram message length ceiling, listings are chunked below it
const MESSAGE_CHUNK_SIZE: usize = 4000;

/// Returns the admin's id, or replies with a denial and returns None.
async fn require_admin(bot: &Bot, msg: &Message, settings: &Settings) -> Result<Option<i64>> {
    let user_id = msg.from.as_ref().map(|user| user.id.0 as i64);

    match user_id {
        Some(id) if settings.is_admin(id) => Ok(Some(id)),
        _ => {
            bot.send_message(msg.chat.id, "⛔ Admin access required!")
                .send()
                .await?;
            Ok(None)
        }
    }
}

async fn send_chunked(bot: &Bot, chat_id: ChatId, text: String) -> Result<()> {
    if text.len() <= MESSAGE_CHUNK_SIZE {
        bot.send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        return Ok(());
    }

    let mut rest = text.as_str();
    while !rest.is_empty() {
        let mut end = rest.len().min(MESSAGE_CHUNK_SIZE);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (chunk, tail) = rest.split_at(end);
        bot.send_message(chat_id, chunk.to_string())
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        rest = tail;
    }

    Ok(())
}

/// Handle /ban command: `/ban [user_id] [minutes] [reason]`
pub async fn handle_ban(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    let admin_id = match require_admin(&bot, &msg, &settings).await? {
        Some(id) => id,
        None => return Ok(()),
    };

    let text = msg.text().unwrap_or_default();
    let args: Vec<&str> = text.split_whitespace().collect();

    if args.len() < 3 {
        bot.send_message(
            msg.chat.id,
            "<b>❌ Invalid Command Format</b>\n\n\
             <code>/ban [user_id] [minutes] [reason]</code>\n\n\
             <b>Examples:</b>\n\
             • <code>/ban 123456789 30 spamming</code>\n\
             • <code>/ban 987654321 1440 payment fraud</code>",
        )
        .parse_mode(ParseMode::Html)
        .send()
        .await?;
        return Ok(());
    }

    let target: i64 = match args[1].parse() {
        Ok(id) => id,
        Err(_) => {
            bot.send_message(msg.chat.id, "❌ Invalid user id. Must be a number.")
                .send()
                .await?;
            return Ok(());
        }
    };
    let minutes: i64 = match args[2].parse() {
        Ok(m) => m,
        Err(_) => {
            bot.send_message(msg.chat.id, "❌ Invalid minutes value. Must be a number.")
                .send()
                .await?;
            return Ok(());
        }
    };
    let reason = if args.len() > 3 {
        args[3..].join(" ")
    } else {
        "Admin ban".to_string()
    };

    let now = Utc::now();
    match services
        .abuse
        .ban(target, Duration::minutes(minutes), &reason, admin_id, now)
        .await
    {
        Ok(()) => {
            log_admin_action(admin_id, "ban", Some(target), Some(&reason));
            bot.send_message(
                msg.chat.id,
                format!(
                    "✅ User <code>{}</code> banned for {} minutes\nReason: {}",
                    target, minutes, reason
                ),
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;

            services
                .notifier
                .log_event(format!(
                    "🔨 <b>USER BANNED</b>\n\n\
                     👤 User ID: <code>{}</code>\n\
                     ⏰ Duration: {} minutes\n\
                     📝 Reason: {}\n\
                     👮 Banned by: <code>{}</code>",
                    target, minutes, reason, admin_id,
                ))
                .await;
        }
        Err(PayGateError::InvalidInput(reason)) => {
            bot.send_message(msg.chat.id, format!("❌ {}", reason))
                .send()
                .await?;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Handle /unban command: `/unban [user_id]`
pub async fn handle_unban(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    let admin_id = match require_admin(&bot, &msg, &settings).await? {
        Some(id) => id,
        None => return Ok(()),
    };

    let text = msg.text().unwrap_or_default();
    let args: Vec<&str> = text.split_whitespace().collect();

    let target: i64 = match args.get(1).and_then(|arg| arg.parse().ok()) {
        Some(id) => id,
        None => {
            bot.send_message(
                msg.chat.id,
                "Usage: /unban [user_id]\nExample: /unban 123456789",
            )
            .send()
            .await?;
            return Ok(());
        }
    };

    match services.abuse.unban(target).await {
        Ok(()) => {
            log_admin_action(admin_id, "unban", Some(target), None);
            bot.send_message(
                msg.chat.id,
                format!("✅ User <code>{}</code> unbanned successfully!", target),
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        Err(PayGateError::AbuseRecordNotFound { .. }) => {
            bot.send_message(
                msg.chat.id,
                format!("❌ User <code>{}</code> not found in ban list", target),
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Handle /banlist command - show all currently blocked identities
pub async fn handle_banlist(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    if require_admin(&bot, &msg, &settings).await?.is_none() {
        return Ok(());
    }

    let banned = services.abuse.list_banned(Utc::now());

    if banned.is_empty() {
        bot.send_message(msg.chat.id, "✅ <b>No banned users found!</b>")
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        return Ok(());
    }

    let mut lines = Vec::new();
    for entry in &banned {
        let username = services
            .store
            .users
            .get(entry.user_id)
            .await
            .and_then(|user| user.username)
            .unwrap_or_else(|| "Unknown".to_string());
        lines.push(format!(
            "👤 <b>ID:</b> <code>{}</code>\n\
             📛 <b>Username:</b> @{}\n\
             ⏰ <b>Time left:</b> {}\n\
             📝 <b>Reason:</b> {}\n\
             ─────────────",
            entry.user_id,
            username,
            format_remaining_short(entry.remaining),
            entry.reason.as_deref().unwrap_or("Spam"),
        ));
    }

    let text = format!("<b>🚫 BANNED USERS LIST:</b>\n\n{}", lines.join("\n"));
    send_chunked(&bot, msg.chat.id, text).await
}

/// Handle /pending command - show open verifications
pub async fn handle_pending(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    if require_admin(&bot, &msg, &settings).await?.is_none() {
        return Ok(());
    }

    let entries = services.store.pending.list().await;

    if entries.is_empty() {
        bot.send_message(msg.chat.id, "✅ No pending verifications")
            .send()
            .await?;
        return Ok(());
    }

    let mut text = "<b>⏳ PENDING VERIFICATIONS:</b>\n\n".to_string();
    for (user_id, pending) in &entries {
        let has_evidence = pending.state() == VerificationState::AwaitingAdmin;
        text.push_str(&format!(
            "👤 ID: <code>{}</code>\n\
             📅 Plan: {}\n\
             💰 Amount: ₹{}\n\
             ⏰ Time: {}\n\
             📸 Screenshot: {}\n\
             ───────────────\n",
            user_id,
            settings.plans.get(pending.plan).name,
            pending.amount,
            crate::utils::helpers::format_timestamp(pending.initiated_at),
            if has_evidence { "✅" } else { "❌" },
        ));
    }

    send_chunked(&bot, msg.chat.id, text).await
}

/// Handle /verify command: `/verify [user_id]` - manual approval
pub async fn handle_verify(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    let admin_id = match require_admin(&bot, &msg, &settings).await? {
        Some(id) => id,
        None => return Ok(()),
    };

    let text = msg.text().unwrap_or_default();
    let args: Vec<&str> = text.split_whitespace().collect();

    let target: i64 = match args.get(1).and_then(|arg| arg.parse().ok()) {
        Some(id) => id,
        None => {
            bot.send_message(
                msg.chat.id,
                "Usage: /verify [user_id]\nExample: /verify 123456789",
            )
            .send()
            .await?;
            return Ok(());
        }
    };

    let reply = match services.verification.decide(target, true, admin_id, Utc::now()).await {
        Ok(_) => {
            info!(admin_id = admin_id, target = target, "Manual verification approved");
            "✅ User verified and unique join link sent".to_string()
        }
        Err(PayGateError::NoPendingIntent { .. }) => {
            "❌ User not in pending verifications".to_string()
        }
        Err(PayGateError::Conflict { .. }) => {
            "⏳ Another decision for this user is in progress, try again".to_string()
        }
        Err(e) => {
            warn!(target = target, error = %e, "Manual verification failed");
            format!("❌ Error: {}", e)
        }
    };

    bot.send_message(msg.chat.id, reply).send().await?;
    Ok(())
}

/// Handle /stats command - show bot statistics
pub async fn handle_stats(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    if require_admin(&bot, &msg, &settings).await?.is_none() {
        return Ok(());
    }

    let now = Utc::now();
    let stats_text = format!(
        "<b>📊 BOT STATISTICS</b>\n\n\
         👥 <b>Users:</b>\n\
         • Total Users: {}\n\
         • Premium Users: {}\n\
         • Pending Verification: {}\n\n\
         🛡️ <b>Spam Protection:</b>\n\
         • Currently Blocked: {}\n\
         • Tracked Users: {}\n\n\
         💰 <b>Payment Info:</b>\n\
         • Monthly: ₹{}\n\
         • Lifetime: ₹{}\n\n\
         🚀 <b>Status:</b> ✅ Running",
        services.store.users.count().await,
        services.store.users.premium_count().await,
        services.store.pending.count().await,
        services.abuse.blocked_count(now),
        services.store.abuse.count(),
        settings.plans.monthly.amount,
        settings.plans.lifetime.amount,
    );

    bot.send_message(msg.chat.id, stats_text)
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(())
}
