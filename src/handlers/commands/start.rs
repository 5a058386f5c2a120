//! Start command handler

use chrono::Utc;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Request,
    requests::Requester,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode},
    Bot,
};
use tracing::{debug, info};

use crate::config::Settings;
use crate::handlers::admission_passed;
use crate::services::ServiceFactory;
use crate::utils::errors::{PayGateError, Result};
use crate::utils::helpers::format_timestamp;
use crate::utils::logging::log_user_action;

/// Handle /start command - register the user and show the plan menu
pub async fn handle_start(
    bot: Bot,
    msg: Message,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    let user = msg.from.as_ref().ok_or_else(|| {
        PayGateError::InvalidInput("No user in message".to_string())
    })?;

    let user_id = user.id.0 as i64;
    let chat_id = msg.chat.id;

    debug!(user_id = user_id, "Processing /start command");

    if !admission_passed(&bot, chat_id, user_id, &services).await {
        return Ok(());
    }

    let now = Utc::now();
    let (record, is_new) = services
        .store
        .users
        .upsert_profile(
            user_id,
            user.username.clone(),
            Some(user.first_name.clone()),
            user.last_name.clone(),
            now,
        )
        .await;

    services.abuse.reset(user_id, now);
    log_user_action(user_id, "start", None);

    if is_new {
        info!(user_id = user_id, "New user registered");
        services
            .notifier
            .log_event(format!(
                "🆕 <b>NEW USER</b>\n\n\
                 👤 Name: {}\n\
                 👤 User: @{}\n\
                 🆔 ID: <code>{}</code>\n\
                 ⏰ Time: {}\n\
                 📊 Total Users: {}",
                record.first_name.as_deref().unwrap_or("N/A"),
                record.username.as_deref().unwrap_or("N/A"),
                user_id,
                format_timestamp(now),
                services.store.users.count().await,
            ))
            .await;
    }

    let welcome_text = format!(
        "<b>🔥 PREMIUM CONTENT 🔥</b>\n\n\
         <b>Membership Plans:</b>\n\
         📅 {} - ₹{}\n\
         ♾️ {} - ₹{}\n\n\
         <b>Features:</b>\n\
         • Premium Videos\n\
         • Lifetime Access (Lifetime plan)\n\
         • Fast Support\n\
         • Daily Updates\n\n\
         <b>👇 Choose your plan:</b>",
        settings.plans.monthly.name,
        settings.plans.monthly.amount,
        settings.plans.lifetime.name,
        settings.plans.lifetime.amount,
    );

    bot.send_message(chat_id, welcome_text)
        .parse_mode(ParseMode::Html)
        .reply_markup(plan_keyboard(&settings))
        .send()
        .await?;

    Ok(())
}

/// Plan selection keyboard shared by /start and the menu callbacks
pub(crate) fn plan_keyboard(settings: &Settings) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![
            InlineKeyboardButton::callback(
                format!(
                    "📅 {} - ₹{}",
                    settings.plans.monthly.name, settings.plans.monthly.amount
                ),
                "plan:monthly",
            ),
            InlineKeyboardButton::callback(
                format!(
                    "♾️ {} - ₹{}",
                    settings.plans.lifetime.name, settings.plans.lifetime.amount
                ),
                "plan:lifetime",
            ),
        ],
        vec![InlineKeyboardButton::callback("❓ How To Get", "howto")],
    ];

    if !settings.bot.demo_channel_link.is_empty() {
        if let Ok(url) = settings.bot.demo_channel_link.parse() {
            rows.push(vec![InlineKeyboardButton::url("📢 Premium Demo", url)]);
        }
    }

    InlineKeyboardMarkup::new(rows)
}
