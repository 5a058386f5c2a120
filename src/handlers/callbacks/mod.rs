//! Callback query handlers module
//!
//! This module contains handlers for all inline keyboard button callbacks:
//! plan selection, payment-done confirmation and the admin review buttons.

use chrono::Utc;
use teloxide::{
    payloads::SendMessageSetters,
    prelude::Request,
    requests::Requester,
    types::{CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode},
    Bot,
};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::handlers::admission_passed;
use crate::handlers::commands::start::plan_keyboard;
use crate::models::Plan;
use crate::services::{DecisionOutcome, ServiceFactory};
use crate::utils::errors::{PayGateError, Result};

/// Main callback query dispatcher
pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user_id));

    // Answer first to clear the button's loading state
    if let Err(e) = bot.answer_callback_query(query.id.clone()).send().await {
        warn!(error = %e, "Failed to answer callback query");
    }

    let data = match query.data {
        Some(data) => data,
        None => return Ok(()),
    };

    debug!(user_id = user_id, callback_data = %data, "Processing callback query");

    let parts: Vec<&str> = data.split(':').collect();
    match parts[0] {
        "plan" => {
            if let Some(plan_key) = parts.get(1).copied() {
                handle_plan_selection(bot, chat_id, user_id, plan_key, services, settings).await?;
            }
        }
        "paydone" => {
            handle_payment_done(bot, chat_id, user_id, services, settings).await?;
        }
        "howto" => {
            handle_how_to_get(bot, chat_id, user_id, services, settings).await?;
        }
        "approve" | "reject" => {
            if let Some(target) = parts.get(1).and_then(|id| id.parse::<i64>().ok()) {
                let approve = parts[0] == "approve";
                handle_review_decision(bot, chat_id, user_id, target, approve, services, settings)
                    .await?;
            }
        }
        action => {
            warn!(action = %action, "Unknown callback action");
        }
    }

    Ok(())
}

/// Plan selection: book the intent and show payment instructions
async fn handle_plan_selection(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    plan_key: &str,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    if !admission_passed(&bot, chat_id, user_id, &services).await {
        return Ok(());
    }
    let now = Utc::now();
    services.abuse.reset(user_id, now);

    let plan: Plan = match plan_key.parse() {
        Ok(plan) => plan,
        Err(PayGateError::InvalidPlan(key)) => {
            warn!(user_id = user_id, plan = %key, "Unknown plan selected");
            bot.send_message(chat_id, "❌ Unknown plan, please choose again.")
                .reply_markup(plan_keyboard(&settings))
                .send()
                .await?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let pending = services.verification.select_plan(user_id, plan, now).await?;
    let plan_config = settings.plans.get(plan);

    info!(user_id = user_id, plan = %plan, "Payment instructions sent");

    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✅ Payment Done",
        "paydone",
    )]]);

    bot.send_message(
        chat_id,
        format!(
            "<b>💰 PAY ₹{} FOR {}</b>\n\n\
             <b>Payment Details:</b>\n\
             └ ID: <code>{}</code>\n\
             └ Name: {}\n\
             └ Amount: <b>₹{}</b>\n\n\
             <b>Instructions:</b>\n\
             1. Send ₹{} to the address above\n\
             2. Click \"✅ Payment Done\" below\n\n\
             <b>Support:</b> @{}",
            pending.amount,
            plan_config.name.to_uppercase(),
            settings.bot.payment_address,
            settings.bot.payment_name,
            pending.amount,
            pending.amount,
            settings.bot.support_username,
        ),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(keyboard)
    .send()
    .await?;

    Ok(())
}

/// Payment-done confirmation: ask for the screenshot
async fn handle_payment_done(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    if !admission_passed(&bot, chat_id, user_id, &services).await {
        return Ok(());
    }
    services.abuse.reset(user_id, Utc::now());

    let pending = match services.store.pending.get(user_id).await {
        Some(pending) => pending,
        None => {
            bot.send_message(chat_id, "❌ Please select a plan first!")
                .send()
                .await?;
            return Ok(());
        }
    };

    let plan_config = settings.plans.get(pending.plan);

    bot.send_message(
        chat_id,
        format!(
            "<b>📸 SEND PAYMENT SCREENSHOT</b>\n\n\
             <b>Plan Selected:</b> {}\n\
             <b>Amount to Pay:</b> ₹{}\n\n\
             Now please send the <b>payment screenshot</b> for verification.\n\n\
             <b>Instructions:</b>\n\
             1. Take screenshot of the payment\n\
             2. Send it here as photo\n\
             3. Admin will verify within few minutes\n\
             4. You'll receive unique join link after verification\n\n\
             ⏳ <i>Please wait for admin verification...</i>",
            plan_config.name, pending.amount,
        ),
    )
    .parse_mode(ParseMode::Html)
    .send()
    .await?;

    Ok(())
}

/// Purchase instructions
async fn handle_how_to_get(
    bot: Bot,
    chat_id: ChatId,
    user_id: i64,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    if !admission_passed(&bot, chat_id, user_id, &services).await {
        return Ok(());
    }
    services.abuse.reset(user_id, Utc::now());

    bot.send_message(
        chat_id,
        format!(
            "<b>❓ HOW TO GET PREMIUM:</b>\n\n\
             1. Choose your plan (Monthly/Lifetime)\n\
             2. Pay the exact amount\n\
             3. Click \"Payment Done\" button\n\
             4. Send payment screenshot\n\
             5. Admin verifies within few minutes\n\
             6. Get unique join link after verification\n\n\
             <b>Support:</b> @{}",
            settings.bot.support_username,
        ),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(plan_keyboard(&settings))
    .send()
    .await?;

    Ok(())
}

/// Admin review buttons on the evidence prompt
async fn handle_review_decision(
    bot: Bot,
    chat_id: ChatId,
    actor: i64,
    target: i64,
    approve: bool,
    services: ServiceFactory,
    settings: Settings,
) -> Result<()> {
    if !settings.is_admin(actor) {
        warn!(user_id = actor, "Non-admin pressed a review button");
        return Ok(());
    }

    match services.verification.decide(target, approve, actor, Utc::now()).await {
        Ok(DecisionOutcome::Approved { .. }) => {
            info!(actor = actor, target = target, "Review approved");
        }
        Ok(DecisionOutcome::Rejected) => {
            info!(actor = actor, target = target, "Review rejected");
        }
        Err(PayGateError::NoPendingIntent { .. }) => {
            // Duplicate click after the decision already landed
            bot.send_message(
                chat_id,
                format!("❌ User <code>{}</code> not in pending verifications", target),
            )
            .parse_mode(ParseMode::Html)
            .send()
            .await?;
        }
        Err(PayGateError::Conflict { .. }) => {
            bot.send_message(chat_id, "⏳ Decision already in progress, try again")
                .send()
                .await?;
        }
        Err(e) => {
            warn!(target = target, error = %e, "Review decision failed");
            bot.send_message(chat_id, format!("❌ Error: {}", e))
                .send()
                .await?;
        }
    }

    Ok(())
}
