//! Help command handler

use teloxide::{
    payloads::SendMessageSetters, prelude::Request, requests::Requester, types::Message,
    types::ParseMode, Bot,
};

use crate::config::Settings;
use crate::utils::errors::Result;

/// Handle /help command
pub async fn handle_help(bot: Bot, msg: Message, settings: Settings) -> Result<()> {
    let is_admin = msg
        .from
        .as_ref()
        .map(|user| settings.is_admin(user.id.0 as i64))
        .unwrap_or(false);

    let help_text = if is_admin {
        "<b>👮 ADMIN COMMANDS</b>\n\n\
         <b>📋 VERIFICATION:</b>\n\
         /pending - Show pending verifications\n\
         /verify [user_id] - Manual verify\n\n\
         <b>🚫 USER MANAGEMENT:</b>\n\
         /ban [id] [min] [reason] - Ban user\n\
         /unban [id] - Unban user\n\
         /banlist - Show banned users\n\n\
         <b>📊 DATA:</b>\n\
         /stats - Bot statistics\n\n\
         <b>ℹ️ OTHER:</b>\n\
         /help - Show this help"
            .to_string()
    } else {
        format!(
            "<b>🤖 Bot Commands:</b>\n\n\
             /start - Start the bot\n\
             /help - Show this help\n\n\
             For premium: use /start and choose a plan\n\n\
             <b>Support:</b> @{}",
            settings.bot.support_username,
        )
    };

    bot.send_message(msg.chat.id, help_text)
        .parse_mode(ParseMode::Html)
        .send()
        .await?;

    Ok(())
}
