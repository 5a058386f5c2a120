//! PayGate Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::Update;
use teloxide::utils::command::BotCommands as TeloxideBotCommands;
use tracing::{error, info, warn};

use PayGate::{
    config::Settings,
    handlers::{
        callbacks::handle_callback_query,
        commands::{admin, help, start},
        messages::handle_message,
    },
    services::ServiceFactory,
    storage::{FlushScheduler, JsonStore, StoreService},
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting PayGate Telegram Bot...");

    // Load the durable store
    info!("Loading durable store from {}...", settings.storage.data_dir);
    let store = StoreService::load(JsonStore::new(&settings.storage.data_dir)).await?;

    // Start periodic persistence
    let mut flush_scheduler = FlushScheduler::new(
        store.clone(),
        Duration::from_secs(settings.storage.flush_interval_seconds),
    );
    flush_scheduler.start();

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), settings.clone(), store);

    info!("Setting up bot handlers...");

    // Wrap dependencies in Arc for dependency injection
    let services_arc = Arc::new(services);
    let settings_arc = Arc::new(settings);

    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![services_arc, settings_arc])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("PayGate bot is ready!");

    dispatcher.dispatch().await;

    // Final flush before exit
    info!("Shutting down, flushing store...");
    flush_scheduler.stop().await;

    info!("PayGate bot has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    // Handle commands
                    dptree::entry()
                        .filter_command::<BotCommands>()
                        .endpoint(handle_commands),
                )
                .branch(
                    // Handle regular messages (payment screenshots)
                    dptree::endpoint(handle_messages),
                ),
        )
        .branch(
            // Handle callback queries
            Update::filter_callback_query().endpoint(handle_callbacks),
        )
}

#[derive(TeloxideBotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "PayGate Bot Commands")]
enum BotCommands {
    #[command(description = "Start the bot and show membership plans")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Manually verify a pending payment (admin only)")]
    Verify,
    #[command(description = "Ban a user (admin only)")]
    Ban,
    #[command(description = "Unban a user (admin only)")]
    Unban,
    #[command(description = "List banned users (admin only)")]
    Banlist,
    #[command(description = "List pending verifications (admin only)")]
    Pending,
    #[command(description = "Show bot statistics (admin only)")]
    Stats,
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: BotCommands,
    services: Arc<ServiceFactory>,
    settings: Arc<Settings>,
) -> HandlerResult {
    let services = (*services).clone();
    let settings = (*settings).clone();

    let result = match cmd {
        BotCommands::Start => start::handle_start(bot, msg, services, settings).await,
        BotCommands::Help => help::handle_help(bot, msg, settings).await,
        BotCommands::Verify => admin::handle_verify(bot, msg, services, settings).await,
        BotCommands::Ban => admin::handle_ban(bot, msg, services, settings).await,
        BotCommands::Unban => admin::handle_unban(bot, msg, services, settings).await,
        BotCommands::Banlist => admin::handle_banlist(bot, msg, services, settings).await,
        BotCommands::Pending => admin::handle_pending(bot, msg, services, settings).await,
        BotCommands::Stats => admin::handle_stats(bot, msg, services, settings).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle regular messages
async fn handle_messages(
    bot: Bot,
    msg: Message,
    services: Arc<ServiceFactory>,
    settings: Arc<Settings>,
) -> HandlerResult {
    let services = (*services).clone();
    let settings = (*settings).clone();

    if let Err(e) = handle_message(bot, msg, services, settings).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(
    bot: Bot,
    query: teloxide::types::CallbackQuery,
    services: Arc<ServiceFactory>,
    settings: Arc<Settings>,
) -> HandlerResult {
    let services = (*services).clone();
    let settings = (*settings).clone();

    if let Err(e) = handle_callback_query(bot, query, services, settings).await {
        error!(error = %e, "Error handling callback query");
        return Err(e.into());
    }

    Ok(())
}
