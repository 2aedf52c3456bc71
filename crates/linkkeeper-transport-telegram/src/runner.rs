use crate::bot;
use crate::bot::handlers::Command;
use crate::config::BotSettings;
use linkkeeper_core::storage::open_storage;
use linkkeeper_core::LinkCollector;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

/// Run the Telegram transport runtime.
pub async fn run_bot(settings: Arc<BotSettings>) {
    let collector = init_collector(&settings).await;

    let bot = Bot::new(settings.telegram.telegram_token.clone());
    register_commands(&bot).await;
    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![collector])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.kind);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn init_collector(settings: &BotSettings) -> Arc<LinkCollector> {
    let storage = match open_storage(&settings.core).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to initialize link storage: {}", e);
            std::process::exit(1);
        }
    };

    let collector = match LinkCollector::open(storage, settings.core.review_limit()).await {
        Ok(collector) => collector,
        Err(e) => {
            error!("Failed to load link store: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = collector.check_storage().await {
        error!("Link storage connection check returned error: {}", e);
    }

    info!("Link collector initialized.");
    Arc::new(collector)
}

async fn register_commands(bot: &Bot) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handle_verdict_callback))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_command),
                )
                .branch(
                    dptree::filter(|msg: Message| {
                        msg.text().is_some_and(bot::handlers::is_command_text)
                    })
                    .endpoint(handle_unknown_command),
                )
                .branch(
                    dptree::filter(|msg: Message| msg.text().is_some()).endpoint(handle_text),
                ),
        )
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    collector: Arc<LinkCollector>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start | Command::Help => bot::handlers::start(bot, msg).await,
        Command::List => bot::handlers::list(bot, msg, collector).await,
        Command::Review => bot::handlers::review(bot, msg, collector).await,
        Command::Cancel => bot::handlers::cancel(bot, msg, collector).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_unknown_command(bot: Bot, msg: Message) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::unknown_command(bot, msg).await {
        error!("Unknown command handler error: {}", e);
    }
    respond(())
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    collector: Arc<LinkCollector>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_text(bot, msg, collector).await {
        error!("Text handler error: {}", e);
    }
    respond(())
}

async fn handle_verdict_callback(
    bot: Bot,
    q: CallbackQuery,
    collector: Arc<LinkCollector>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_verdict_callback(bot, q, collector).await {
        error!("Verdict callback handler error: {}", e);
    }
    respond(())
}
