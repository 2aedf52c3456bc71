use crate::bot::messaging::{send_html, send_html_with_keyboard};
use crate::bot::views;
use anyhow::{anyhow, Result};
use linkkeeper_core::collector::{LinkCollector, ReviewStart, UserId, VerdictOutcome};
use linkkeeper_core::config::LIST_PAGE_SIZE;
use linkkeeper_core::review::ReviewPrompt;
use std::sync::Arc;
use teloxide::{prelude::*, types::ChatId, utils::command::BotCommands};
use tracing::{debug, error, info};

/// Supported commands for the bot
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "الأوامر المتاحة:")]
pub enum Command {
    /// Show the welcome message
    #[command(description = "بدء العمل.")]
    Start,
    /// Show usage
    #[command(description = "عرض المساعدة.")]
    Help,
    /// List stored links
    #[command(description = "عرض الروابط المخزنة.")]
    List,
    /// Start reviewing stored links
    #[command(description = "مراجعة الروابط وحذف المعطل منها.")]
    Review,
    /// Abandon the open review
    #[command(description = "إلغاء المراجعة الجارية.")]
    Cancel,
}

/// Safe extraction of user ID from a message.
/// Returns 0 if the user information is missing.
pub fn get_user_id_safe(msg: &Message) -> UserId {
    msg.from.as_ref().map_or(0, |u| u.id.0.cast_signed())
}

/// Returns `true` for text shaped like a bot command (`/name ...`).
#[must_use]
pub fn is_command_text(text: &str) -> bool {
    text.strip_prefix('/')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_alphanumeric())
}

/// Welcome and usage text.
///
/// # Errors
///
/// Returns an error if sending fails.
pub async fn start(bot: Bot, msg: Message) -> Result<()> {
    send_html(&bot, msg.chat.id, views::WELCOME_MESSAGE).await
}

/// Reply to a command the bot does not know, with the usage text.
///
/// # Errors
///
/// Returns an error if sending fails.
pub async fn unknown_command(bot: Bot, msg: Message) -> Result<()> {
    let text = format!("{}\n\n{}", views::UNKNOWN_COMMAND, views::WELCOME_MESSAGE);
    send_html(&bot, msg.chat.id, &text).await
}

/// Counts per platform, then the stored links page by page.
///
/// # Errors
///
/// Returns an error if sending fails.
pub async fn list(bot: Bot, msg: Message, collector: Arc<LinkCollector>) -> Result<()> {
    let links = collector.stored_links().await;
    for message in views::list_messages(&links, LIST_PAGE_SIZE) {
        send_html(&bot, msg.chat.id, &message).await?;
    }
    Ok(())
}

/// Open a review and show the first link.
///
/// # Errors
///
/// Returns an error if sending fails.
pub async fn review(bot: Bot, msg: Message, collector: Arc<LinkCollector>) -> Result<()> {
    let user_id = get_user_id_safe(&msg);
    match collector.begin_review(user_id).await {
        ReviewStart::NothingToReview => {
            send_html(&bot, msg.chat.id, views::NOTHING_TO_REVIEW).await
        }
        ReviewStart::Started { prompt, restarted } => {
            send_html(
                &bot,
                msg.chat.id,
                &views::review_started(prompt.total, restarted),
            )
            .await?;
            send_prompt(&bot, msg.chat.id, &prompt).await
        }
    }
}

/// Abandon the open review.
///
/// # Errors
///
/// Returns an error if sending fails.
pub async fn cancel(bot: Bot, msg: Message, collector: Arc<LinkCollector>) -> Result<()> {
    let text = if collector.cancel_review(get_user_id_safe(&msg)).await {
        views::REVIEW_CANCELLED
    } else {
        views::NO_ACTIVE_REVIEW
    };
    send_html(&bot, msg.chat.id, text).await
}

/// Any non-command text: a verdict during a review, a link submission otherwise.
///
/// # Errors
///
/// Returns an error if sending fails.
pub async fn handle_text(bot: Bot, msg: Message, collector: Arc<LinkCollector>) -> Result<()> {
    let text = msg.text().unwrap_or_default();
    let user_id = get_user_id_safe(&msg);

    if collector.is_reviewing(user_id).await {
        return apply_verdict(&bot, msg.chat.id, user_id, text, &collector).await;
    }

    match collector.submit_text(user_id, text).await {
        Ok(report) => send_html(&bot, msg.chat.id, &views::ingest_report(&report)).await,
        Err(e) => {
            error!("Failed to save submitted links for user {user_id}: {e}");
            send_html(&bot, msg.chat.id, views::STORE_ERROR).await
        }
    }
}

/// Verdict button pressed on a review prompt.
///
/// # Errors
///
/// Returns an error if the callback carries no message or sending fails.
pub async fn handle_verdict_callback(
    bot: Bot,
    q: CallbackQuery,
    collector: Arc<LinkCollector>,
) -> Result<()> {
    let Some((token, position)) = q.data.as_deref().and_then(views::parse_verdict_callback)
    else {
        let _ = bot.answer_callback_query(q.id.clone()).await;
        return Ok(());
    };

    let user_id = q.from.id.0.cast_signed();
    let message = q
        .message
        .as_ref()
        .ok_or_else(|| anyhow!("Callback message missing chat id"))?;
    let chat_id = message.chat().id;

    // Answered prompts lose their buttons
    if let Err(e) = bot.edit_message_reply_markup(chat_id, message.id()).await {
        debug!("Could not remove verdict keyboard: {e}");
    }

    let pending = collector.current_prompt(user_id).await.map(|p| p.position);
    if pending != Some(position) {
        info!(user_id, position, "Ignoring verdict for a stale prompt");
        let _ = bot
            .answer_callback_query(q.id.clone())
            .text(views::STALE_PROMPT)
            .await;
        return Ok(());
    }

    let _ = bot.answer_callback_query(q.id.clone()).await;
    apply_verdict(&bot, chat_id, user_id, token, &collector).await
}

async fn apply_verdict(
    bot: &Bot,
    chat_id: ChatId,
    user_id: UserId,
    token: &str,
    collector: &LinkCollector,
) -> Result<()> {
    match collector.receive_verdict(user_id, token).await {
        Ok(VerdictOutcome::NoActiveReview) => {
            send_html(bot, chat_id, views::NO_ACTIVE_REVIEW).await
        }
        Ok(VerdictOutcome::Unrecognized(prompt)) => {
            send_html(bot, chat_id, views::UNRECOGNIZED_VERDICT).await?;
            send_prompt(bot, chat_id, &prompt).await
        }
        Ok(VerdictOutcome::Next(prompt)) => send_prompt(bot, chat_id, &prompt).await,
        Ok(VerdictOutcome::Completed(summary)) => {
            send_html(bot, chat_id, &views::review_completed(&summary)).await
        }
        Err(e) => {
            error!("Failed to save review verdict for user {user_id}: {e}");
            send_html(bot, chat_id, views::STORE_ERROR).await?;
            match collector.current_prompt(user_id).await {
                Some(prompt) => send_prompt(bot, chat_id, &prompt).await,
                None => Ok(()),
            }
        }
    }
}

async fn send_prompt(bot: &Bot, chat_id: ChatId, prompt: &ReviewPrompt) -> Result<()> {
    send_html_with_keyboard(
        bot,
        chat_id,
        &views::review_prompt(prompt),
        views::verdict_keyboard(prompt.position),
    )
    .await
}
