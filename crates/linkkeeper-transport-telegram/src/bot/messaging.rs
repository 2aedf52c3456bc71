//! Common messaging utilities for Telegram bot.
//!
//! Long replies (a big batch of new links, a long page) are split on line
//! boundaries so every part stays under Telegram's size limit and no HTML
//! tag is cut in half.

use crate::bot::resilient::send_message_resilient;
use crate::config::TELEGRAM_MESSAGE_LIMIT;
use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardMarkup, ParseMode};

/// Split `text` into parts of at most `limit` characters, breaking on newlines.
///
/// A single line longer than `limit` is cut on character boundaries.
#[must_use]
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let needed = if current.is_empty() { line_len } else { line_len + 1 };

        if current_len + needed > limit && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            let mut rest = chars.as_slice();
            while !rest.is_empty() {
                let cut = entity_safe_cut(rest, limit);
                parts.push(rest[..cut].iter().collect());
                rest = &rest[cut..];
            }
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}

/// Longest HTML entity the escaper emits, plus numeric forms.
const MAX_ENTITY_LEN: usize = 10;

/// Cut position at most `limit` that does not fall inside an `&...;` entity.
fn entity_safe_cut(chars: &[char], limit: usize) -> usize {
    if chars.len() <= limit {
        return chars.len();
    }
    let window = limit.saturating_sub(MAX_ENTITY_LEN);
    match chars[window..limit].iter().rposition(|c| *c == '&') {
        Some(offset) if window + offset > 0 && !chars[window + offset..limit].contains(&';') => {
            window + offset
        }
        _ => limit,
    }
}

/// Sends an HTML reply, split into several messages when too long.
///
/// # Errors
///
/// Returns an error if any part fails to send after retries.
pub async fn send_html(bot: &Bot, chat_id: ChatId, text: &str) -> Result<()> {
    for part in split_message(text, TELEGRAM_MESSAGE_LIMIT) {
        send_message_resilient(bot, chat_id, part, Some(ParseMode::Html), None).await?;
    }
    Ok(())
}

/// Sends a short HTML message carrying an inline keyboard.
///
/// # Errors
///
/// Returns an error if sending fails after retries.
pub async fn send_html_with_keyboard(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> Result<()> {
    send_message_resilient(bot, chat_id, text, Some(ParseMode::Html), Some(keyboard)).await?;
    Ok(())
}
