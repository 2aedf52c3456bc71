//! Views for the review flow
//!
//! Contains the verdict keyboard, its callback data format, and the texts
//! shown while walking a review.

use super::links::platform_label;
use linkkeeper_core::collector::ReviewSummary;
use linkkeeper_core::review::{ReviewPrompt, BROKEN_TOKEN, WORKS_TOKEN};
use std::borrow::Cow;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// ─────────────────────────────────────────────────────────────────────────────
// Callback data
// ─────────────────────────────────────────────────────────────────────────────

/// Separator between the verdict token and the prompt position.
const CALLBACK_SEPARATOR: char = ':';

/// Callback data for a verdict button: `<token>:<position>`.
#[must_use]
pub fn verdict_callback_data(token: &str, position: usize) -> String {
    format!("{token}{CALLBACK_SEPARATOR}{position}")
}

/// Splits verdict callback data into the token and the prompt position.
#[must_use]
pub fn parse_verdict_callback(data: &str) -> Option<(&str, usize)> {
    let (token, position) = data.rsplit_once(CALLBACK_SEPARATOR)?;
    Some((token, position.parse().ok()?))
}

/// Works/broken buttons for the prompt at `position`.
#[must_use]
pub fn verdict_keyboard(position: usize) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ يعمل", verdict_callback_data(WORKS_TOKEN, position)),
        InlineKeyboardButton::callback("❌ معطل", verdict_callback_data(BROKEN_TOKEN, position)),
    ]])
}

// ─────────────────────────────────────────────────────────────────────────────
// Texts
// ─────────────────────────────────────────────────────────────────────────────

/// Reply when every stored link is already confirmed.
pub const NOTHING_TO_REVIEW: &str = "✅ لا توجد روابط بحاجة إلى مراجعة.";

/// Reply to a reply that is not a verdict.
pub const UNRECOGNIZED_VERDICT: &str = "⚠️ لم أفهم الرد. أجب بـ «نعم» أو «لا».";

/// Reply to `/cancel` with an open review.
pub const REVIEW_CANCELLED: &str = "⏹ تم إلغاء المراجعة، لم يُحذف أي رابط.";

/// Reply when no review is open.
pub const NO_ACTIVE_REVIEW: &str = "ℹ️ لا توجد مراجعة جارية. أرسل /review للبدء.";

/// Toast for a button on a prompt that was already answered.
pub const STALE_PROMPT: &str = "⌛ هذا السؤال لم يعد صالحًا.";

/// Announcement sent before the first prompt.
#[must_use]
pub fn review_started(total: usize, restarted: bool) -> String {
    let intro = format!(
        "🔍 بدء مراجعة {total} رابط.\nاضغط الزر المناسب أو أجب بـ «نعم» إذا كان الرابط يعمل و«لا» إذا كان معطلًا."
    );
    if restarted {
        format!("♻️ تم إلغاء المراجعة السابقة.\n{intro}")
    } else {
        intro
    }
}

/// Characters of a link shown in a prompt; escaping can grow it fivefold.
const PROMPT_LINK_MAX_CHARS: usize = 700;

fn shorten_link(link: &str) -> Cow<'_, str> {
    match link.char_indices().nth(PROMPT_LINK_MAX_CHARS) {
        Some((idx, _)) => Cow::Owned(format!("{}…", &link[..idx])),
        None => Cow::Borrowed(link),
    }
}

/// Prompt asking whether one link still works.
///
/// Very long links are shortened so the prompt fits in one message.
#[must_use]
pub fn review_prompt(prompt: &ReviewPrompt) -> String {
    format!(
        "🔗 <b>({}/{}) {}</b>\n{}\n\nهل الرابط يعمل؟",
        prompt.position,
        prompt.total,
        platform_label(prompt.item.platform),
        html_escape::encode_text(&shorten_link(&prompt.item.link))
    )
}

/// Final report of a review.
#[must_use]
pub fn review_completed(summary: &ReviewSummary) -> String {
    if summary.removed == 0 {
        format!(
            "✅ انتهت المراجعة: كل الروابط ({}) تعمل، لم يُحذف شيء.",
            summary.reviewed
        )
    } else {
        format!(
            "🗑 انتهت المراجعة: حُذف {} رابط معطل من أصل {}.",
            summary.removed, summary.reviewed
        )
    }
}
