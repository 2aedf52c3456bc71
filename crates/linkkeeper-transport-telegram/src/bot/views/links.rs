//! Views for link submission and listing
//!
//! Texts are HTML; every link is escaped before it is embedded.

use linkkeeper_core::collector::{paginate, LinkPage};
use linkkeeper_core::store::{IngestReport, PlatformBuckets};
use linkkeeper_core::Platform;

/// Welcome and usage text for `/start` and `/help`.
pub const WELCOME_MESSAGE: &str = "👋 <b>مرحبًا!</b> أرسل لي رسالة تحتوي على روابط تيليجرام أو واتساب، وسأخزنها لك مع حذف المكرر.

/list - عرض الروابط المخزنة
/review - مراجعة الروابط وحذف المعطل منها
/cancel - إلغاء المراجعة الجارية
/help - عرض هذه الرسالة";

/// Reply to a command the bot does not know.
pub const UNKNOWN_COMMAND: &str = "❓ أمر غير معروف.";

/// Reply when a message contains no supported link.
pub const NO_LINKS_FOUND: &str = "ℹ️ لم أجد أي روابط تيليجرام أو واتساب في رسالتك.";

/// Reply when every link in a message was a duplicate.
pub const NOTHING_NEW: &str = "⚠️ لم تُضف روابط جديدة، كلها مكررة.";

/// Reply when the store is empty.
pub const STORE_EMPTY: &str = "📭 لا توجد روابط مخزنة بعد.";

/// Reply when a change could not be saved.
pub const STORE_ERROR: &str = "❌ تعذّر حفظ التغييرات. حاول مرة أخرى.";

/// Display name of a platform.
#[must_use]
pub const fn platform_label(platform: Platform) -> &'static str {
    match platform {
        Platform::Telegram => "تيليجرام",
        Platform::WhatsApp => "واتساب",
    }
}

fn escape(link: &str) -> String {
    html_escape::encode_text(link).into_owned()
}

fn bullet_list(links: &[String]) -> String {
    links
        .iter()
        .map(|link| format!("- {}", escape(link)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Summary of one submitted message.
#[must_use]
pub fn ingest_report(report: &IngestReport) -> String {
    if report.candidates == 0 {
        return NO_LINKS_FOUND.to_string();
    }

    let mut sections = Vec::new();
    if report.has_new() {
        sections.push("✅ <b>روابط جديدة تم حفظها:</b>".to_string());
        for platform in Platform::ALL {
            let added = report.added.get(platform);
            if !added.is_empty() {
                sections.push(format!(
                    "📌 <b>روابط {}:</b>\n{}",
                    platform_label(platform),
                    bullet_list(added)
                ));
            }
        }
    } else {
        sections.push(NOTHING_NEW.to_string());
    }

    if report.duplicates > 0 {
        sections.push(format!("⚠️ تم تجاهل {} رابط مكرر.", report.duplicates));
    }

    sections.join("\n\n")
}

/// Per-platform counts shown before the pages.
#[must_use]
pub fn list_summary(links: &PlatformBuckets) -> String {
    let counts = Platform::ALL
        .iter()
        .map(|platform| format!("{}: {}", platform_label(*platform), links.len(*platform)))
        .collect::<Vec<_>>()
        .join("\n");
    format!("📊 <b>الروابط المخزنة</b>\n{counts}")
}

/// One numbered page of stored links.
#[must_use]
pub fn list_page(platform: Platform, page: &LinkPage<'_>) -> String {
    format!(
        "📄 <b>{} - صفحة {}</b>\n{}",
        platform_label(platform),
        page.number,
        bullet_list(page.links)
    )
}

/// All messages for the list command: summary first, then pages per platform.
#[must_use]
pub fn list_messages(links: &PlatformBuckets, page_size: usize) -> Vec<String> {
    if links.is_empty() {
        return vec![STORE_EMPTY.to_string()];
    }

    let mut messages = vec![list_summary(links)];
    for platform in Platform::ALL {
        messages.extend(
            paginate(links.get(platform), page_size)
                .iter()
                .map(|page| list_page(platform, page)),
        );
    }
    messages
}
