//! Link extraction and normalization
//!
//! Pulls Telegram (`t.me`) and WhatsApp invite (`chat.whatsapp.com`) links
//! out of free-form text and canonicalizes them to a comparable form.

use lazy_regex::lazy_regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Match Telegram links: http(s)://t.me/ followed by non-whitespace
static RE_TELEGRAM: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"https?://t\.me/\S+");

/// Match WhatsApp group invites: http(s)://chat.whatsapp.com/ followed by non-whitespace
static RE_WHATSAPP: lazy_regex::Lazy<regex::Regex> =
    lazy_regex!(r"https?://chat\.whatsapp\.com/\S+");

/// Link family a stored link belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Telegram links (`t.me`)
    #[serde(rename = "t.me")]
    Telegram,
    /// WhatsApp group invites (`chat.whatsapp.com`)
    #[serde(rename = "chat.whatsapp")]
    WhatsApp,
}

impl Platform {
    /// All platforms in display and review order.
    pub const ALL: [Self; 2] = [Self::Telegram, Self::WhatsApp];

    /// Key under which the platform bucket is persisted.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Telegram => "t.me",
            Self::WhatsApp => "chat.whatsapp",
        }
    }

    fn pattern(self) -> &'static regex::Regex {
        match self {
            Self::Telegram => &RE_TELEGRAM,
            Self::WhatsApp => &RE_WHATSAPP,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Telegram => "Telegram",
            Self::WhatsApp => "WhatsApp",
        })
    }
}

/// Raw link matches found in one message, in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedLinks {
    /// Raw `t.me` matches
    pub telegram: Vec<String>,
    /// Raw `chat.whatsapp.com` matches
    pub whatsapp: Vec<String>,
}

impl ExtractedLinks {
    /// Raw matches for one platform.
    #[must_use]
    pub fn for_platform(&self, platform: Platform) -> &[String] {
        match platform {
            Platform::Telegram => &self.telegram,
            Platform::WhatsApp => &self.whatsapp,
        }
    }

    /// Total number of matches across both platforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.telegram.len() + self.whatsapp.len()
    }

    /// Returns `true` if no link was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scans `text` for links of both platforms.
///
/// Matching is greedy up to the next whitespace, so punctuation that
/// directly follows a link in prose ends up in the match.
///
/// # Examples
///
/// ```
/// use linkkeeper_core::links::extract_links;
///
/// let found = extract_links("join https://t.me/rustlang or https://chat.whatsapp.com/AbC");
/// assert_eq!(found.telegram, vec!["https://t.me/rustlang"]);
/// assert_eq!(found.whatsapp, vec!["https://chat.whatsapp.com/AbC"]);
/// ```
#[must_use]
pub fn extract_links(text: &str) -> ExtractedLinks {
    let find = |platform: Platform| {
        platform
            .pattern()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    };

    ExtractedLinks {
        telegram: find(Platform::Telegram),
        whatsapp: find(Platform::WhatsApp),
    }
}

/// Canonical `scheme://host/path` form of a link.
///
/// Query and fragment are dropped, trailing `/` characters are removed from
/// the path. Case and percent-encoding are left untouched.
///
/// # Examples
///
/// ```
/// use linkkeeper_core::links::normalize_link;
///
/// assert_eq!(normalize_link("https://t.me/abc/?x=1"), "https://t.me/abc");
/// assert_eq!(normalize_link("https://t.me/abc#top"), "https://t.me/abc");
/// ```
#[must_use]
pub fn normalize_link(raw: &str) -> String {
    let (prefix, rest) = match raw.find("://") {
        Some(idx) => raw.split_at(idx + 3),
        None => ("", raw),
    };

    // Everything after the first '?' or '#' is query or fragment
    let rest = rest.find(['?', '#']).map_or(rest, |idx| &rest[..idx]);

    let (host, path) = if prefix.is_empty() {
        ("", rest)
    } else {
        rest.find('/').map_or((rest, ""), |idx| rest.split_at(idx))
    };

    format!("{prefix}{host}{}", path.trim_end_matches('/'))
}
