//! Link store document
//!
//! The whole store is one JSON document with three buckets (`links`,
//! `checked`, `deleted`), each mapping the two platform keys to an ordered
//! list of unique normalized links. The store is pure data: reading and
//! writing it is the job of [`crate::storage`].

use crate::links::{normalize_link, ExtractedLinks, Platform};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Ordered, duplicate-free link lists for both platforms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformBuckets {
    /// Telegram links
    #[serde(rename = "t.me", default)]
    pub telegram: Vec<String>,
    /// WhatsApp invite links
    #[serde(rename = "chat.whatsapp", default)]
    pub whatsapp: Vec<String>,
}

impl PlatformBuckets {
    /// Links stored for `platform`, in insertion order.
    #[must_use]
    pub fn get(&self, platform: Platform) -> &[String] {
        match platform {
            Platform::Telegram => &self.telegram,
            Platform::WhatsApp => &self.whatsapp,
        }
    }

    fn get_mut(&mut self, platform: Platform) -> &mut Vec<String> {
        match platform {
            Platform::Telegram => &mut self.telegram,
            Platform::WhatsApp => &mut self.whatsapp,
        }
    }

    /// Returns `true` if `link` is in the `platform` bucket.
    #[must_use]
    pub fn contains(&self, platform: Platform, link: &str) -> bool {
        self.get(platform).iter().any(|l| l == link)
    }

    /// Appends `link` unless already present. Returns `true` if appended.
    pub fn insert(&mut self, platform: Platform, link: &str) -> bool {
        if self.contains(platform, link) {
            return false;
        }
        self.get_mut(platform).push(link.to_string());
        true
    }

    /// Removes `link` from the `platform` bucket. Returns `true` if it was present.
    pub fn remove(&mut self, platform: Platform, link: &str) -> bool {
        let bucket = self.get_mut(platform);
        let before = bucket.len();
        bucket.retain(|l| l != link);
        bucket.len() != before
    }

    /// Number of links for `platform`.
    #[must_use]
    pub fn len(&self, platform: Platform) -> usize {
        self.get(platform).len()
    }

    /// Total number of links across both platforms.
    #[must_use]
    pub fn total(&self) -> usize {
        self.telegram.len() + self.whatsapp.len()
    }

    /// Returns `true` if both buckets are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Normalizes every entry and drops the duplicates this creates.
    fn normalized(self) -> Self {
        let mut out = Self::default();
        for platform in Platform::ALL {
            for link in self.get(platform) {
                out.insert(platform, &normalize_link(link));
            }
        }
        out
    }
}

/// A single `(platform, link)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReviewItem {
    /// Platform bucket the link belongs to
    pub platform: Platform,
    /// Normalized link
    pub link: String,
}

impl ReviewItem {
    /// Create a new item.
    pub fn new(platform: Platform, link: impl Into<String>) -> Self {
        Self {
            platform,
            link: link.into(),
        }
    }
}

/// Outcome of ingesting one message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Links appended to the store, per platform, in extraction order
    pub added: PlatformBuckets,
    /// Candidates skipped because they were already stored or deleted
    pub duplicates: usize,
    /// Number of candidates found in the message
    pub candidates: usize,
}

impl IngestReport {
    /// Returns `true` if at least one link was added.
    #[must_use]
    pub fn has_new(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Shape the persisted document was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrigin {
    /// Three-bucket document
    Current,
    /// Older document, or one still carrying top-level platform keys; needs
    /// to be rewritten
    Legacy,
    /// No document existed yet
    Missing,
    /// Document could not be parsed and was replaced by an empty store
    Malformed,
}

/// The link store: stored, confirmed-working and confirmed-dead links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStore {
    /// Links collected from messages
    #[serde(default)]
    pub links: PlatformBuckets,
    /// Links confirmed working; skipped by reviews
    #[serde(default)]
    pub checked: PlatformBuckets,
    /// Links confirmed dead; never re-added
    #[serde(default)]
    pub deleted: PlatformBuckets,
}

impl LinkStore {
    /// Decodes a persisted document, accepting the legacy single-bucket shape.
    ///
    /// Never fails: a missing or unparsable document yields an empty store.
    #[must_use]
    pub fn decode(raw: Option<&[u8]>) -> (Self, DocumentOrigin) {
        let Some(raw) = raw else {
            return (Self::default(), DocumentOrigin::Missing);
        };

        let value: Value = match serde_json::from_slice(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Link store document is not valid JSON, starting empty: {e}");
                return (Self::default(), DocumentOrigin::Malformed);
            }
        };

        let Some(object) = value.as_object() else {
            warn!("Link store document is not a JSON object, starting empty");
            return (Self::default(), DocumentOrigin::Malformed);
        };

        let is_current = ["links", "checked", "deleted"]
            .iter()
            .any(|key| object.contains_key(*key));
        let is_legacy = Platform::ALL
            .iter()
            .any(|platform| object.contains_key(platform.key()));

        if is_current {
            let stray = if is_legacy {
                serde_json::from_value::<PlatformBuckets>(value.clone()).ok()
            } else {
                None
            };
            match serde_json::from_value::<Self>(value) {
                Ok(store) => {
                    let mut store = store.normalized();
                    match stray.filter(|links| !links.is_empty()) {
                        Some(links) => {
                            store.absorb(links.normalized());
                            (store, DocumentOrigin::Legacy)
                        }
                        None => (store, DocumentOrigin::Current),
                    }
                }
                Err(e) => {
                    warn!("Link store document has an unexpected shape, starting empty: {e}");
                    (Self::default(), DocumentOrigin::Malformed)
                }
            }
        } else if is_legacy {
            match serde_json::from_value::<PlatformBuckets>(value) {
                Ok(links) => (
                    Self {
                        links: links.normalized(),
                        ..Self::default()
                    },
                    DocumentOrigin::Legacy,
                ),
                Err(e) => {
                    warn!("Legacy link document has an unexpected shape, starting empty: {e}");
                    (Self::default(), DocumentOrigin::Malformed)
                }
            }
        } else {
            warn!("Link store document has no known buckets, starting empty");
            (Self::default(), DocumentOrigin::Malformed)
        }
    }

    /// Normalizes and deduplicates all three buckets.
    fn normalized(self) -> Self {
        Self {
            links: self.links.normalized(),
            checked: self.checked.normalized(),
            deleted: self.deleted.normalized(),
        }
    }

    /// Merges stray links into `links`, skipping deleted ones.
    fn absorb(&mut self, stray: PlatformBuckets) {
        for platform in Platform::ALL {
            for link in stray.get(platform) {
                if !self.deleted.contains(platform, link) {
                    self.links.insert(platform, link);
                }
            }
        }
    }

    /// Serializes the store as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Adds the normalized candidates of one message.
    ///
    /// A candidate already stored, or previously deleted, counts as a
    /// duplicate. Candidates are handled in extraction order, so two
    /// spellings of the same link in one message yield one addition and
    /// one duplicate.
    pub fn ingest(&mut self, extracted: &ExtractedLinks) -> IngestReport {
        let mut report = IngestReport {
            candidates: extracted.len(),
            ..IngestReport::default()
        };

        for platform in Platform::ALL {
            for raw in extracted.for_platform(platform) {
                let link = normalize_link(raw);
                if self.deleted.contains(platform, &link) || !self.links.insert(platform, &link) {
                    report.duplicates += 1;
                } else {
                    report.added.insert(platform, &link);
                }
            }
        }

        report
    }

    /// Stored links that have not been confirmed working yet.
    ///
    /// Telegram links come first, then WhatsApp, each in store order.
    /// `limit` caps the number of items returned.
    #[must_use]
    pub fn unchecked(&self, limit: Option<usize>) -> Vec<ReviewItem> {
        Platform::ALL
            .into_iter()
            .flat_map(|platform| {
                self.links
                    .get(platform)
                    .iter()
                    .filter(move |link| !self.checked.contains(platform, link))
                    .map(move |link| ReviewItem::new(platform, link.as_str()))
            })
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Records `item` as confirmed working. Returns `true` if newly recorded.
    pub fn mark_checked(&mut self, item: &ReviewItem) -> bool {
        self.checked.insert(item.platform, &item.link)
    }

    /// Removes every item from the store and records it as deleted.
    ///
    /// Returns the number of links actually removed.
    pub fn apply_deletions(&mut self, items: &[ReviewItem]) -> usize {
        let mut removed = 0;
        for item in items {
            self.deleted.insert(item.platform, &item.link);
            self.checked.remove(item.platform, &item.link);
            if self.links.remove(item.platform, &item.link) {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::extract_links;

    fn store_with(telegram: &[&str], whatsapp: &[&str]) -> LinkStore {
        let mut store = LinkStore::default();
        for link in telegram {
            store.links.insert(Platform::Telegram, link);
        }
        for link in whatsapp {
            store.links.insert(Platform::WhatsApp, link);
        }
        store
    }

    #[test]
    fn test_ingest_same_message_dedups_spellings() {
        let mut store = LinkStore::default();
        let report =
            store.ingest(&extract_links("check https://t.me/group1/ and https://t.me/group1"));

        assert_eq!(report.added.telegram, vec!["https://t.me/group1"]);
        assert!(report.added.whatsapp.is_empty());
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.candidates, 2);
        assert_eq!(store.links.telegram, vec!["https://t.me/group1"]);
    }

    #[test]
    fn test_ingest_twice_is_all_duplicates() {
        let mut store = LinkStore::default();
        let text = "https://t.me/a https://chat.whatsapp.com/B https://t.me/c?x=1";
        let first = store.ingest(&extract_links(text));
        assert_eq!(first.added.total(), 3);

        let second = store.ingest(&extract_links(text));
        assert!(!second.has_new());
        assert_eq!(second.duplicates, 3);
        assert_eq!(store.links.total(), 3);
    }

    #[test]
    fn test_ingest_rejects_deleted_links() {
        let mut store = LinkStore::default();
        store.deleted.insert(Platform::WhatsApp, "https://chat.whatsapp.com/Dead");

        let report = store.ingest(&extract_links("https://chat.whatsapp.com/Dead/?utm=1"));
        assert!(!report.has_new());
        assert_eq!(report.duplicates, 1);
        assert!(store.links.is_empty());
    }

    #[test]
    fn test_unchecked_skips_checked_and_orders_platforms() {
        let mut store = store_with(
            &["https://t.me/a", "https://t.me/b"],
            &["https://chat.whatsapp.com/X"],
        );
        store.checked.insert(Platform::Telegram, "https://t.me/a");

        let items = store.unchecked(None);
        assert_eq!(
            items,
            vec![
                ReviewItem::new(Platform::Telegram, "https://t.me/b"),
                ReviewItem::new(Platform::WhatsApp, "https://chat.whatsapp.com/X"),
            ]
        );
        assert_eq!(store.unchecked(Some(1)).len(), 1);
    }

    #[test]
    fn test_apply_deletions_moves_to_deleted() {
        let mut store = store_with(&["https://t.me/a", "https://t.me/b"], &[]);
        let removed = store.apply_deletions(&[
            ReviewItem::new(Platform::Telegram, "https://t.me/b"),
            ReviewItem::new(Platform::Telegram, "https://t.me/missing"),
        ]);

        assert_eq!(removed, 1);
        assert_eq!(store.links.telegram, vec!["https://t.me/a"]);
        assert!(store.deleted.contains(Platform::Telegram, "https://t.me/b"));
    }

    #[test]
    fn test_decode_current_document() {
        let raw = br#"{
            "links": {"t.me": ["https://t.me/a"], "chat.whatsapp": []},
            "checked": {"t.me": [], "chat.whatsapp": []},
            "deleted": {"t.me": [], "chat.whatsapp": ["https://chat.whatsapp.com/Z"]}
        }"#;
        let (store, origin) = LinkStore::decode(Some(raw));
        assert_eq!(origin, DocumentOrigin::Current);
        assert_eq!(store.links.telegram, vec!["https://t.me/a"]);
        assert!(store.deleted.contains(Platform::WhatsApp, "https://chat.whatsapp.com/Z"));
    }

    #[test]
    fn test_decode_legacy_document_normalizes() {
        let raw = br#"{"t.me": ["https://t.me/a/", "https://t.me/a?x=1"], "chat.whatsapp": ["https://chat.whatsapp.com/Q"]}"#;
        let (store, origin) = LinkStore::decode(Some(raw));
        assert_eq!(origin, DocumentOrigin::Legacy);
        assert_eq!(store.links.telegram, vec!["https://t.me/a"]);
        assert_eq!(store.links.whatsapp, vec!["https://chat.whatsapp.com/Q"]);
        assert!(store.checked.is_empty());
        assert!(store.deleted.is_empty());
    }

    #[test]
    fn test_decode_current_document_normalizes_every_bucket() {
        let raw = br#"{
            "links": {"t.me": ["https://t.me/a", "https://t.me/a/", "http://t.me/a?x=1"], "chat.whatsapp": []},
            "checked": {"t.me": ["https://t.me/a#top", "https://t.me/a"], "chat.whatsapp": []},
            "deleted": {"t.me": [], "chat.whatsapp": ["https://chat.whatsapp.com/Z/", "https://chat.whatsapp.com/Z"]}
        }"#;
        let (store, origin) = LinkStore::decode(Some(raw));
        assert_eq!(origin, DocumentOrigin::Current);
        assert_eq!(store.links.telegram, vec!["https://t.me/a", "http://t.me/a"]);
        assert_eq!(store.checked.telegram, vec!["https://t.me/a"]);
        assert_eq!(store.deleted.whatsapp, vec!["https://chat.whatsapp.com/Z"]);
    }

    #[test]
    fn test_decode_mixed_document_keeps_stray_platform_keys() {
        let raw = br#"{
            "links": {"t.me": ["https://t.me/a"], "chat.whatsapp": []},
            "deleted": {"t.me": ["https://t.me/dead"], "chat.whatsapp": []},
            "t.me": ["https://t.me/b/", "https://t.me/a", "https://t.me/dead"],
            "chat.whatsapp": ["https://chat.whatsapp.com/Q?s=1"]
        }"#;
        let (store, origin) = LinkStore::decode(Some(raw));
        assert_eq!(origin, DocumentOrigin::Legacy);
        assert_eq!(store.links.telegram, vec!["https://t.me/a", "https://t.me/b"]);
        assert_eq!(store.links.whatsapp, vec!["https://chat.whatsapp.com/Q"]);
        assert!(!store.links.contains(Platform::Telegram, "https://t.me/dead"));
    }

    #[test]
    fn test_decode_missing_and_malformed() {
        assert_eq!(LinkStore::decode(None), (LinkStore::default(), DocumentOrigin::Missing));
        assert_eq!(
            LinkStore::decode(Some(b"{not json")),
            (LinkStore::default(), DocumentOrigin::Malformed)
        );
        assert_eq!(
            LinkStore::decode(Some(b"[1, 2]")),
            (LinkStore::default(), DocumentOrigin::Malformed)
        );
        assert_eq!(
            LinkStore::decode(Some(br#"{"links": 5}"#)),
            (LinkStore::default(), DocumentOrigin::Malformed)
        );
    }

    #[test]
    fn test_encode_roundtrips_through_decode() {
        let store = store_with(&["https://t.me/a"], &["https://chat.whatsapp.com/B"]);
        let raw = store.encode().expect("encode");
        let text = String::from_utf8(raw.clone()).expect("utf8");
        assert!(text.contains("\"t.me\""));
        assert!(text.contains("\"chat.whatsapp\""));

        let (decoded, origin) = LinkStore::decode(Some(&raw));
        assert_eq!(origin, DocumentOrigin::Current);
        assert_eq!(decoded, store);
    }
}
