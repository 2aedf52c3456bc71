//! Link collector service
//!
//! Owns the in-memory [`LinkStore`], the persistence backend and the review
//! sessions. Every mutation is applied to a copy of the store, written out,
//! and only then committed, so the in-memory store never runs ahead of the
//! durable document.

use crate::links::extract_links;
use crate::review::{ReviewPrompt, ReviewRegistry, ReviewSession, ReviewStep, Verdict};
use crate::storage::{DocumentStorage, StorageError};
use crate::store::{DocumentOrigin, IngestReport, LinkStore, PlatformBuckets};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// User identity as delivered by the transport
pub type UserId = i64;

/// Result of a review-start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewStart {
    /// Every stored link is already confirmed (or the store is empty)
    NothingToReview,
    /// A session was opened
    Started {
        /// First link to judge
        prompt: ReviewPrompt,
        /// `true` if an open session was discarded
        restarted: bool,
    },
}

/// Summary reported when a review completes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewSummary {
    /// Links judged in this review
    pub reviewed: usize,
    /// Links removed from the store
    pub removed: usize,
}

/// Result of handing a verdict token to the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictOutcome {
    /// The user has no open review
    NoActiveReview,
    /// The token was not a verdict; the same link is still pending
    Unrecognized(ReviewPrompt),
    /// Verdict recorded; the next link is pending
    Next(ReviewPrompt),
    /// Verdict recorded and the review is over
    Completed(ReviewSummary),
}

/// Collects links from messages and runs reviews over them
pub struct LinkCollector {
    storage: Arc<dyn DocumentStorage>,
    store: Mutex<LinkStore>,
    sessions: ReviewRegistry<UserId>,
    review_limit: Option<usize>,
}

impl LinkCollector {
    /// Load the store from `storage`.
    ///
    /// A missing or malformed document starts an empty store. A legacy
    /// document is upgraded and written back immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read, or if writing back an
    /// upgraded legacy document fails.
    pub async fn open(
        storage: Arc<dyn DocumentStorage>,
        review_limit: Option<usize>,
    ) -> Result<Self, StorageError> {
        let raw = storage.read_document().await?;
        let (store, origin) = LinkStore::decode(raw.as_deref());

        match origin {
            DocumentOrigin::Current => info!(
                "Link store loaded: {} Telegram, {} WhatsApp links",
                store.links.telegram.len(),
                store.links.whatsapp.len()
            ),
            DocumentOrigin::Missing => info!("No link store found, starting empty."),
            DocumentOrigin::Malformed => warn!("Link store was unreadable, starting empty."),
            DocumentOrigin::Legacy => {
                storage.write_document(store.encode()?).await?;
                info!(
                    "Legacy link store upgraded: {} links",
                    store.links.total()
                );
            }
        }

        Ok(Self {
            storage,
            store: Mutex::new(store),
            sessions: ReviewRegistry::new(),
            review_limit,
        })
    }

    async fn persist(&self, store: &LinkStore) -> Result<(), StorageError> {
        self.storage.write_document(store.encode()?).await
    }

    /// Extract links from `text` and add the new ones to the store.
    ///
    /// The store is written once, and only if something was added.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails; the store is then unchanged.
    pub async fn submit_text(&self, user_id: UserId, text: &str) -> Result<IngestReport, StorageError> {
        let extracted = extract_links(text);
        if extracted.is_empty() {
            return Ok(IngestReport::default());
        }

        let mut store = self.store.lock().await;
        let mut updated = store.clone();
        let report = updated.ingest(&extracted);

        if report.has_new() {
            self.persist(&updated).await?;
            *store = updated;
        }

        info!(
            user_id,
            added = report.added.total(),
            duplicates = report.duplicates,
            "Links submitted"
        );
        Ok(report)
    }

    /// Open a review over every link not yet confirmed working.
    ///
    /// An open session for the same user is discarded.
    pub async fn begin_review(&self, user_id: UserId) -> ReviewStart {
        let store = self.store.lock().await;
        let snapshot = store.unchecked(self.review_limit);

        let Some(session) = ReviewSession::new(snapshot) else {
            // Starting a review always discards the open one
            self.sessions.remove(&user_id).await;
            debug!(user_id, "Nothing to review");
            return ReviewStart::NothingToReview;
        };

        let Some(prompt) = session.prompt() else {
            return ReviewStart::NothingToReview;
        };

        info!(user_id, links = session.len(), "Review started");
        let restarted = self.sessions.start(user_id, session).await;
        ReviewStart::Started { prompt, restarted }
    }

    /// Feed a verdict token for the link currently shown to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting fails. The session then stays on the
    /// same link and the verdict can be sent again.
    pub async fn receive_verdict(
        &self,
        user_id: UserId,
        token: &str,
    ) -> Result<VerdictOutcome, StorageError> {
        let mut store = self.store.lock().await;

        let Some(mut session) = self.sessions.get(&user_id).await else {
            return Ok(VerdictOutcome::NoActiveReview);
        };
        let Some(current) = session.current().cloned() else {
            self.sessions.remove(&user_id).await;
            return Ok(VerdictOutcome::NoActiveReview);
        };

        let Some(verdict) = Verdict::parse(token) else {
            debug!(user_id, "Unrecognized verdict token");
            return Ok(session
                .prompt()
                .map_or(VerdictOutcome::NoActiveReview, VerdictOutcome::Unrecognized));
        };

        let mut updated = store.clone();
        let mut dirty = verdict == Verdict::Works && updated.mark_checked(&current);

        let step = session.record(verdict);
        let removed = if step == ReviewStep::Finished {
            let removed = updated.apply_deletions(session.pending_deletions());
            dirty |= !session.pending_deletions().is_empty();
            Some(removed)
        } else {
            None
        };

        if dirty {
            self.persist(&updated).await?;
            *store = updated;
        }

        match (step, removed) {
            (ReviewStep::Next(prompt), _) => {
                self.sessions.update(user_id, session).await;
                Ok(VerdictOutcome::Next(prompt))
            }
            (ReviewStep::Finished, removed) => {
                self.sessions.remove(&user_id).await;
                let summary = ReviewSummary {
                    reviewed: session.len(),
                    removed: removed.unwrap_or(0),
                };
                info!(
                    user_id,
                    reviewed = summary.reviewed,
                    removed = summary.removed,
                    "Review completed"
                );
                Ok(VerdictOutcome::Completed(summary))
            }
        }
    }

    /// Abandon the open review without applying its deletions.
    ///
    /// Returns `true` if a review was open.
    pub async fn cancel_review(&self, user_id: UserId) -> bool {
        let cancelled = self.sessions.remove(&user_id).await;
        if cancelled {
            info!(user_id, "Review cancelled");
        }
        cancelled
    }

    /// Returns `true` if `user_id` has a review awaiting a verdict.
    pub async fn is_reviewing(&self, user_id: UserId) -> bool {
        self.sessions.contains(&user_id).await
    }

    /// The link awaiting a verdict from `user_id`, if any.
    pub async fn current_prompt(&self, user_id: UserId) -> Option<ReviewPrompt> {
        self.sessions.get(&user_id).await?.prompt()
    }

    /// Copy of the stored links.
    pub async fn stored_links(&self) -> PlatformBuckets {
        self.store.lock().await.links.clone()
    }

    /// Check that the persistence medium is reachable.
    ///
    /// # Errors
    ///
    /// Returns the backend's error message.
    pub async fn check_storage(&self) -> Result<(), String> {
        self.storage.check_connection().await
    }
}

/// One page of links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPage<'a> {
    /// 1-based page number
    pub number: usize,
    /// Links on this page
    pub links: &'a [String],
}

/// Split `links` into pages of `page_size`.
///
/// A `page_size` of zero is treated as one.
#[must_use]
pub fn paginate(links: &[String], page_size: usize) -> Vec<LinkPage<'_>> {
    links
        .chunks(page_size.max(1))
        .enumerate()
        .map(|(i, links)| LinkPage { number: i + 1, links })
        .collect()
}
