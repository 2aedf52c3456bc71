//! Review session state machine
//!
//! A review walks a fixed snapshot of stored links one at a time and
//! collects a works/broken verdict for each. Sessions live in a
//! [`ReviewRegistry`] keyed by user identity; a user without an entry is
//! idle. Transport-agnostic: verdicts arrive as plain tokens whether they
//! were typed or sent by a button.

use crate::store::ReviewItem;
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::RwLock;
use tracing::info;

/// Token accepted for a working link.
pub const WORKS_TOKEN: &str = "yes";
/// Arabic synonym for [`WORKS_TOKEN`].
pub const WORKS_TOKEN_AR: &str = "نعم";
/// Token accepted for a broken link.
pub const BROKEN_TOKEN: &str = "no";
/// Arabic synonym for [`BROKEN_TOKEN`].
pub const BROKEN_TOKEN_AR: &str = "لا";

/// A human judgement about one link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The link still works
    Works,
    /// The link is dead and should be removed
    Broken,
}

impl Verdict {
    /// Parses a verdict token, ignoring case and surrounding whitespace.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkkeeper_core::review::Verdict;
    ///
    /// assert_eq!(Verdict::parse(" YES "), Some(Verdict::Works));
    /// assert_eq!(Verdict::parse("لا"), Some(Verdict::Broken));
    /// assert_eq!(Verdict::parse("maybe"), None);
    /// ```
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_lowercase();
        match token.as_str() {
            WORKS_TOKEN | WORKS_TOKEN_AR => Some(Self::Works),
            BROKEN_TOKEN | BROKEN_TOKEN_AR => Some(Self::Broken),
            _ => None,
        }
    }
}

/// The link currently awaiting a verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPrompt {
    /// 1-based position in the snapshot
    pub position: usize,
    /// Snapshot length
    pub total: usize,
    /// Link under review
    pub item: ReviewItem,
}

/// Result of applying one verdict to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewStep {
    /// More links remain; the next one is shown
    Next(ReviewPrompt),
    /// The snapshot is exhausted
    Finished,
}

/// Per-user walk over a snapshot of links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSession {
    snapshot: Vec<ReviewItem>,
    cursor: usize,
    pending_deletions: Vec<ReviewItem>,
}

impl ReviewSession {
    /// Starts a session over `snapshot`. Returns `None` for an empty snapshot.
    #[must_use]
    pub fn new(snapshot: Vec<ReviewItem>) -> Option<Self> {
        if snapshot.is_empty() {
            return None;
        }
        Some(Self {
            snapshot,
            cursor: 0,
            pending_deletions: Vec::new(),
        })
    }

    /// Number of links in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    /// Always `false`: empty sessions are never created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Index of the link awaiting a verdict.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns `true` once every link has a verdict.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.snapshot.len()
    }

    /// The link awaiting a verdict, if any.
    #[must_use]
    pub fn current(&self) -> Option<&ReviewItem> {
        self.snapshot.get(self.cursor)
    }

    /// Prompt for the link awaiting a verdict, if any.
    #[must_use]
    pub fn prompt(&self) -> Option<ReviewPrompt> {
        self.current().map(|item| ReviewPrompt {
            position: self.cursor + 1,
            total: self.snapshot.len(),
            item: item.clone(),
        })
    }

    /// Links marked broken so far, in review order.
    #[must_use]
    pub fn pending_deletions(&self) -> &[ReviewItem] {
        &self.pending_deletions
    }

    /// Records `verdict` for the current link and moves the cursor.
    ///
    /// Calling this on a complete session is a no-op returning `Finished`.
    pub fn record(&mut self, verdict: Verdict) -> ReviewStep {
        let Some(item) = self.current().cloned() else {
            return ReviewStep::Finished;
        };

        if verdict == Verdict::Broken {
            self.pending_deletions.push(item);
        }
        self.cursor += 1;

        self.prompt().map_or(ReviewStep::Finished, ReviewStep::Next)
    }
}

/// Registry of open review sessions
///
/// Generic over the user identity so other transports can reuse it.
pub struct ReviewRegistry<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> {
    sessions: RwLock<HashMap<Id, ReviewSession>>,
}

impl<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> Default
    for ReviewRegistry<Id>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Hash + Eq + Clone + Send + Sync + std::fmt::Debug + 'static> ReviewRegistry<Id> {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Install a session, silently replacing any open one.
    ///
    /// Returns `true` if a previous session was discarded.
    pub async fn start(&self, id: Id, session: ReviewSession) -> bool {
        let mut sessions = self.sessions.write().await;
        let replaced = sessions.insert(id.clone(), session).is_some();
        if replaced {
            info!(user_id = ?id, "Review restarted, previous session discarded");
        }
        replaced
    }

    /// Snapshot of the session for `id`
    pub async fn get(&self, id: &Id) -> Option<ReviewSession> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Check if a review is open for `id`
    pub async fn contains(&self, id: &Id) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(id)
    }

    /// Replace the session for `id` with an updated copy
    pub async fn update(&self, id: Id, session: ReviewSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session);
    }

    /// Remove the session for `id`. Returns `true` if one was open.
    pub async fn remove(&self, id: &Id) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id).is_some()
    }

    /// Number of open sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no session is open
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
