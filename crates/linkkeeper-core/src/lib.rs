#![deny(missing_docs)]
//! Linkkeeper core library.
//!
//! Transport-agnostic logic for collecting Telegram and WhatsApp links:
//! extraction, normalization, the persisted link store and the review flow.

/// Collector service combining the store, persistence and review sessions.
pub mod collector;
/// Configuration management.
pub mod config;
/// Link extraction and normalization.
pub mod links;
/// Review session state machine and registry.
pub mod review;
/// Persistence backends (local file, R2/S3).
pub mod storage;
/// Link store document.
pub mod store;

#[cfg(test)]
pub mod testing;

pub use collector::LinkCollector;
pub use links::{extract_links, normalize_link, Platform};
