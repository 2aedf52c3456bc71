//! View layer for bot UI components
//!
//! Contains keyboards, messages, and formatting for Telegram UI.

pub mod links;
pub mod review;

pub use links::*;
pub use review::*;
