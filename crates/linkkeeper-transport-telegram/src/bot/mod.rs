/// Command and message handlers
pub mod handlers;
/// Sending HTML replies split to Telegram's size limit
pub mod messaging;
/// Resilient messaging with automatic retry for Telegram API operations
pub mod resilient;
/// View layer for UI components (keyboards, messages)
pub mod views;
