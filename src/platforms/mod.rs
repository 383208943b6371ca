use anyhow::Result;
use async_trait::async_trait;

use crate::types::{DirectNotice, MessageHandle, ModerationLogEntry};

pub mod console;

#[cfg(test)]
pub mod recording;

/// Side-effect capabilities the moderation core needs from a chat platform
#[async_trait]
pub trait ModerationPlatform: Send + Sync {
    /// Get the platform identifier (e.g., "discord", "console")
    fn platform_name(&self) -> &str;

    /// Remove a message from its channel
    async fn delete_message(&self, handle: &MessageHandle) -> Result<()>;

    /// Send a private notice to a user; fails when the user does not accept DMs
    async fn notify_direct(&self, subject_id: &str, notice: &DirectNotice) -> Result<()>;

    /// Post a structured moderation log entry to a channel
    async fn post_to_channel(&self, channel_id: &str, entry: &ModerationLogEntry) -> Result<()>;
}
