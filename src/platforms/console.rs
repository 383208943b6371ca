use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};
use serde_json::json;

use crate::platforms::ModerationPlatform;
use crate::types::{ChatMessage, DirectNotice, MessageHandle, ModerationLogEntry};

/// Prefix marking a console user as a moderator
pub const MODERATOR_PREFIX: &str = "mod:";

/// Line-oriented platform for local runs: messages are read as
/// `<scope> <channel> <user> <text...>` and every action is printed as a JSON line.
pub struct ConsolePlatform {
    next_message_id: std::sync::atomic::AtomicU64,
}

impl ConsolePlatform {
    pub fn new() -> Self {
        Self {
            next_message_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Parse one input line; `None` for blank or incomplete lines
    pub fn parse_line(&self, line: &str) -> Option<ChatMessage> {
        let mut parts = line.trim().splitn(4, char::is_whitespace);
        let scope_id = parts.next().filter(|s| !s.is_empty())?;
        let channel_id = parts.next()?;
        let user = parts.next()?;
        let content = parts.next().unwrap_or("").trim();

        let (author, is_moderator) = match user.strip_prefix(MODERATOR_PREFIX) {
            Some(name) if !name.is_empty() => (name, true),
            _ => (user, false),
        };

        let id = self
            .next_message_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        Some(ChatMessage {
            message_id: id.to_string(),
            scope_id: scope_id.to_string(),
            channel_id: channel_id.to_string(),
            author_id: author.to_string(),
            author_name: author.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            is_moderator,
        })
    }

    fn emit(&self, value: serde_json::Value) -> Result<()> {
        let line = serde_json::to_string(&value).context("Failed to encode console action")?;
        println!("{}", line);
        Ok(())
    }
}

impl Default for ConsolePlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModerationPlatform for ConsolePlatform {
    fn platform_name(&self) -> &str {
        "console"
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<()> {
        info!("Deleting message {} in #{}", handle.message_id, handle.channel_id);
        self.emit(json!({ "action": "delete", "message": handle }))
    }

    async fn notify_direct(&self, subject_id: &str, notice: &DirectNotice) -> Result<()> {
        debug!("Direct notice to {}: {}", subject_id, notice.reason);
        self.emit(json!({ "action": "notify", "user": subject_id, "notice": notice }))
    }

    async fn post_to_channel(&self, channel_id: &str, entry: &ModerationLogEntry) -> Result<()> {
        self.emit(json!({ "action": "log", "channel": channel_id, "entry": entry }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        let platform = ConsolePlatform::new();
        let message = platform.parse_line("guild general alice hello there  friend").unwrap();
        assert_eq!(message.scope_id, "guild");
        assert_eq!(message.channel_id, "general");
        assert_eq!(message.author_id, "alice");
        assert_eq!(message.content, "hello there  friend");
        assert!(!message.is_moderator);
        assert_eq!(message.message_id, "1");
    }

    #[test]
    fn test_parse_moderator_line() {
        let platform = ConsolePlatform::new();
        let message = platform.parse_line("guild general mod:bob !warnings alice").unwrap();
        assert_eq!(message.author_id, "bob");
        assert!(message.is_moderator);
    }

    #[test]
    fn test_parse_incomplete_lines() {
        let platform = ConsolePlatform::new();
        assert!(platform.parse_line("").is_none());
        assert!(platform.parse_line("guild general").is_none());
        let empty = platform.parse_line("guild general alice").unwrap();
        assert_eq!(empty.content, "");
    }
}
