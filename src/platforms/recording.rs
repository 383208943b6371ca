use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::platforms::ModerationPlatform;
use crate::types::{DirectNotice, MessageHandle, ModerationLogEntry};

/// Test double that records every call and can fail each capability on demand
#[derive(Default)]
pub struct RecordingPlatform {
    pub deleted: Mutex<Vec<MessageHandle>>,
    pub notices: Mutex<Vec<(String, DirectNotice)>>,
    pub posts: Mutex<Vec<(String, ModerationLogEntry)>>,
    pub fail_delete: AtomicBool,
    pub fail_notify: AtomicBool,
    pub fail_post: AtomicBool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_everything() -> Self {
        let platform = Self::new();
        platform.fail_delete.store(true, Ordering::SeqCst);
        platform.fail_notify.store(true, Ordering::SeqCst);
        platform.fail_post.store(true, Ordering::SeqCst);
        platform
    }
}

#[async_trait]
impl ModerationPlatform for RecordingPlatform {
    fn platform_name(&self) -> &str {
        "recording"
    }

    async fn delete_message(&self, handle: &MessageHandle) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(anyhow!("Missing permission: manage messages"));
        }
        self.deleted.lock().await.push(handle.clone());
        Ok(())
    }

    async fn notify_direct(&self, subject_id: &str, notice: &DirectNotice) -> Result<()> {
        if self.fail_notify.load(Ordering::SeqCst) {
            return Err(anyhow!("Cannot send messages to this user"));
        }
        self.notices.lock().await.push((subject_id.to_string(), notice.clone()));
        Ok(())
    }

    async fn post_to_channel(&self, channel_id: &str, entry: &ModerationLogEntry) -> Result<()> {
        if self.fail_post.load(Ordering::SeqCst) {
            return Err(anyhow!("Unknown channel {}", channel_id));
        }
        self.posts.lock().await.push((channel_id.to_string(), entry.clone()));
        Ok(())
    }
}
