// src/bot/pipeline.rs - Delete / warn / log side effects for a flagged message

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::bot::ledger::WarningLedger;
use crate::platforms::ModerationPlatform;
use crate::types::{
    ChatMessage, DirectNotice, Language, MessageVerdict, ModerationLogEntry, ScopeSettings,
};

/// Log entries never carry more message content than this
pub const MAX_LOG_PREVIEW_CHARS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Skipped,
    Done,
    Failed(String),
}

/// What happened to each side effect of one moderated message
#[derive(Debug, Clone)]
pub struct ActionReport {
    pub incident_id: Uuid,
    pub warning_count: Option<usize>,
    pub delete: StepOutcome,
    pub notify: StepOutcome,
    pub log: StepOutcome,
}

/// Turns a verdict into platform actions according to the scope's settings.
///
/// The warning is recorded before `handle` returns so the next message from the
/// same subject sees the updated count. Delete, notify and log run on a spawned
/// task, bounded by a semaphore, and are never retried; a failing step is
/// logged and the remaining steps still run.
pub struct ModerationPipeline {
    platform: Arc<dyn ModerationPlatform>,
    ledger: Arc<WarningLedger>,
    permits: Arc<Semaphore>,
    preview_chars: usize,
}

impl ModerationPipeline {
    pub fn new(
        platform: Arc<dyn ModerationPlatform>,
        ledger: Arc<WarningLedger>,
        max_inflight_actions: usize,
        preview_chars: usize,
    ) -> Self {
        Self {
            platform,
            ledger,
            permits: Arc::new(Semaphore::new(max_inflight_actions.clamp(1, Semaphore::MAX_PERMITS))),
            preview_chars: preview_chars.clamp(1, MAX_LOG_PREVIEW_CHARS),
        }
    }

    pub async fn handle(
        &self,
        message: &ChatMessage,
        verdict: &MessageVerdict,
        settings: &ScopeSettings,
    ) -> JoinHandle<ActionReport> {
        let incident_id = Uuid::new_v4();
        let reason = Self::warning_reason(verdict);

        // Recorded before the delete step runs so the next message from this
        // subject already counts it; delete/notify/log keep their order below
        let warning_count = if settings.warn_users {
            Some(
                self.ledger
                    .add_warning(&message.scope_id, &message.author_id, &reason)
                    .await,
            )
        } else {
            None
        };

        let delete = settings.delete_messages.then(|| message.handle());
        let notice = warning_count.map(|count| {
            Self::build_notice(incident_id, message, verdict, &reason, count)
        });
        let log_target = if settings.log_actions {
            settings.log_channel.clone().map(|channel| {
                (channel, self.build_log_entry(incident_id, message, verdict, settings.delete_messages))
            })
        } else {
            None
        };
        let log_requested = settings.log_actions;

        let platform = Arc::clone(&self.platform);
        let permits = Arc::clone(&self.permits);
        let author_id = message.author_id.clone();

        tokio::spawn(async move {
            let mut report = ActionReport {
                incident_id,
                warning_count,
                delete: StepOutcome::Skipped,
                notify: StepOutcome::Skipped,
                log: StepOutcome::Skipped,
            };

            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Moderation pipeline shut down, dropping actions for incident {}", incident_id);
                    return report;
                }
            };

            if let Some(handle) = delete {
                report.delete = match platform.delete_message(&handle).await {
                    Ok(()) => StepOutcome::Done,
                    Err(e) => {
                        warn!("Failed to delete message {} in #{}: {}", handle.message_id, handle.channel_id, e);
                        StepOutcome::Failed(e.to_string())
                    }
                };
            }

            if let Some(notice) = notice {
                report.notify = match platform.notify_direct(&author_id, &notice).await {
                    Ok(()) => StepOutcome::Done,
                    Err(e) => {
                        // Usually the user has direct messages closed
                        warn!("Could not notify {} about incident {}: {}", author_id, incident_id, e);
                        StepOutcome::Failed(e.to_string())
                    }
                };
            }

            match log_target {
                Some((channel, entry)) => {
                    report.log = match platform.post_to_channel(&channel, &entry).await {
                        Ok(()) => StepOutcome::Done,
                        Err(e) => {
                            warn!("Failed to post moderation log to #{}: {}", channel, e);
                            StepOutcome::Failed(e.to_string())
                        }
                    };
                }
                None if log_requested => {
                    debug!("No log channel configured, incident {} not logged", incident_id);
                }
                None => {}
            }

            info!(
                "Incident {} for {}: delete={:?} notify={:?} log={:?}",
                incident_id, author_id, report.delete, report.notify, report.log
            );
            report
        })
    }

    /// Stop starting new side effects; queued ones are abandoned
    pub fn shutdown(&self) {
        self.permits.close();
        info!("Moderation pipeline closed");
    }

    pub fn warning_reason(verdict: &MessageVerdict) -> String {
        format!(
            "Automatic moderation: {} ({} severity, {})",
            verdict.primary_category(),
            verdict.severity,
            verdict.dominant_language
        )
    }

    fn build_notice(
        incident_id: Uuid,
        message: &ChatMessage,
        verdict: &MessageVerdict,
        reason: &str,
        warning_count: usize,
    ) -> DirectNotice {
        let category = verdict.primary_category();
        let arabic_description = (verdict.dominant_language == Language::Arabic).then(|| {
            format!(
                "رسالتك تخالف قواعد المجتمع: {} (الخطورة: {})",
                category.arabic_label(),
                verdict.severity.arabic_label()
            )
        });

        DirectNotice {
            incident_id,
            scope_id: message.scope_id.clone(),
            reason: reason.to_string(),
            category,
            severity: verdict.severity,
            language: verdict.dominant_language,
            warning_count: Some(warning_count),
            arabic_description,
        }
    }

    fn build_log_entry(
        &self,
        incident_id: Uuid,
        message: &ChatMessage,
        verdict: &MessageVerdict,
        deletion_requested: bool,
    ) -> ModerationLogEntry {
        ModerationLogEntry {
            incident_id,
            author_id: message.author_id.clone(),
            author_name: message.author_name.clone(),
            channel_id: message.channel_id.clone(),
            category: verdict.primary_category(),
            severity: verdict.severity,
            language: verdict.dominant_language,
            matched_terms: verdict.matched_terms(),
            content: truncate_preview(&message.content, self.preview_chars),
            deletion_requested,
            timestamp: message.timestamp,
        }
    }
}

/// Cut `content` to at most `max_chars` characters, marking the cut with "..."
pub fn truncate_preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    if max_chars <= 3 {
        return content.chars().take(max_chars).collect();
    }
    let mut preview: String = content.chars().take(max_chars - 3).collect();
    preview.push_str("...");
    preview
}
