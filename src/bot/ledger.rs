use log::info;
use std::sync::Arc;

use crate::bot::state::ScopeRegistry;
use crate::types::WarningEntry;

/// Append-only warning history per (scope, subject).
///
/// Appends for one scope are serialized by the scope's warning lock, so
/// concurrent `add_warning` calls never lose entries. Every mutation is
/// followed by a save through the registry.
pub struct WarningLedger {
    registry: Arc<ScopeRegistry>,
}

impl WarningLedger {
    pub fn new(registry: Arc<ScopeRegistry>) -> Self {
        Self { registry }
    }

    /// Record a warning and return the subject's new warning count
    pub async fn add_warning(&self, scope_id: &str, subject_id: &str, reason: &str) -> usize {
        let state = self.registry.scope(scope_id).await;

        let count = {
            let mut warnings = state.warnings.lock().await;
            let entries = warnings.entry(subject_id.to_string()).or_default();
            entries.push(WarningEntry::new(reason));
            entries.len()
        };

        info!("Warned {} in scope {} ({} total): {}", subject_id, scope_id, count, reason);
        self.registry.persist(scope_id, state).await;
        count
    }

    /// Warnings of a subject in call order, empty if none were recorded
    pub async fn get_warnings(&self, scope_id: &str, subject_id: &str) -> Vec<WarningEntry> {
        let state = self.registry.scope(scope_id).await;
        let warnings = state.warnings.lock().await;
        warnings.get(subject_id).cloned().unwrap_or_default()
    }

    pub async fn warning_count(&self, scope_id: &str, subject_id: &str) -> usize {
        let state = self.registry.scope(scope_id).await;
        let warnings = state.warnings.lock().await;
        warnings.get(subject_id).map(Vec::len).unwrap_or(0)
    }

    /// Drop a subject's whole history; false if there was nothing to clear
    pub async fn clear_warnings(&self, scope_id: &str, subject_id: &str) -> bool {
        let state = self.registry.scope(scope_id).await;
        let removed = state.warnings.lock().await.remove(subject_id).is_some();

        if removed {
            info!("Cleared warnings for {} in scope {}", subject_id, scope_id);
            self.registry.persist(scope_id, state).await;
        }
        removed
    }
}
