// src/bot/state.rs - Per-scope state arena shared by the ledger and settings

use futures_util::future::join_all;
use log::{debug, error, info};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::storage::{StateStore, StorageResult};
use crate::types::{ScopeSettings, ScopeSnapshot, WarningEntry};

/// Live state of one scope.
///
/// Settings and warnings have their own locks so settings reads never wait on
/// warning writes. `persist_lock` orders saves of this scope.
pub struct ScopeState {
    pub(crate) settings: RwLock<ScopeSettings>,
    pub(crate) warnings: Mutex<HashMap<String, Vec<WarningEntry>>>,
    persist_lock: Mutex<()>,
}

impl ScopeState {
    fn new(snapshot: ScopeSnapshot) -> Self {
        Self {
            settings: RwLock::new(snapshot.settings),
            warnings: Mutex::new(snapshot.warnings.into_iter().collect()),
            persist_lock: Mutex::new(()),
        }
    }

    pub async fn snapshot(&self) -> ScopeSnapshot {
        let settings = self.settings.read().await.clone();
        let warnings: BTreeMap<String, Vec<WarningEntry>> = self
            .warnings
            .lock()
            .await
            .iter()
            .map(|(subject, entries)| (subject.clone(), entries.clone()))
            .collect();
        ScopeSnapshot { settings, warnings }
    }
}

/// Scope id -> state. Scopes are created lazily with the default settings.
pub struct ScopeRegistry {
    scopes: RwLock<HashMap<String, Arc<ScopeState>>>,
    defaults: ScopeSettings,
    store: Arc<dyn StateStore>,
    pending_saves: Mutex<Vec<JoinHandle<()>>>,
}

impl ScopeRegistry {
    pub fn new(store: Arc<dyn StateStore>, defaults: ScopeSettings) -> Self {
        Self {
            scopes: RwLock::new(HashMap::new()),
            defaults,
            store,
            pending_saves: Mutex::new(Vec::new()),
        }
    }

    /// Load every persisted scope; returns how many were loaded
    pub async fn load_all(&self) -> StorageResult<usize> {
        let scope_ids = self.store.list_scopes().await?;
        let mut loaded = 0;

        for scope_id in scope_ids {
            if let Some(snapshot) = self.store.load_scope_state(&scope_id).await? {
                self.scopes
                    .write()
                    .await
                    .insert(scope_id, Arc::new(ScopeState::new(snapshot)));
                loaded += 1;
            }
        }

        info!("Loaded moderation state for {} scopes", loaded);
        Ok(loaded)
    }

    /// State of a scope, created on first access
    pub async fn scope(&self, scope_id: &str) -> Arc<ScopeState> {
        if let Some(state) = self.scopes.read().await.get(scope_id) {
            return Arc::clone(state);
        }

        let mut scopes = self.scopes.write().await;
        let state = scopes.entry(scope_id.to_string()).or_insert_with(|| {
            debug!("Initializing moderation state for scope {}", scope_id);
            Arc::new(ScopeState::new(ScopeSnapshot {
                settings: self.defaults.clone(),
                warnings: BTreeMap::new(),
            }))
        });
        Arc::clone(state)
    }

    /// Queue a save of a scope's current state and return without waiting for
    /// the store. Failures are logged and swallowed; the in-memory state stays
    /// authoritative. The snapshot is taken once the scope's persist lock is
    /// held, so the last save to finish always carries the latest state.
    pub async fn persist(&self, scope_id: &str, state: Arc<ScopeState>) {
        let store = Arc::clone(&self.store);
        let scope_id = scope_id.to_string();

        let save = tokio::spawn(async move {
            let _guard = state.persist_lock.lock().await;
            let snapshot = state.snapshot().await;

            if let Err(e) = store.save_scope_state(&scope_id, &snapshot).await {
                error!("Failed to persist moderation state for scope {}: {}", scope_id, e);
            }
        });

        let mut pending = self.pending_saves.lock().await;
        pending.retain(|handle| !handle.is_finished());
        pending.push(save);
    }

    /// Wait for every queued save to finish
    pub async fn flush(&self) {
        let pending = std::mem::take(&mut *self.pending_saves.lock().await);
        if pending.is_empty() {
            return;
        }

        debug!("Waiting for {} pending state saves", pending.len());
        for result in join_all(pending).await {
            if let Err(e) = result {
                error!("State save task failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_lazy_scope_creation_uses_defaults() {
        let defaults = ScopeSettings {
            delete_messages: false,
            ..ScopeSettings::default()
        };
        let registry = ScopeRegistry::new(Arc::new(MemoryStore::new()), defaults.clone());

        let state = registry.scope("guild").await;
        assert_eq!(*state.settings.read().await, defaults);
        assert!(state.warnings.lock().await.is_empty());
        assert!(registry.scopes.read().await.contains_key("guild"));
    }

    #[tokio::test]
    async fn test_same_scope_returns_same_state() {
        let registry = ScopeRegistry::new(Arc::new(MemoryStore::new()), ScopeSettings::default());
        let first = registry.scope("guild").await;
        let second = registry.scope("guild").await;
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let registry = ScopeRegistry::new(Arc::clone(&store), ScopeSettings::default());

        let state = registry.scope("guild").await;
        state.settings.write().await.log_channel = Some("logs".to_string());
        state
            .warnings
            .lock()
            .await
            .insert("user".to_string(), vec![WarningEntry::new("spam")]);
        registry.persist("guild", Arc::clone(&state)).await;
        registry.flush().await;

        let reloaded = ScopeRegistry::new(store, ScopeSettings::default());
        assert_eq!(reloaded.load_all().await.unwrap(), 1);
        let state = reloaded.scope("guild").await;
        assert_eq!(state.settings.read().await.log_channel.as_deref(), Some("logs"));
        assert_eq!(state.warnings.lock().await["user"].len(), 1);
    }
}
