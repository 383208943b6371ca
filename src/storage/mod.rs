// src/storage/mod.rs - Scope state persistence

use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

use crate::config::PersistenceSettings;
use crate::types::ScopeSnapshot;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("state file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state document could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("state store unavailable: {0}")]
    Unavailable(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Key-value persistence for per-scope settings and warnings
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state of a scope, `None` if it was never saved
    async fn load_scope_state(&self, scope_id: &str) -> StorageResult<Option<ScopeSnapshot>>;

    /// Replace the persisted state of a scope
    async fn save_scope_state(&self, scope_id: &str, snapshot: &ScopeSnapshot) -> StorageResult<()>;

    /// Every scope id with persisted state
    async fn list_scopes(&self) -> StorageResult<Vec<String>>;
}

/// In-process store, used when persistence is disabled
#[derive(Default)]
pub struct MemoryStore {
    scopes: RwLock<HashMap<String, ScopeSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_scope_state(&self, scope_id: &str) -> StorageResult<Option<ScopeSnapshot>> {
        Ok(self.scopes.read().await.get(scope_id).cloned())
    }

    async fn save_scope_state(&self, scope_id: &str, snapshot: &ScopeSnapshot) -> StorageResult<()> {
        self.scopes.write().await.insert(scope_id.to_string(), snapshot.clone());
        Ok(())
    }

    async fn list_scopes(&self) -> StorageResult<Vec<String>> {
        let mut scopes: Vec<String> = self.scopes.read().await.keys().cloned().collect();
        scopes.sort();
        Ok(scopes)
    }
}

/// All scopes in a single JSON document: `{ "<scope id>": { "settings": .., "warnings": .. } }`
pub struct JsonFileStore {
    path: PathBuf,
    document: Mutex<BTreeMap<String, ScopeSnapshot>>,
}

impl JsonFileStore {
    /// Open the state file, starting from an empty document when it is missing
    /// or unreadable
    pub async fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|source| StorageError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
                info!("Created state directory: {}", parent.display());
            }
        }

        let document = match fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(document) => document,
                Err(e) => {
                    warn!("State file {} is corrupt, starting empty: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No state file at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        info!("Opened state file {} ({} scopes)", path.display(), document.len());
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    async fn write_document(&self, document: &BTreeMap<String, ScopeSnapshot>) -> StorageResult<()> {
        let content = serde_json::to_string_pretty(document)?;
        let temp_path = self.path.with_extension("json.tmp");

        fs::write(&temp_path, content).await.map_err(|source| StorageError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, &self.path).await.map_err(|source| StorageError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn load_scope_state(&self, scope_id: &str) -> StorageResult<Option<ScopeSnapshot>> {
        Ok(self.document.lock().await.get(scope_id).cloned())
    }

    async fn save_scope_state(&self, scope_id: &str, snapshot: &ScopeSnapshot) -> StorageResult<()> {
        let mut document = self.document.lock().await;
        document.insert(scope_id.to_string(), snapshot.clone());
        self.write_document(&document).await?;
        debug!("Saved state for scope {} to {}", scope_id, self.path.display());
        Ok(())
    }

    async fn list_scopes(&self) -> StorageResult<Vec<String>> {
        Ok(self.document.lock().await.keys().cloned().collect())
    }
}

/// Pick the store for the configured persistence mode. A state file that cannot
/// be opened is logged and replaced by an in-memory store so the engine still starts.
pub async fn open_store(settings: &PersistenceSettings) -> Arc<dyn StateStore> {
    if !settings.enabled {
        warn!("Persistence disabled, warnings will be lost on exit");
        return Arc::new(MemoryStore::new());
    }

    match JsonFileStore::open(&settings.state_file).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Could not open state file, keeping state in memory only: {}", e);
            Arc::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WarningEntry;
    use tempfile::tempdir;

    fn sample_snapshot() -> ScopeSnapshot {
        let mut snapshot = ScopeSnapshot::default();
        snapshot.settings.delete_messages = false;
        snapshot.settings.log_channel = Some("mod-log".to_string());
        snapshot.warnings.insert(
            "user-1".to_string(),
            vec![WarningEntry::new("first"), WarningEntry::new("second")],
        );
        snapshot
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load_scope_state("guild").await.unwrap().is_none());

        let snapshot = sample_snapshot();
        store.save_scope_state("guild", &snapshot).await.unwrap();
        assert_eq!(store.load_scope_state("guild").await.unwrap(), Some(snapshot));
        assert_eq!(store.list_scopes().await.unwrap(), vec!["guild".to_string()]);
    }

    #[tokio::test]
    async fn test_json_store_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("state").join("moderation.json");

        let snapshot = sample_snapshot();
        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.save_scope_state("guild-a", &snapshot).await.unwrap();
            store.save_scope_state("guild-b", &ScopeSnapshot::default()).await.unwrap();
        }
        assert!(path.exists());

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.load_scope_state("guild-a").await.unwrap(), Some(snapshot));
        assert_eq!(
            reopened.list_scopes().await.unwrap(),
            vec!["guild-a".to_string(), "guild-b".to_string()]
        );
    }

    #[tokio::test]
    async fn test_json_store_document_is_keyed_by_scope() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("moderation.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        store.save_scope_state("1234", &sample_snapshot()).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["1234"]["settings"]["log_channel"], "mod-log");
        assert_eq!(raw["1234"]["warnings"]["user-1"][1]["reason"], "second");
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("moderation.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path).await.unwrap();
        assert!(store.list_scopes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_state_file_falls_back_to_memory() {
        let dir = tempdir().unwrap();
        // A directory where the file should be cannot be read as a document
        let settings = PersistenceSettings {
            enabled: true,
            state_file: dir.path().to_path_buf(),
        };
        assert!(JsonFileStore::open(&settings.state_file).await.is_err());

        let store = open_store(&settings).await;
        let snapshot = sample_snapshot();
        store.save_scope_state("guild", &snapshot).await.unwrap();
        assert_eq!(store.load_scope_state("guild").await.unwrap(), Some(snapshot));
        assert!(dir.path().is_dir());
    }

    #[tokio::test]
    async fn test_open_store_follows_persistence_flag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let disabled = PersistenceSettings {
            enabled: false,
            state_file: path.clone(),
        };
        open_store(&disabled).await.save_scope_state("guild", &sample_snapshot()).await.unwrap();
        assert!(!path.exists());

        let enabled = PersistenceSettings { enabled: true, ..disabled };
        open_store(&enabled).await.save_scope_state("guild", &sample_snapshot()).await.unwrap();
        assert!(path.exists());
    }
}
