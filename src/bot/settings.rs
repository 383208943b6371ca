use log::info;
use std::sync::Arc;

use crate::bot::state::ScopeRegistry;
use crate::types::{ScopeSettings, SettingFlag};

/// Reads and explicit updates of per-scope settings
pub struct SettingsManager {
    registry: Arc<ScopeRegistry>,
}

impl SettingsManager {
    pub fn new(registry: Arc<ScopeRegistry>) -> Self {
        Self { registry }
    }

    pub async fn get(&self, scope_id: &str) -> ScopeSettings {
        let state = self.registry.scope(scope_id).await;
        let settings = state.settings.read().await.clone();
        settings
    }

    /// Apply `change` to the scope's settings, persist, and return the result
    pub async fn update<F>(&self, scope_id: &str, change: F) -> ScopeSettings
    where
        F: FnOnce(&mut ScopeSettings),
    {
        let state = self.registry.scope(scope_id).await;
        let updated = {
            let mut settings = state.settings.write().await;
            change(&mut settings);
            settings.clone()
        };

        self.registry.persist(scope_id, state).await;
        updated
    }

    pub async fn set_flag(&self, scope_id: &str, flag: SettingFlag, value: bool) -> ScopeSettings {
        info!("Scope {}: {} -> {}", scope_id, flag.name(), if value { "on" } else { "off" });
        self.update(scope_id, |settings| flag.set(settings, value)).await
    }

    pub async fn set_log_channel(&self, scope_id: &str, channel_id: Option<String>) -> ScopeSettings {
        info!("Scope {}: log channel -> {:?}", scope_id, channel_id);
        self.update(scope_id, |settings| settings.log_channel = channel_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, StateStore};

    fn manager(store: Arc<dyn StateStore>) -> SettingsManager {
        SettingsManager::new(Arc::new(ScopeRegistry::new(store, ScopeSettings::default())))
    }

    #[tokio::test]
    async fn test_defaults_on_first_access() {
        let settings = manager(Arc::new(MemoryStore::new())).get("fresh").await;
        assert_eq!(settings, ScopeSettings::default());
        assert!(settings.enabled);
    }

    #[tokio::test]
    async fn test_flag_updates_are_persisted() {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(ScopeRegistry::new(store.clone(), ScopeSettings::default()));
        let manager = SettingsManager::new(Arc::clone(&registry));

        let updated = manager.set_flag("guild", SettingFlag::CheckArabic, false).await;
        assert!(!updated.check_arabic);
        assert!(!manager.get("guild").await.check_arabic);

        manager.set_log_channel("guild", Some("mod-log".to_string())).await;
        registry.flush().await;
        let saved = store.load_scope_state("guild").await.unwrap().unwrap();
        assert!(!saved.settings.check_arabic);
        assert_eq!(saved.settings.log_channel.as_deref(), Some("mod-log"));
    }

    #[tokio::test]
    async fn test_scopes_do_not_share_settings() {
        let manager = manager(Arc::new(MemoryStore::new()));
        manager.set_flag("guild-a", SettingFlag::Enabled, false).await;
        assert!(!manager.get("guild-a").await.enabled);
        assert!(manager.get("guild-b").await.enabled);
    }
}
