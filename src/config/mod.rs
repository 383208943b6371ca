// src/config/mod.rs - Engine configuration (YAML file + environment overrides)

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Semaphore;

use crate::bot::pipeline::MAX_LOG_PREVIEW_CHARS;
use crate::types::ScopeSettings;

pub const DEFAULT_CONFIG_FILE: &str = "modguard.yaml";

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Prefix for moderator commands, e.g. "!" for "!warnings"
    pub command_prefix: String,
    pub persistence: PersistenceSettings,
    pub pipeline: PipelineSettings,
    pub matching: MatchingSettings,
    /// Settings given to a scope the first time it is seen
    pub default_scope: ScopeSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    pub enabled: bool,
    pub state_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Upper bound on concurrently running delete/notify/log tasks
    pub max_inflight_actions: usize,
    /// Characters of message content kept in log entries
    pub log_preview_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub min_variant_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            persistence: PersistenceSettings::default(),
            pipeline: PipelineSettings::default(),
            matching: MatchingSettings::default(),
            default_scope: ScopeSettings::default(),
        }
    }
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            state_file: PathBuf::from("data/moderation_state.json"),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_inflight_actions: 32,
            log_preview_chars: MAX_LOG_PREVIEW_CHARS,
        }
    }
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self { min_variant_length: 3 }
    }
}

impl EngineConfig {
    /// Load the configuration file, writing a default one if it does not exist.
    /// Environment overrides are applied and the result is validated.
    pub async fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config = Self::from_yaml(&content)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            debug!("Loaded engine configuration from {}", path.display());
            config
        } else {
            let config = Self::default();
            config.save(path).await?;
            info!("Created default engine configuration: {}", path.display());
            config
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Apply MODGUARD_* environment variables on top of the file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(state_file) = lookup("MODGUARD_STATE_FILE") {
            self.persistence.state_file = PathBuf::from(state_file);
        }

        if let Some(prefix) = lookup("MODGUARD_COMMAND_PREFIX") {
            self.command_prefix = prefix;
        }

        if let Some(value) = lookup("MODGUARD_MAX_INFLIGHT_ACTIONS") {
            self.pipeline.max_inflight_actions = value
                .trim()
                .parse()
                .with_context(|| format!("MODGUARD_MAX_INFLIGHT_ACTIONS must be a number, got '{}'", value))?;
        }

        if let Some(value) = lookup("MODGUARD_PERSISTENCE") {
            self.persistence.enabled = match value.trim().to_lowercase().as_str() {
                "on" | "true" | "1" | "yes" => true,
                "off" | "false" | "0" | "no" => false,
                other => return Err(anyhow!("MODGUARD_PERSISTENCE must be on or off, got '{}'", other)),
            };
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.command_prefix.trim().is_empty() {
            return Err(anyhow!("Command prefix cannot be empty"));
        }

        if self.pipeline.max_inflight_actions == 0
            || self.pipeline.max_inflight_actions > Semaphore::MAX_PERMITS
        {
            return Err(anyhow!(
                "max_inflight_actions must be between 1 and {}",
                Semaphore::MAX_PERMITS
            ));
        }

        if self.pipeline.log_preview_chars == 0 || self.pipeline.log_preview_chars > MAX_LOG_PREVIEW_CHARS {
            return Err(anyhow!(
                "log_preview_chars must be between 1 and {}",
                MAX_LOG_PREVIEW_CHARS
            ));
        }

        if self.matching.min_variant_length == 0 {
            return Err(anyhow!("min_variant_length must be at least 1"));
        }

        if self.persistence.enabled && self.persistence.state_file.as_os_str().is_empty() {
            return Err(anyhow!("state_file is required when persistence is enabled"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_creates_default_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("modguard.yaml");

        let config = EngineConfig::load_or_create(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(config.pipeline.max_inflight_actions, 32);

        let reloaded = EngineConfig::load_or_create(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modguard.yaml");
        tokio::fs::write(
            &path,
            "command_prefix: \"?\"\ndefault_scope:\n  check_arabic: false\n  log_channel: mod-log\n",
        )
        .await
        .unwrap();

        let config = EngineConfig::load_or_create(&path).await.unwrap();
        assert_eq!(config.command_prefix, "?");
        assert!(!config.default_scope.check_arabic);
        assert!(config.default_scope.delete_messages);
        assert_eq!(config.default_scope.log_channel.as_deref(), Some("mod-log"));
        assert_eq!(config.matching.min_variant_length, 3);
    }

    #[tokio::test]
    async fn test_invalid_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("modguard.yaml");
        tokio::fs::write(&path, "pipeline:\n  log_preview_chars: 5000\n").await.unwrap();
        assert!(EngineConfig::load_or_create(&path).await.is_err());

        tokio::fs::write(&path, "pipeline: [not, a, map]\n").await.unwrap();
        assert!(EngineConfig::load_or_create(&path).await.is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = EngineConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("MODGUARD_STATE_FILE", "/tmp/state.json"),
                ("MODGUARD_COMMAND_PREFIX", "$"),
                ("MODGUARD_MAX_INFLIGHT_ACTIONS", "4"),
                ("MODGUARD_PERSISTENCE", "off"),
            ]))
            .unwrap();

        assert_eq!(config.persistence.state_file, PathBuf::from("/tmp/state.json"));
        assert_eq!(config.command_prefix, "$");
        assert_eq!(config.pipeline.max_inflight_actions, 4);
        assert!(!config.persistence.enabled);
    }

    #[test]
    fn test_oversized_inflight_override_is_rejected() {
        let mut config = EngineConfig::default();
        let huge = (Semaphore::MAX_PERMITS + 1).to_string();
        config
            .apply_overrides(lookup_from(&[("MODGUARD_MAX_INFLIGHT_ACTIONS", huge.as_str())]))
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_env_values() {
        let mut config = EngineConfig::default();
        assert!(config
            .apply_overrides(lookup_from(&[("MODGUARD_MAX_INFLIGHT_ACTIONS", "lots")]))
            .is_err());
        assert!(config
            .apply_overrides(lookup_from(&[("MODGUARD_PERSISTENCE", "sometimes")]))
            .is_err());
    }

    #[test]
    fn test_validation() {
        assert!(EngineConfig::default().validate().is_ok());

        let mut config = EngineConfig::default();
        config.command_prefix = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.pipeline.max_inflight_actions = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.pipeline.max_inflight_actions = Semaphore::MAX_PERMITS;
        assert!(config.validate().is_ok());
        config.pipeline.max_inflight_actions = Semaphore::MAX_PERMITS + 1;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.pipeline.log_preview_chars = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.matching.min_variant_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(EngineConfig::from_yaml("").unwrap(), EngineConfig::default());
    }
}
