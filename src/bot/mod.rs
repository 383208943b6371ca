use anyhow::Result;
use log::{debug, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::platforms::ModerationPlatform;
use crate::storage::StateStore;
use crate::types::{ChatMessage, MessageVerdict, ScopeSettings};

pub mod classifier;
pub mod commands;
pub mod ledger;
pub mod lexicon;
pub mod normalizer;
pub mod pattern_matching;
pub mod pipeline;
pub mod settings;
pub mod state;
pub mod variants;

use commands::ModerationCommands;
use ledger::WarningLedger;
use lexicon::Lexicon;
use pattern_matching::{LanguageFlags, MatchEngine};
use pipeline::{truncate_preview, ActionReport, ModerationPipeline};
use settings::SettingsManager;
use state::ScopeRegistry;

/// Message counters since process start
#[derive(Debug, Default)]
pub struct EngineStats {
    checked: AtomicU64,
    flagged: AtomicU64,
}

impl EngineStats {
    pub fn record_checked(&self) {
        self.checked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flagged(&self) {
        self.flagged.fetch_add(1, Ordering::Relaxed);
    }

    pub fn checked(&self) -> u64 {
        self.checked.load(Ordering::Relaxed)
    }

    pub fn flagged(&self) -> u64 {
        self.flagged.load(Ordering::Relaxed)
    }
}

/// Verdict of a moderated message plus the task running its side effects
pub struct ModerationOutcome {
    pub verdict: MessageVerdict,
    pub actions: JoinHandle<ActionReport>,
}

/// Core moderation engine: matching, classification, warnings and actions
pub struct ModerationEngine {
    platform: Arc<dyn ModerationPlatform>,
    registry: Arc<ScopeRegistry>,
    matcher: Arc<MatchEngine>,
    ledger: Arc<WarningLedger>,
    settings: Arc<SettingsManager>,
    pipeline: ModerationPipeline,
    commands: ModerationCommands,
    stats: Arc<EngineStats>,
}

impl ModerationEngine {
    /// Build the engine; the lexicon and its patterns are compiled here once
    pub fn new(
        config: EngineConfig,
        platform: Arc<dyn ModerationPlatform>,
        store: Arc<dyn StateStore>,
    ) -> Result<Self> {
        let lexicon = Lexicon::builtin(config.matching.min_variant_length)?;
        info!("Compiled moderation lexicon with {} terms", lexicon.len());

        let matcher = Arc::new(MatchEngine::new(lexicon)?);
        let registry = Arc::new(ScopeRegistry::new(store, config.default_scope.clone()));
        let ledger = Arc::new(WarningLedger::new(Arc::clone(&registry)));
        let settings = Arc::new(SettingsManager::new(Arc::clone(&registry)));
        let stats = Arc::new(EngineStats::default());

        let pipeline = ModerationPipeline::new(
            Arc::clone(&platform),
            Arc::clone(&ledger),
            config.pipeline.max_inflight_actions,
            config.pipeline.log_preview_chars,
        );
        let commands = ModerationCommands::new(
            config.command_prefix.clone(),
            Arc::clone(&ledger),
            Arc::clone(&settings),
            Arc::clone(&matcher),
            Arc::clone(&stats),
        );

        Ok(Self {
            platform,
            registry,
            matcher,
            ledger,
            settings,
            pipeline,
            commands,
            stats,
        })
    }

    /// Preload every persisted scope; call once at process start
    pub async fn load_state(&self) -> Result<usize> {
        Ok(self.registry.load_all().await?)
    }

    /// Match and classify `text` under a scope's language switches, without side effects
    pub fn evaluate(&self, text: &str, settings: &ScopeSettings) -> Option<MessageVerdict> {
        if text.trim().is_empty() {
            return None;
        }
        let violations = self.matcher.find_violations(text, LanguageFlags::from(settings));
        classifier::classify(violations)
    }

    /// Moderate one inbound message. The warning (if any) is recorded before this
    /// returns; delete/notify/log run on the returned task.
    pub async fn moderate(&self, message: &ChatMessage) -> Option<ModerationOutcome> {
        let settings = self.settings.get(&message.scope_id).await;
        if !settings.enabled {
            debug!("Moderation disabled for scope {}", message.scope_id);
            return None;
        }

        if message.content.trim().is_empty() {
            return None;
        }

        self.stats.record_checked();
        let verdict = self.evaluate(&message.content, &settings)?;
        self.stats.record_flagged();

        info!(
            "Flagged message from {} in {}#{} via {}: {} ({} severity) \"{}\"",
            message.author_name,
            message.scope_id,
            message.channel_id,
            self.platform.platform_name(),
            verdict.primary_category(),
            verdict.severity,
            truncate_preview(&message.content, 80)
        );

        let actions = self.pipeline.handle(message, &verdict, &settings).await;
        Some(ModerationOutcome { verdict, actions })
    }

    /// Like [`moderate`](Self::moderate) but only returns the verdict
    pub async fn process_message(&self, message: &ChatMessage) -> Option<MessageVerdict> {
        self.moderate(message).await.map(|outcome| outcome.verdict)
    }

    /// Run a moderator command; `None` if the message is not one
    pub async fn handle_command(&self, message: &ChatMessage) -> Result<Option<String>> {
        self.commands.process_command(message).await
    }

    pub fn ledger(&self) -> &Arc<WarningLedger> {
        &self.ledger
    }

    pub fn settings(&self) -> &Arc<SettingsManager> {
        &self.settings
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Stop dispatching side effects and wait for queued state saves. Side effects
    /// already running finish, queued ones are dropped.
    pub async fn shutdown(&self) {
        info!("Shutting down moderation engine...");
        self.pipeline.shutdown();
        self.registry.flush().await;
        info!(
            "Moderation engine stopped ({} checked, {} flagged)",
            self.stats.checked(),
            self.stats.flagged()
        );
    }
}
