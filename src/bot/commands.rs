use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;

use crate::bot::classifier::classify;
use crate::bot::ledger::WarningLedger;
use crate::bot::pattern_matching::{LanguageFlags, MatchEngine};
use crate::bot::settings::SettingsManager;
use crate::bot::EngineStats;
use crate::types::{ChatMessage, SettingFlag};

/// Moderator-only text commands (!warnings, !modconfig, ...)
pub struct ModerationCommands {
    command_prefix: String,
    ledger: Arc<WarningLedger>,
    settings: Arc<SettingsManager>,
    matcher: Arc<MatchEngine>,
    stats: Arc<EngineStats>,
}

impl ModerationCommands {
    pub fn new(
        command_prefix: impl Into<String>,
        ledger: Arc<WarningLedger>,
        settings: Arc<SettingsManager>,
        matcher: Arc<MatchEngine>,
        stats: Arc<EngineStats>,
    ) -> Self {
        Self {
            command_prefix: command_prefix.into(),
            ledger,
            settings,
            matcher,
            stats,
        }
    }

    /// Handle a moderation command. Returns the reply, or `None` when the
    /// message is not a moderation command from a moderator.
    pub async fn process_command(&self, message: &ChatMessage) -> Result<Option<String>> {
        // Only moderators can manage moderation
        if !message.is_moderator {
            return Ok(None);
        }

        let body = match message.content.trim().strip_prefix(self.command_prefix.as_str()) {
            Some(body) => body,
            None => return Ok(None),
        };

        let mut split = body.splitn(2, char::is_whitespace);
        let command = split.next().unwrap_or("").to_lowercase();
        let rest = split.next().unwrap_or("").trim();
        let args: Vec<&str> = rest.split_whitespace().collect();
        let scope_id = message.scope_id.as_str();

        let response = match command.as_str() {
            "warnings" => self.handle_warnings_command(scope_id, &args).await,
            "clearwarnings" => self.handle_clear_warnings_command(scope_id, &args, message).await,
            "modconfig" => self.handle_config_command(scope_id, &args).await,
            "setlogchannel" => self.handle_log_channel_command(scope_id, &args).await,
            "checktext" => self.handle_check_text_command(scope_id, rest).await,
            "modstats" => self.handle_stats_command(),
            _ => {
                debug!("Not a moderation command: {}", command);
                return Ok(None);
            }
        };

        debug!("Moderation command '{}' by {} in scope {}", command, message.author_name, scope_id);
        Ok(Some(response))
    }

    async fn handle_warnings_command(&self, scope_id: &str, args: &[&str]) -> String {
        let subject = match args.first() {
            Some(subject) => *subject,
            None => return format!("Usage: {}warnings <user>", self.command_prefix),
        };

        let warnings = self.ledger.get_warnings(scope_id, subject).await;
        if warnings.is_empty() {
            return format!("✅ {} has no warnings", subject);
        }

        let history: Vec<String> = warnings
            .iter()
            .enumerate()
            .map(|(i, w)| format!("{}. {} ({})", i + 1, w.reason, w.timestamp.format("%Y-%m-%d %H:%M UTC")))
            .collect();
        format!("⚠️ {} has {} warning(s): {}", subject, warnings.len(), history.join(" | "))
    }

    async fn handle_clear_warnings_command(&self, scope_id: &str, args: &[&str], message: &ChatMessage) -> String {
        let subject = match args.first() {
            Some(subject) => *subject,
            None => return format!("Usage: {}clearwarnings <user>", self.command_prefix),
        };

        if self.ledger.clear_warnings(scope_id, subject).await {
            info!("{} cleared warnings of {} in scope {}", message.author_name, subject, scope_id);
            format!("🗑️ Cleared all warnings for {}", subject)
        } else {
            format!("❌ {} had no warnings to clear", subject)
        }
    }

    async fn handle_config_command(&self, scope_id: &str, args: &[&str]) -> String {
        if args.is_empty() {
            let settings = self.settings.get(scope_id).await;
            let flags: Vec<String> = SettingFlag::ALL
                .iter()
                .map(|flag| format!("{}={}", flag.name(), if flag.get(&settings) { "on" } else { "off" }))
                .collect();
            let log_channel = settings.log_channel.as_deref().unwrap_or("none");
            return format!("🛡️ Moderation settings: {} | log_channel={}", flags.join(" "), log_channel);
        }

        if args.len() < 2 {
            return format!("Usage: {}modconfig [<setting> <on|off>]", self.command_prefix);
        }

        let flag = match args[0].parse::<SettingFlag>() {
            Ok(flag) => flag,
            Err(e) => {
                let names: Vec<&str> = SettingFlag::ALL.iter().map(|f| f.name()).collect();
                return format!("❌ {}. Available: {}", e, names.join(", "));
            }
        };

        let value = match args[1].to_lowercase().as_str() {
            "on" | "true" | "enable" | "yes" => true,
            "off" | "false" | "disable" | "no" => false,
            other => return format!("❌ Expected on or off, got '{}'", other),
        };

        self.settings.set_flag(scope_id, flag, value).await;
        format!("✅ {} is now {}", flag.name(), if value { "on" } else { "off" })
    }

    async fn handle_log_channel_command(&self, scope_id: &str, args: &[&str]) -> String {
        let channel = match args.first() {
            Some(channel) => channel.trim_start_matches('#'),
            None => return format!("Usage: {}setlogchannel <channel|none>", self.command_prefix),
        };

        if channel.eq_ignore_ascii_case("none") || channel.is_empty() {
            self.settings.set_log_channel(scope_id, None).await;
            "⏸️ Moderation logging channel removed".to_string()
        } else {
            self.settings.set_log_channel(scope_id, Some(channel.to_string())).await;
            format!("✅ Moderation actions will be logged to #{}", channel)
        }
    }

    async fn handle_check_text_command(&self, scope_id: &str, text: &str) -> String {
        if text.is_empty() {
            return format!("Usage: {}checktext <text>", self.command_prefix);
        }

        let settings = self.settings.get(scope_id).await;
        match classify(self.matcher.find_violations(text, LanguageFlags::from(&settings))) {
            Some(verdict) => {
                let kinds: Vec<String> = verdict
                    .violations
                    .iter()
                    .map(|v| format!("{} [{}, {}, {}]", v.term, v.match_kind, v.category, v.language))
                    .collect();
                format!(
                    "🚨 Would flag: {} severity, {} | {}",
                    verdict.severity,
                    verdict.primary_category(),
                    kinds.join(", ")
                )
            }
            None => "✅ No violations found".to_string(),
        }
    }

    fn handle_stats_command(&self) -> String {
        let checked = self.stats.checked();
        let flagged = self.stats.flagged();
        let rate = if checked > 0 {
            flagged as f64 / checked as f64 * 100.0
        } else {
            0.0
        };
        format!("📊 Messages checked: {} | flagged: {} ({:.1}%)", checked, flagged, rate)
    }
}
