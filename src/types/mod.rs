// src/types/mod.rs - Core moderation data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Inbound chat message as delivered by the platform layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    /// Guild / community the message was posted in
    pub scope_id: String,
    pub channel_id: String,
    /// Subject whose content is being evaluated
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_moderator: bool,
}

impl ChatMessage {
    pub fn new(scope_id: &str, channel_id: &str, author_id: &str, author_name: &str, content: &str) -> Self {
        Self {
            message_id: Uuid::new_v4().to_string(),
            scope_id: scope_id.to_string(),
            channel_id: channel_id.to_string(),
            author_id: author_id.to_string(),
            author_name: author_name.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            is_moderator: false,
        }
    }

    pub fn handle(&self) -> MessageHandle {
        MessageHandle {
            channel_id: self.channel_id.clone(),
            message_id: self.message_id.clone(),
        }
    }
}

/// Opaque reference used to ask the platform to delete a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHandle {
    pub channel_id: String,
    pub message_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    English,
    Arabic,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => write!(f, "english"),
            Language::Arabic => write!(f, "arabic"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Profanity,
    HateSpeech,
    Threat,
    SelfHarm,
    Inappropriate,
}

impl Category {
    /// Severity a single violation of this category carries on its own
    pub fn severity(&self) -> Severity {
        match self {
            Category::HateSpeech | Category::Threat | Category::SelfHarm => Severity::High,
            Category::Profanity => Severity::Medium,
            Category::Inappropriate => Severity::Low,
        }
    }

    pub fn arabic_label(&self) -> &'static str {
        match self {
            Category::Profanity => "ألفاظ نابية",
            Category::HateSpeech => "خطاب كراهية",
            Category::Threat => "تهديد",
            Category::SelfHarm => "إيذاء النفس",
            Category::Inappropriate => "محتوى غير لائق",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Profanity => "profanity",
            Category::HateSpeech => "hate_speech",
            Category::Threat => "threat",
            Category::SelfHarm => "self_harm",
            Category::Inappropriate => "inappropriate",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn arabic_label(&self) -> &'static str {
        match self {
            Severity::Low => "منخفض",
            Severity::Medium => "متوسط",
            Severity::High => "مرتفع",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// How a lexicon term was found in a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    TypoVariant,
    Leetspeak,
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchKind::Exact => write!(f, "exact"),
            MatchKind::TypoVariant => write!(f, "typo-variant"),
            MatchKind::Leetspeak => write!(f, "leetspeak"),
        }
    }
}

/// One matched term in one message. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub term: String,
    pub language: Language,
    pub category: Category,
    pub match_kind: MatchKind,
    pub matched_variant: String,
}

/// Aggregated outcome of matching and classification for a single message.
///
/// A verdict only exists when at least one violation was found; callers get
/// `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageVerdict {
    pub violations: Vec<ViolationRecord>,
    pub severity: Severity,
    pub dominant_language: Language,
}

impl MessageVerdict {
    /// Category of the first violation, used for notices and log entries
    pub fn primary_category(&self) -> Category {
        self.violations
            .first()
            .map(|v| v.category)
            .unwrap_or(Category::Inappropriate)
    }

    /// Distinct base terms in violation order
    pub fn matched_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = Vec::new();
        for violation in &self.violations {
            if !terms.contains(&violation.term) {
                terms.push(violation.term.clone());
            }
        }
        terms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningEntry {
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

impl WarningEntry {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-scope moderation switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeSettings {
    pub enabled: bool,
    pub delete_messages: bool,
    pub warn_users: bool,
    pub log_actions: bool,
    pub check_arabic: bool,
    pub check_english: bool,
    pub log_channel: Option<String>,
}

impl Default for ScopeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delete_messages: true,
            warn_users: true,
            log_actions: true,
            check_arabic: true,
            check_english: true,
            log_channel: None,
        }
    }
}

/// Boolean switches of [`ScopeSettings`] addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingFlag {
    Enabled,
    DeleteMessages,
    WarnUsers,
    LogActions,
    CheckArabic,
    CheckEnglish,
}

impl SettingFlag {
    pub const ALL: [SettingFlag; 6] = [
        SettingFlag::Enabled,
        SettingFlag::DeleteMessages,
        SettingFlag::WarnUsers,
        SettingFlag::LogActions,
        SettingFlag::CheckArabic,
        SettingFlag::CheckEnglish,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SettingFlag::Enabled => "enabled",
            SettingFlag::DeleteMessages => "delete",
            SettingFlag::WarnUsers => "warn",
            SettingFlag::LogActions => "log",
            SettingFlag::CheckArabic => "arabic",
            SettingFlag::CheckEnglish => "english",
        }
    }

    pub fn get(&self, settings: &ScopeSettings) -> bool {
        match self {
            SettingFlag::Enabled => settings.enabled,
            SettingFlag::DeleteMessages => settings.delete_messages,
            SettingFlag::WarnUsers => settings.warn_users,
            SettingFlag::LogActions => settings.log_actions,
            SettingFlag::CheckArabic => settings.check_arabic,
            SettingFlag::CheckEnglish => settings.check_english,
        }
    }

    pub fn set(&self, settings: &mut ScopeSettings, value: bool) {
        match self {
            SettingFlag::Enabled => settings.enabled = value,
            SettingFlag::DeleteMessages => settings.delete_messages = value,
            SettingFlag::WarnUsers => settings.warn_users = value,
            SettingFlag::LogActions => settings.log_actions = value,
            SettingFlag::CheckArabic => settings.check_arabic = value,
            SettingFlag::CheckEnglish => settings.check_english = value,
        }
    }
}

impl FromStr for SettingFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enabled" | "moderation" => Ok(SettingFlag::Enabled),
            "delete" | "delete_messages" => Ok(SettingFlag::DeleteMessages),
            "warn" | "warn_users" => Ok(SettingFlag::WarnUsers),
            "log" | "log_actions" => Ok(SettingFlag::LogActions),
            "arabic" | "check_arabic" => Ok(SettingFlag::CheckArabic),
            "english" | "check_english" => Ok(SettingFlag::CheckEnglish),
            other => Err(format!("Unknown setting '{}'", other)),
        }
    }
}

/// Everything persisted for one scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    pub settings: ScopeSettings,
    #[serde(default)]
    pub warnings: BTreeMap<String, Vec<WarningEntry>>,
}

/// Direct message sent to a subject whose message was moderated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectNotice {
    pub incident_id: Uuid,
    pub scope_id: String,
    pub reason: String,
    pub category: Category,
    pub severity: Severity,
    pub language: Language,
    pub warning_count: Option<usize>,
    /// Only present for Arabic-dominant verdicts
    pub arabic_description: Option<String>,
}

/// Structured entry posted to a scope's moderation log channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationLogEntry {
    pub incident_id: Uuid,
    pub author_id: String,
    pub author_name: String,
    pub channel_id: String,
    pub category: Category,
    pub severity: Severity,
    pub language: Language,
    pub matched_terms: Vec<String>,
    pub content: String,
    pub deletion_requested: bool,
    pub timestamp: DateTime<Utc>,
}
