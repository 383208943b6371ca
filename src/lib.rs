//! # modguard
//!
//! Rule-based chat moderation for English and transliterated Arabic.
//!
//! ## Features
//!
//! - **Obfuscation-aware matching**: leetspeak folding, stretched letters, typo and swap variants
//! - **Arabic script detection**: Arabic lexicon and severity patterns only run on Arabic text
//! - **Deterministic classification**: fixed category precedence and severity levels
//! - **Warning ledger**: per-scope, per-user warning history with JSON persistence
//! - **Action pipeline**: delete / warn / log, each step independent and bounded
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use modguard::prelude::*;
//! use modguard::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = ModerationEngine::new(
//!         EngineConfig::default(),
//!         Arc::new(ConsolePlatform::new()),
//!         Arc::new(MemoryStore::new()),
//!     )?;
//!
//!     let message = ChatMessage::new("guild", "general", "42", "someone", "you are a fuuuck");
//!     if let Some(outcome) = engine.moderate(&message).await {
//!         println!("{} severity", outcome.verdict.severity);
//!         outcome.actions.await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod platforms;
pub mod storage;
pub mod types;

// Re-export commonly used items
pub mod prelude {
    pub use crate::bot::{ModerationEngine, ModerationOutcome};
    pub use crate::config::EngineConfig;
    pub use crate::platforms::{console::ConsolePlatform, ModerationPlatform};
    pub use crate::types::{
        Category, ChatMessage, Language, MatchKind, MessageVerdict, ScopeSettings, Severity,
        ViolationRecord,
    };
    pub use anyhow::Result;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
