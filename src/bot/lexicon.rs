// src/bot/lexicon.rs - Banned-term tables and their compiled matching forms

use anyhow::Result;
use log::{debug, warn};
use regex::Regex;

use crate::bot::classifier;
use crate::bot::normalizer::Normalizer;
use crate::bot::pattern_matching::build_leetspeak_pattern;
use crate::bot::variants::generate_variants;
use crate::types::{Category, Language};

/// English banned terms, in match order
pub const ENGLISH_TERMS: &[&str] = &[
    "fuck",
    "motherfucker",
    "shit",
    "bitch",
    "bastard",
    "asshole",
    "cunt",
    "dick",
    "whore",
    "nigger",
    "faggot",
    "retard",
    "kike",
    "kill",
    "kill yourself",
    "kill myself",
    "murder",
    "shoot you",
    "suicide",
    "kys",
    "cut myself",
    "pussy",
    "horny",
    "blowjob",
    "dildo",
];

/// Arabic banned terms, Arabic script first then common Latin transliterations.
/// The whole list is only consulted when a message contains Arabic script.
pub const ARABIC_TERMS: &[&str] = &[
    "شرموطة",
    "قحبة",
    "منيوك",
    "متناك",
    "كس امك",
    "ابن الكلب",
    "اقتلك",
    "انتحر",
    "sharmoota",
    "kos omak",
    "ibn el kalb",
];

/// Literal Arabic-script phrases that are flagged as inappropriate on sight
pub const ARABIC_SEVERITY_PATTERNS: &[&str] = &[
    "كسمك",
    "كس اختك",
    "يلعن ابوك",
    "ابن الشرموطة",
    "ابن القحبة",
];

/// A banned term with everything needed to match it precompiled
#[derive(Debug, Clone)]
pub struct LexiconEntry {
    pub term: String,
    pub language: Language,
    pub category: Category,
    /// Term with repeated letters collapsed, compared against squeezed text
    pub squeezed: Option<String>,
    /// Typo variants other than the term itself
    pub variants: Vec<String>,
    pub leetspeak: Regex,
}

impl LexiconEntry {
    pub fn compile(term: &str, language: Language, min_variant_length: usize) -> Result<Self> {
        let term = term.to_lowercase();
        let long_enough = |s: &String| s.chars().count() >= min_variant_length;

        let squeezed = Some(Normalizer::squeeze(&term)).filter(long_enough);
        let variants = generate_variants(&term)
            .into_iter()
            .filter(|v| *v != term && long_enough(v))
            .collect();
        let leetspeak = build_leetspeak_pattern(&term)?;

        Ok(Self {
            category: classifier::category_for(&term),
            term,
            language,
            squeezed,
            variants,
            leetspeak,
        })
    }
}

/// Immutable set of compiled entries, built once at startup
#[derive(Debug, Clone)]
pub struct Lexicon {
    english: Vec<LexiconEntry>,
    arabic: Vec<LexiconEntry>,
    arabic_severity_patterns: Vec<String>,
}

impl Lexicon {
    /// Compile the built-in term tables
    pub fn builtin(min_variant_length: usize) -> Result<Self> {
        Self::from_terms(ENGLISH_TERMS, ARABIC_TERMS, ARABIC_SEVERITY_PATTERNS, min_variant_length)
    }

    pub fn from_terms(
        english: &[&str],
        arabic: &[&str],
        severity_patterns: &[&str],
        min_variant_length: usize,
    ) -> Result<Self> {
        let lexicon = Self {
            english: Self::compile_list(english, Language::English, min_variant_length)?,
            arabic: Self::compile_list(arabic, Language::Arabic, min_variant_length)?,
            arabic_severity_patterns: severity_patterns
                .iter()
                .filter(|p| !p.trim().is_empty())
                .map(|p| p.to_string())
                .collect(),
        };

        debug!(
            "Compiled lexicon: {} english terms, {} arabic terms, {} arabic severity patterns",
            lexicon.english.len(),
            lexicon.arabic.len(),
            lexicon.arabic_severity_patterns.len()
        );
        Ok(lexicon)
    }

    fn compile_list(terms: &[&str], language: Language, min_variant_length: usize) -> Result<Vec<LexiconEntry>> {
        let mut entries = Vec::with_capacity(terms.len());
        for term in terms {
            if term.trim().is_empty() {
                warn!("Skipping empty {} lexicon term", language);
                continue;
            }
            entries.push(LexiconEntry::compile(term, language, min_variant_length)?);
        }
        Ok(entries)
    }

    pub fn english(&self) -> &[LexiconEntry] {
        &self.english
    }

    pub fn arabic(&self) -> &[LexiconEntry] {
        &self.arabic
    }

    pub fn arabic_severity_patterns(&self) -> &[String] {
        &self.arabic_severity_patterns
    }

    pub fn len(&self) -> usize {
        self.english.len() + self.arabic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
