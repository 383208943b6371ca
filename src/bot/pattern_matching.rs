use anyhow::Result;
use log::debug;
use regex::{Regex, RegexBuilder};

use crate::bot::lexicon::{Lexicon, LexiconEntry};
use crate::bot::normalizer::{contains_arabic_script, substitutes_for, Normalizer};
use crate::types::{Category, Language, MatchKind, ScopeSettings, ViolationRecord};

/// Build the leetspeak alternation for a term: every letter with a substitution
/// class matches the letter or any of its symbols, everything else matches literally.
pub fn build_leetspeak_pattern(term: &str) -> Result<Regex> {
    let mut pattern = String::new();
    for ch in term.chars() {
        match substitutes_for(ch) {
            Some(symbols) => {
                let alternatives: Vec<String> = std::iter::once(ch)
                    .chain(symbols.iter().copied())
                    .map(|c| regex::escape(&c.to_string()))
                    .collect();
                pattern.push_str(&format!("(?:{})", alternatives.join("|")));
            }
            None => pattern.push_str(&regex::escape(&ch.to_string())),
        }
    }

    Ok(RegexBuilder::new(&pattern).case_insensitive(true).build()?)
}

/// Which lexicons to walk for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageFlags {
    pub english: bool,
    pub arabic: bool,
}

impl LanguageFlags {
    pub fn all() -> Self {
        Self { english: true, arabic: true }
    }
}

impl From<&ScopeSettings> for LanguageFlags {
    fn from(settings: &ScopeSettings) -> Self {
        Self {
            english: settings.check_english,
            arabic: settings.check_arabic,
        }
    }
}

/// Forms of one message that terms are compared against
struct MessageForms<'a> {
    raw: &'a str,
    lower_raw: String,
    canonical: &'a str,
    squeezed: String,
}

/// Runs the lexicon against a message and reports every term hit
#[derive(Debug, Clone)]
pub struct MatchEngine {
    lexicon: Lexicon,
    normalizer: Normalizer,
}

impl MatchEngine {
    pub fn new(lexicon: Lexicon) -> Result<Self> {
        Ok(Self {
            lexicon,
            normalizer: Normalizer::new()?,
        })
    }

    /// Normalize `raw` and match it
    pub fn find_violations(&self, raw: &str, flags: LanguageFlags) -> Vec<ViolationRecord> {
        let canonical = self.normalizer.normalize(raw);
        self.match_text(raw, &canonical, flags)
    }

    /// Match a message given its raw and canonical forms.
    ///
    /// English entries come first, then Arabic entries, then Arabic severity
    /// patterns; within a lexicon, entries keep load order.
    pub fn match_text(&self, raw: &str, canonical: &str, flags: LanguageFlags) -> Vec<ViolationRecord> {
        let forms = MessageForms {
            raw,
            lower_raw: raw.to_lowercase(),
            canonical,
            squeezed: Normalizer::squeeze(canonical),
        };
        let mut violations = Vec::new();

        if flags.english {
            for entry in self.lexicon.english() {
                Self::match_entry(entry, &forms, &mut violations);
            }
        }

        // The whole Arabic walk, leetspeak included, needs Arabic script in the
        // message; transliterations on their own never reach it
        if flags.arabic && contains_arabic_script(raw) {
            for entry in self.lexicon.arabic() {
                Self::match_entry(entry, &forms, &mut violations);
            }
            self.match_severity_patterns(&forms, &mut violations);
        }

        violations
    }

    fn match_entry(entry: &LexiconEntry, forms: &MessageForms<'_>, out: &mut Vec<ViolationRecord>) {
        let found_in = |needle: &str| forms.lower_raw.contains(needle) || forms.canonical.contains(needle);

        if found_in(&entry.term) {
            Self::record(entry, MatchKind::Exact, &entry.term, out);
        } else if let Some(squeezed) = entry.squeezed.as_deref().filter(|s| forms.squeezed.contains(*s)) {
            Self::record(entry, MatchKind::TypoVariant, squeezed, out);
        } else if let Some(variant) = entry.variants.iter().find(|v| found_in(v)) {
            Self::record(entry, MatchKind::TypoVariant, variant, out);
        }

        // Independent of the steps above, so a term can be reported twice
        if let Some(hit) = entry.leetspeak.find(&forms.lower_raw) {
            Self::record(entry, MatchKind::Leetspeak, hit.as_str(), out);
        }
    }

    fn match_severity_patterns(&self, forms: &MessageForms<'_>, out: &mut Vec<ViolationRecord>) {
        for pattern in self.lexicon.arabic_severity_patterns() {
            if forms.raw.contains(pattern.as_str()) {
                debug!("Arabic severity pattern hit: '{}'", pattern);
                out.push(ViolationRecord {
                    term: pattern.clone(),
                    language: Language::Arabic,
                    category: Category::Inappropriate,
                    match_kind: MatchKind::Exact,
                    matched_variant: pattern.clone(),
                });
            }
        }
    }

    fn record(entry: &LexiconEntry, kind: MatchKind, matched: &str, out: &mut Vec<ViolationRecord>) {
        debug!("Lexicon hit: '{}' ({}) via {} as '{}'", entry.term, entry.language, kind, matched);
        out.push(ViolationRecord {
            term: entry.term.clone(),
            language: entry.language,
            category: entry.category,
            match_kind: kind,
            matched_variant: matched.to_string(),
        });
    }
}
