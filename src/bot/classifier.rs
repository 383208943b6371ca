// src/bot/classifier.rs - Category and severity rules

use crate::types::{Category, MessageVerdict, Severity, ViolationRecord};

pub const HATE_SPEECH_WORDS: &[&str] = &[
    "nigger", "faggot", "retard", "kike", "chink",
    "زنجي", "كافر",
];

pub const THREAT_WORDS: &[&str] = &[
    "kill", "murder", "shoot", "stab", "bomb",
    "اقتلك", "ذبح",
];

pub const SELF_HARM_WORDS: &[&str] = &[
    "suicide", "kys", "cut myself", "end my life",
    "انتحر", "انتحار",
];

pub const PROFANITY_WORDS: &[&str] = &[
    "fuck", "shit", "bitch", "bastard", "ass", "cunt", "dick", "whore",
    "شرموط", "قحبة", "منيوك", "متناك", "كس",
    "sharmoot", "kos",
];

/// Category of a banned term.
///
/// Lists are checked in the order hate speech, threat, self harm, profanity, and
/// the first list with a word contained in the *term* wins. Containment is
/// tested against the term rather than the message, so compound terms take the
/// category of whichever indicator comes first: "kill myself" is a threat, not
/// self harm.
pub fn category_for(term: &str) -> Category {
    let ordered: [(&[&str], Category); 4] = [
        (HATE_SPEECH_WORDS, Category::HateSpeech),
        (THREAT_WORDS, Category::Threat),
        (SELF_HARM_WORDS, Category::SelfHarm),
        (PROFANITY_WORDS, Category::Profanity),
    ];

    let term = term.to_lowercase();
    ordered
        .iter()
        .find(|(words, _)| words.iter().any(|w| term.contains(*w)))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Inappropriate)
}

/// Overall severity: the highest severity of any single violation, so high for
/// any hate speech, threat or self harm, medium for any profanity, low otherwise.
pub fn overall_severity(violations: &[ViolationRecord]) -> Severity {
    violations
        .iter()
        .map(|v| v.category.severity())
        .max()
        .unwrap_or(Severity::Low)
}

/// Fold violations into a verdict; `None` when there is nothing to report
pub fn classify(violations: Vec<ViolationRecord>) -> Option<MessageVerdict> {
    let dominant_language = violations.first()?.language;
    let severity = overall_severity(&violations);

    Some(MessageVerdict {
        violations,
        severity,
        dominant_language,
    })
}
