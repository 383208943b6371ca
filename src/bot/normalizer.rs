use anyhow::Result;
use regex::Regex;

/// Character substitution classes: each letter and the symbols that stand in for it.
///
/// Shared by the normalizer (which folds symbols back to letters) and the
/// leetspeak patterns (which expand letters to alternations). No symbol appears
/// in more than one class.
pub const SUBSTITUTION_CLASSES: &[(char, &[char])] = &[
    ('a', &['4', '@']),
    ('e', &['3', '&']),
    ('i', &['1', '!', '|']),
    ('o', &['0']),
    ('s', &['5', '$']),
    ('t', &['7', '+']),
];

/// Letter a substitution symbol folds to, if any
pub fn fold_symbol(c: char) -> Option<char> {
    SUBSTITUTION_CLASSES
        .iter()
        .find(|(_, symbols)| symbols.contains(&c))
        .map(|(letter, _)| *letter)
}

/// Symbols that may replace `letter`, if it has a class
pub fn substitutes_for(letter: char) -> Option<&'static [char]> {
    SUBSTITUTION_CLASSES
        .iter()
        .find(|(l, _)| *l == letter)
        .map(|(_, symbols)| *symbols)
}

/// Turns raw chat text into the canonical form used for matching.
///
/// Steps, in order:
/// 1. lowercase
/// 2. fold substitution symbols to letters in one pass over the original characters
/// 3. strip everything that is neither a word character nor whitespace
/// 4. cap runs of 3+ identical characters at 2 ("fuuuck" -> "fuuck")
/// 5. collapse whitespace to single spaces and trim
///
/// Stripping runs before run-capping so that `normalize` is idempotent.
#[derive(Debug, Clone)]
pub struct Normalizer {
    non_word: Regex,
    whitespace: Regex,
}

impl Normalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            non_word: Regex::new(r"[^\w\s]")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let folded: String = text
            .to_lowercase()
            .chars()
            .map(|c| fold_symbol(c).unwrap_or(c))
            .collect();

        let stripped = self.non_word.replace_all(&folded, "");
        let capped = Self::cap_repeats(&stripped, 2);
        self.whitespace.replace_all(&capped, " ").trim().to_string()
    }

    /// Limit every run of identical characters to at most `max_run` characters
    pub fn cap_repeats(text: &str, max_run: usize) -> String {
        let mut result = String::with_capacity(text.len());
        let mut prev_char = None;
        let mut run = 0;

        for ch in text.chars() {
            if prev_char == Some(ch) {
                run += 1;
            } else {
                run = 1;
                prev_char = Some(ch);
            }
            if run <= max_run {
                result.push(ch);
            }
        }

        result
    }

    /// Collapse every run of identical characters to a single character
    pub fn squeeze(text: &str) -> String {
        Self::cap_repeats(text, 1)
    }
}

/// True iff any code point falls in one of the Arabic Unicode blocks
pub fn contains_arabic_script(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c as u32,
            0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF | 0xFE70..=0xFEFF)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution_folding() {
        let normalizer = Normalizer::new().unwrap();
        assert_eq!(normalizer.normalize("SH!T"), "shit");
        assert_eq!(normalizer.normalize("b1tch"), "bitch");
        assert_eq!(normalizer.normalize("@$$h0l3"), "asshole");
        assert_eq!(normalizer.normalize("7e5+"), "test");
        assert_eq!(normalizer.normalize("l|ke"), "like");
    }

    #[test]
    fn test_single_pass_does_not_chain() {
        // '1' folds to 'i' and that 'i' is never folded again
        let normalizer = Normalizer::new().unwrap();
        assert_eq!(normalizer.normalize("1"), "i");
        assert_eq!(normalizer.normalize("&"), "e");
    }

    #[test]
    fn test_repeat_capping() {
        let normalizer = Normalizer::new().unwrap();
        assert_eq!(normalizer.normalize("you are a fuuuck"), "you are a fuuck");
        assert_eq!(normalizer.normalize("heeeeello"), "heello");
        assert_eq!(normalizer.normalize("good"), "good");
    }

    #[test]
    fn test_strips_punctuation_and_whitespace() {
        let normalizer = Normalizer::new().unwrap();
        assert_eq!(normalizer.normalize("  what...   is ~this?  "), "what is this");
        assert_eq!(normalizer.normalize("f.u.c.k"), "fuck");
        assert_eq!(normalizer.normalize(""), "");
    }

    #[test]
    fn test_unmapped_symbols_are_stripped_not_folded() {
        let normalizer = Normalizer::new().unwrap();
        assert_eq!(normalizer.normalize("k¡ll"), "kll");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = Normalizer::new().unwrap();
        let samples = [
            "you are a fuuuck",
            "a.a.a.a.a",
            "SH!!!T   h@pp3ns",
            "  mixed\tWHITE\nspace  ",
            "ياااا شرموطة!!",
            "1!|1!| $$$ 5555",
            "İstanbul",
            "",
        ];
        for sample in samples {
            let once = normalizer.normalize(sample);
            assert_eq!(normalizer.normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_squeeze() {
        assert_eq!(Normalizer::squeeze("fuuck"), "fuck");
        assert_eq!(Normalizer::squeeze("asshole"), "ashole");
        assert_eq!(Normalizer::squeeze("abc"), "abc");
    }

    #[test]
    fn test_arabic_script_detection() {
        assert!(contains_arabic_script("كسمك"));
        assert!(contains_arabic_script("hello مرحبا"));
        assert!(contains_arabic_script("\u{FEFB}"));
        assert!(contains_arabic_script("\u{0750}"));
        assert!(!contains_arabic_script("hello world"));
        assert!(!contains_arabic_script("sharmoota"));
        assert!(!contains_arabic_script(""));
    }

    #[test]
    fn test_substitution_lookup() {
        assert_eq!(fold_symbol('@'), Some('a'));
        assert_eq!(fold_symbol('|'), Some('i'));
        assert_eq!(fold_symbol('¡'), None);
        assert_eq!(substitutes_for('o'), Some(&['0'][..]));
        assert_eq!(substitutes_for('k'), None);
    }
}
