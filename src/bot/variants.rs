use std::collections::BTreeSet;

use crate::bot::normalizer::Normalizer;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u'];

/// Typo surface forms of a banned term.
///
/// The set always contains the base term itself, plus:
/// - the term with doubled-letter runs collapsed to one letter
/// - the term with all vowels removed
/// - every single adjacent-character swap
///
/// Works on characters, not bytes, so Arabic terms are handled too. The
/// ordered set makes enumeration deterministic.
pub fn generate_variants(base: &str) -> BTreeSet<String> {
    let mut variants = BTreeSet::new();
    variants.insert(base.to_string());

    variants.insert(Normalizer::squeeze(base));

    let without_vowels: String = base.chars().filter(|c| !VOWELS.contains(c)).collect();
    variants.insert(without_vowels);

    let chars: Vec<char> = base.chars().collect();
    for i in 0..chars.len().saturating_sub(1) {
        let mut swapped = chars.clone();
        swapped.swap(i, i + 1);
        variants.insert(swapped.into_iter().collect());
    }

    variants
}
