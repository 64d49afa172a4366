use std::collections::HashSet;

/// Lower-cased words longer than three characters.
pub fn keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3)
        .map(str::to_lowercase)
        .collect()
}

/// Fraction of `expected`'s keywords that also occur in `text`.
///
/// Returns 0.0 when `expected` has no keywords.
pub fn word_overlap(text: &str, expected: &str) -> f64 {
    let wanted = keywords(expected);
    if wanted.is_empty() {
        return 0.0;
    }
    let present = keywords(text);
    let shared = wanted.iter().filter(|w| present.contains(*w)).count();
    shared as f64 / wanted.len() as f64
}
