use super::rules::{CNPJ, CPF};
use crate::period::MONTH_NAMES;
use regex::Regex;
use std::sync::LazyLock;

/// A class of field-shaped substrings that become their own tokens.
#[derive(Debug)]
pub struct PatternClass {
    pub name: &'static str,
    regex: Regex,
    accept: fn(&str) -> bool,
}

impl PatternClass {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self::filtered(name, pattern, |_| true)
    }

    fn filtered(name: &'static str, pattern: &str, accept: fn(&str) -> bool) -> Self {
        PatternClass {
            name,
            regex: Regex::new(pattern).expect("pattern class regex is valid"),
            accept,
        }
    }

    /// Byte spans of accepted matches in `text[start..end]`, offset to `text`.
    fn find_in(&self, text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(&text[start..end])
            .filter(|m| m.start() < m.end() && (self.accept)(m.as_str()))
            .map(|m| (start + m.start(), start + m.end()))
            .collect()
    }
}

/// Pattern classes in claim priority: a later class never splits a span an
/// earlier class already claimed.
pub static PATTERN_CLASSES: LazyLock<Vec<PatternClass>> = LazyLock::new(|| {
    vec![
        PatternClass::new("cnpj", CNPJ),
        PatternClass::new("cpf", CPF),
        PatternClass::filtered("tax_id_digits", r"\d{10,}", |m| m.len() == 11 || m.len() == 14),
        PatternClass::new("long_digits", r"\d{10,}"),
        PatternClass::new("full_date", r"\d{2}/\d{2}/\d{4}"),
        PatternClass::new("month_year", r"\d{2}/\d{4}"),
        PatternClass::new(
            "named_month_year",
            &format!(r"(?i)\b(?:{MONTH_NAMES})/\d{{4}}"),
        ),
        PatternClass::new("money", r"\d{1,3}(?:\.\d{3})*,\d{2}"),
        PatternClass::new("postal_code", r"\d{5}-\d{3}"),
        PatternClass::new("uppercase_run", r"\b\p{Lu}{2,}\b(?:[ \t]+\p{Lu}{2,}\b)*"),
        PatternClass::new(
            "alphanumeric",
            r"\b(?:\p{L}+\d[\p{L}\d]*|\d+\p{L}[\p{L}\d]*)\b",
        ),
    ]
});

/// Spans claimed by `classes` over `text`, sorted and non-overlapping.
pub fn claim_spans(text: &str, classes: &[PatternClass]) -> Vec<(usize, usize)> {
    let mut claimed: Vec<(usize, usize)> = Vec::new();

    for class in classes {
        let mut found = Vec::new();
        for (start, end) in gaps(&claimed, text.len()) {
            found.extend(class.find_in(text, start, end));
        }
        claimed.extend(found);
        claimed.sort_unstable();
    }

    claimed
}

/// Complement of `claimed` within `0..len`.
fn gaps(claimed: &[(usize, usize)], len: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut cursor = 0;
    for &(start, end) in claimed {
        if start > cursor {
            out.push((cursor, start));
        }
        cursor = cursor.max(end);
    }
    if cursor < len {
        out.push((cursor, len));
    }
    out
}

/// Surround every claimed span with line breaks.
pub fn wrap_patterns(text: &str) -> String {
    let spans = claim_spans(text, &PATTERN_CLASSES);
    let mut out = String::with_capacity(text.len() + spans.len() * 2);
    let mut cursor = 0;

    for (start, end) in spans {
        out.push_str(&text[cursor..start]);
        out.push('\n');
        out.push_str(&text[start..end]);
        out.push('\n');
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claimed_texts(text: &str) -> Vec<&str> {
        claim_spans(text, &PATTERN_CLASSES)
            .into_iter()
            .map(|(s, e)| &text[s..e])
            .collect()
    }

    #[test]
    fn test_cnpj_not_split_by_date_class() {
        assert_eq!(
            claimed_texts("12.345.678/0001-9504/2025"),
            vec!["12.345.678/0001-95", "04/2025"]
        );
    }

    #[test]
    fn test_uppercase_words_stay_together() {
        assert_eq!(
            claimed_texts("RICARDO ANDRE ENGELMANN011.178.841-20"),
            vec!["RICARDO ANDRE ENGELMANN", "011.178.841-20"]
        );
    }

    #[test]
    fn test_bare_digit_runs() {
        assert_eq!(
            claimed_texts("conta 12345678901 ref 123456789012"),
            vec!["12345678901", "123456789012"]
        );
    }

    #[test]
    fn test_money_postal_and_named_month() {
        assert_eq!(
            claimed_texts("Total 1.234,56 CEP 88015-100 mar/2025"),
            vec!["1.234,56", "CEP", "88015-100", "mar/2025"]
        );
    }

    #[test]
    fn test_alphanumeric_codes() {
        assert_eq!(claimed_texts("guia abc123 paga"), vec!["abc123"]);
    }

    #[test]
    fn test_wrap_inserts_breaks() {
        assert_eq!(wrap_patterns("ab 03/2025 cd"), "ab \n03/2025\n cd");
    }

    #[test]
    fn test_gaps() {
        assert_eq!(gaps(&[(2, 4), (6, 8)], 10), vec![(0, 2), (4, 6), (8, 10)]);
        assert_eq!(gaps(&[], 3), vec![(0, 3)]);
    }
}
