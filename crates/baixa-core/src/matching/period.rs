use crate::model::{FieldSpec, MatchStrategy, Resolved};
use crate::period::{find_named, find_numeric};
use crate::tokenize::TokenizedDocument;
use regex::Regex;
use std::sync::LazyLock;

static PERIODO_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)per[ií]odo\s*:?\s*(\d{2}/\d{4})\s*(?:-|a|até)\s*\d{2}/\d{4}")
        .expect("período range regex is valid")
});

/// Resolve a competência field.
///
/// Order: expected value in the full text, expected value in a line, then
/// (flexible) a "Período: MM/YYYY - MM/YYYY" phrase, the first `MM/YYYY` in
/// the full text, and (flexible) month-name forms line by line.
pub fn resolve_period(
    spec: &FieldSpec,
    doc: &TokenizedDocument,
    flexible: bool,
) -> Option<Resolved> {
    if let Some(expected) = spec.expected() {
        if doc.full_text().contains(expected) {
            return Some(Resolved::new(expected, MatchStrategy::ExactText));
        }
        if let Some(line) = doc.lines().iter().find(|l| l.contains(expected)) {
            return Some(Resolved::new(line.as_str(), MatchStrategy::ExactText));
        }
    }

    if flexible {
        if let Some(first) = periodo_range_start(doc.full_text()) {
            return Some(Resolved::new(first, MatchStrategy::Regex));
        }
    }

    if let Some(period) = find_numeric(doc.full_text()) {
        return Some(Resolved::new(period.to_string(), MatchStrategy::Regex));
    }

    if flexible {
        return doc
            .lines()
            .iter()
            .find_map(|line| find_named(line))
            .map(|period| Resolved::new(period.to_string(), MatchStrategy::Heuristic));
    }

    None
}

/// First `MM/YYYY` of a "Período: MM/YYYY - MM/YYYY" phrase.
pub fn periodo_range_start(text: &str) -> Option<String> {
    PERIODO_RANGE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
