use super::similarity::word_overlap;
use crate::config::EngineConfig;
use crate::model::{FieldSpec, MatchStrategy, Resolved};
use crate::tokenize::TokenizedDocument;
use regex::Regex;

/// Resolve an obrigação field.
///
/// `pattern` is the field's compiled validation pattern, or `None` when absent
/// or invalid.
pub fn resolve_obligation(
    spec: &FieldSpec,
    pattern: Option<&Regex>,
    doc: &TokenizedDocument,
    config: &EngineConfig,
) -> Option<Resolved> {
    let full = doc.full_text();

    if let Some(re) = pattern {
        if let Some(line) = doc.lines().iter().find(|l| re.is_match(l)) {
            return Some(Resolved::new(line.as_str(), MatchStrategy::Regex));
        }
        if config.flexible_matching {
            if let Some(m) = re.find(full) {
                let value = spec.expected().unwrap_or(m.as_str());
                return Some(Resolved::new(value, MatchStrategy::Regex));
            }
        }
    }

    if let Some(expected) = spec.expected() {
        if full.contains(expected) {
            return Some(Resolved::new(expected, MatchStrategy::ExactText));
        }
        let lower = expected.to_lowercase();
        if doc.lines().iter().any(|l| l.to_lowercase().contains(&lower)) {
            return Some(Resolved::new(expected, MatchStrategy::ExactText));
        }
        if config.flexible_matching && word_overlap(full, expected) >= config.similarity_threshold {
            return Some(Resolved::new(expected, MatchStrategy::Heuristic));
        }
    }

    config
        .keyword_in(full)
        .map(|k| Resolved::new(k.keyword.as_str(), MatchStrategy::Keyword))
}
