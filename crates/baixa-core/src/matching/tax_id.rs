use crate::config::LineWindow;
use crate::model::{FieldSpec, MatchStrategy, Resolved};
use crate::tokenize::rules::CNPJ;
use crate::tokenize::TokenizedDocument;
use regex::Regex;
use std::sync::LazyLock;

static CNPJ_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CNPJ).expect("cnpj regex is valid"));

fn find_cnpj(text: &str) -> Option<&str> {
    CNPJ_SHAPE.find(text).map(|m| m.as_str())
}

/// Resolve an inscrição (CNPJ) field.
///
/// With a target line, that line is searched first, then `window` lines
/// around it, before the whole document.
pub fn resolve_tax_id(
    spec: &FieldSpec,
    doc: &TokenizedDocument,
    window: LineWindow,
) -> Option<Resolved> {
    if let Some(target) = spec.target_line {
        if let Some(found) = search_near(doc, target, window) {
            return Some(Resolved::new(found, MatchStrategy::Positional));
        }
    }

    find_cnpj(doc.full_text()).map(|found| Resolved::new(found, MatchStrategy::Regex))
}

fn search_near(doc: &TokenizedDocument, target: usize, window: LineWindow) -> Option<&str> {
    let index = target.checked_sub(1).filter(|&i| i < doc.len())?;
    let lines = doc.lines();

    if let Some(found) = find_cnpj(&lines[index]) {
        return Some(found);
    }

    let start = index.saturating_sub(window.before);
    let end = (index + window.after).min(doc.len() - 1);
    (start..=end)
        .filter(|&i| i != index)
        .find_map(|i| find_cnpj(&lines[i]))
}
