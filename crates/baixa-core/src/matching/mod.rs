pub mod obligation;
pub mod period;
pub mod similarity;
pub mod tax_id;

use crate::config::EngineConfig;
use crate::model::{
    ExtractionResult, FieldKind, FieldResolution, FieldSpec, Layout, MatchStrategy, Resolved,
};
use crate::tokenize::TokenizedDocument;
use regex::Regex;

/// Matches a layout's field specs against tokenized documents.
pub struct FieldMatcher<'a> {
    config: &'a EngineConfig,
}

impl<'a> FieldMatcher<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        FieldMatcher { config }
    }

    /// Resolve every field of `layout` against `doc`.
    pub fn extract(&self, layout: &Layout, doc: &TokenizedDocument) -> ExtractionResult {
        let fields = layout
            .fields
            .iter()
            .map(|spec| FieldResolution {
                kind: spec.kind.clone(),
                resolved: self.resolve(spec, doc),
            })
            .collect();
        ExtractionResult { fields }
    }

    /// Resolve a single field; `None` when nothing matched.
    pub fn resolve(&self, spec: &FieldSpec, doc: &TokenizedDocument) -> Option<Resolved> {
        match &spec.kind {
            FieldKind::Period => period::resolve_period(spec, doc, self.config.flexible_matching),
            FieldKind::TaxId => tax_id::resolve_tax_id(spec, doc, self.config.tax_id_window),
            FieldKind::Obligation => {
                let pattern = usable_pattern(spec);
                obligation::resolve_obligation(spec, pattern.as_ref(), doc, self.config)
            }
            FieldKind::Other(_) => resolve_other(spec, doc),
        }
    }
}

/// Compiled pattern, or `None` (logged) when the pattern is malformed.
fn usable_pattern(spec: &FieldSpec) -> Option<Regex> {
    match spec.compile() {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(kind = %spec.kind, error = %e, "ignoring malformed field pattern");
            None
        }
    }
}

fn resolve_other(spec: &FieldSpec, doc: &TokenizedDocument) -> Option<Resolved> {
    if let Some(re) = usable_pattern(spec) {
        if let Some(line) = doc.lines().iter().find(|l| re.is_match(l)) {
            return Some(Resolved::new(line.as_str(), MatchStrategy::Regex));
        }
    }
    if let Some(expected) = spec.expected() {
        if doc.full_text().contains(expected) {
            return Some(Resolved::new(expected, MatchStrategy::ExactText));
        }
    }
    spec.target_line
        .and_then(|n| doc.line(n))
        .map(|line| Resolved::new(line, MatchStrategy::Positional))
}

/// Self-test used for layout readiness: the pattern matches the full text or
/// a line, or the expected value occurs in the full text or a line.
pub fn field_satisfied(spec: &FieldSpec, doc: &TokenizedDocument) -> bool {
    let pattern_ok = usable_pattern(spec).is_some_and(|re| {
        re.is_match(doc.full_text()) || doc.lines().iter().any(|l| re.is_match(l))
    });

    let value_ok = spec.expected().is_some_and(|v| {
        doc.full_text().contains(v) || doc.lines().iter().any(|l| l.contains(v))
    });

    pattern_ok || value_ok
}
