pub mod builtin;

use crate::error::BaixaError;
use crate::model::FieldKind;
use crate::tokenize::DEFAULT_CHUNK_WIDTH;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable matching and reconciliation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fallback obligation keywords, scanned in order against upper-cased text.
    #[serde(default)]
    pub obligation_keywords: Vec<ObligationKeyword>,
    #[serde(default)]
    pub score_weights: ScoreWeights,
    /// Minimum word overlap for the fuzzy obligation match.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_chunk_width")]
    pub chunk_width: usize,
    /// Lines searched around a tax ID's target line.
    #[serde(default)]
    pub tax_id_window: LineWindow,
    /// Enables the período phrase, month-name, whole-text pattern and fuzzy strategies.
    #[serde(default = "default_flexible_matching")]
    pub flexible_matching: bool,
    /// Task type tag required for automatic completion.
    #[serde(default = "default_eligible_type_tag")]
    pub eligible_type_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationKeyword {
    pub keyword: String,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub obligation: u32,
    pub tax_id: u32,
    pub period: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        ScoreWeights {
            obligation: 3,
            tax_id: 2,
            period: 2,
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, kind: &FieldKind) -> u32 {
        match kind {
            FieldKind::Obligation => self.obligation,
            FieldKind::TaxId => self.tax_id,
            FieldKind::Period => self.period,
            FieldKind::Other(_) => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWindow {
    pub before: usize,
    pub after: usize,
}

impl Default for LineWindow {
    fn default() -> Self {
        LineWindow {
            before: 3,
            after: 2,
        }
    }
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_chunk_width() -> usize {
    DEFAULT_CHUNK_WIDTH
}

fn default_flexible_matching() -> bool {
    true
}

fn default_eligible_type_tag() -> String {
    "PDF Layout".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        builtin::default_config().clone()
    }
}

impl EngineConfig {
    /// First keyword (in table order) occurring as a whole word in `text`.
    pub fn keyword_in(&self, text: &str) -> Option<&ObligationKeyword> {
        let upper = text.to_uppercase();
        self.obligation_keywords
            .iter()
            .find(|k| contains_word(&upper, &k.keyword.to_uppercase()))
    }

    /// Department mapped from the first keyword found in `obligation`.
    pub fn department_for(&self, obligation: &str) -> Option<&str> {
        self.keyword_in(obligation)
            .and_then(|k| k.department.as_deref())
    }
}

/// Whether `needle` occurs in `haystack` not flanked by alphanumerics.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(i, m)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + m.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Load an engine configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<EngineConfig, BaixaError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BaixaError::Config(format!("{}: {}", path.display(), e)))?;
    parse_config(&content)
}

/// Parse and validate an engine configuration from a JSON string.
pub fn parse_config(json: &str) -> Result<EngineConfig, BaixaError> {
    let config: EngineConfig =
        serde_json::from_str(json).map_err(|e| BaixaError::Config(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &EngineConfig) -> Result<(), BaixaError> {
    let w = &config.score_weights;
    if w.obligation == 0 {
        return Err(BaixaError::Config(
            "score_weights.obligation must be positive".into(),
        ));
    }
    if w.obligation < w.tax_id || w.obligation < w.period {
        return Err(BaixaError::Config(format!(
            "score_weights.obligation ({}) must be at least tax_id ({}) and period ({})",
            w.obligation, w.tax_id, w.period
        )));
    }

    if !(0.0..=1.0).contains(&config.similarity_threshold) {
        return Err(BaixaError::Config(format!(
            "similarity_threshold {} must be between 0 and 1",
            config.similarity_threshold
        )));
    }

    if config.chunk_width == 0 {
        return Err(BaixaError::Config("chunk_width must be positive".into()));
    }

    if let Some(k) = config
        .obligation_keywords
        .iter()
        .find(|k| k.keyword.trim().is_empty())
    {
        return Err(BaixaError::Config(format!(
            "empty obligation keyword (department {:?})",
            k.department
        )));
    }

    if config.eligible_type_tag.trim().is_empty() {
        return Err(BaixaError::Config(
            "eligible_type_tag must not be empty".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = parse_config(r#"{ "obligation_keywords": [{ "keyword": "DCTF" }] }"#).unwrap();
        assert_eq!(config.score_weights, ScoreWeights::default());
        assert_eq!(config.chunk_width, 80);
        assert_eq!(config.eligible_type_tag, "PDF Layout");
        assert!(config.flexible_matching);
    }

    #[test]
    fn test_obligation_must_outweigh_others() {
        let json = r#"{ "score_weights": { "obligation": 1, "tax_id": 2, "period": 1 } }"#;
        assert!(matches!(parse_config(json), Err(BaixaError::Config(_))));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        assert!(parse_config(r#"{ "similarity_threshold": 1.5 }"#).is_err());
    }

    #[test]
    fn test_keyword_requires_whole_word() {
        let config = parse_config(
            r#"{ "obligation_keywords": [{ "keyword": "DAS", "department": "Fiscal" }] }"#,
        )
        .unwrap();
        assert!(config.keyword_in("relatório de vendas").is_none());
        assert_eq!(
            config.keyword_in("guia das 03/2025").map(|k| k.keyword.as_str()),
            Some("DAS")
        );
        assert_eq!(config.department_for("DAS MENSAL"), Some("Fiscal"));
    }

    #[test]
    fn test_keyword_table_order_wins() {
        let config = EngineConfig::default();
        let hit = config.keyword_in("DCTFWEB e DCTF").unwrap();
        assert_eq!(hit.keyword, "DCTFWEB");
    }
}
