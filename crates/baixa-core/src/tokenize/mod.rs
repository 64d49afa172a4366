pub mod patterns;
pub mod rules;
pub mod words;

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Fixed window used when no structure can be recovered.
pub const DEFAULT_CHUNK_WIDTH: usize = 80;

static WIDE_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("wide gap regex is valid"));
static OPEN_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(\[{]").expect("open bracket regex is valid"));
static CLOSE_BRACKET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[)\]}]").expect("close bracket regex is valid"));
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?;])\s+").expect("sentence end regex is valid"));

/// Line-like tokens recovered from one text blob, plus their space-joined text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenizedDocument {
    lines: Vec<String>,
    full_text: String,
}

impl TokenizedDocument {
    pub fn from_lines(lines: Vec<String>) -> Self {
        let full_text = lines.join(" ");
        TokenizedDocument { lines, full_text }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    /// Line at a 1-based position.
    pub fn line(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

pub fn tokenize(text: &str) -> TokenizedDocument {
    tokenize_with_width(text, DEFAULT_CHUNK_WIDTH)
}

/// Tokenize `text`, chunking by `chunk_width` characters as the last resort.
///
/// Never fails; yields at least one token whenever `text` has a
/// non-whitespace character.
pub fn tokenize_with_width(text: &str, chunk_width: usize) -> TokenizedDocument {
    let tokens = split_tokens(text, chunk_width);
    tracing::debug!(tokens = tokens.len(), "tokenized document");
    TokenizedDocument::from_lines(tokens)
}

fn split_tokens(text: &str, chunk_width: usize) -> Vec<String> {
    let lines = non_blank_lines(text);
    if lines.len() >= 2 {
        return lines
            .iter()
            .flat_map(|line| non_blank_lines(&rules::apply_glued_rules(line)))
            .collect();
    }

    let recovered = non_blank_lines(&recover_boundaries(text));
    if recovered.len() >= 2 {
        return recovered;
    }

    let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if words.len() >= 2 {
        return words;
    }

    let bullets: Vec<String> = text
        .split(['•', '·', '-', '–', '—', '*'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if bullets.len() >= 2 {
        return bullets;
    }

    chunk(text, chunk_width)
}

/// Whole-text pass for blobs whose line structure was lost entirely.
pub fn recover_boundaries(text: &str) -> String {
    let wrapped = patterns::wrap_patterns(text);
    let collapsed = WIDE_GAP.replace_all(&wrapped, "\n");
    let opened = OPEN_BRACKET.replace_all(&collapsed, "\n$0");
    let closed = CLOSE_BRACKET.replace_all(&opened, "$0\n");
    let sentences = SENTENCE_END.replace_all(&closed, "${1}\n");
    let glued = rules::apply_glued_rules(&sentences);
    words::split_word_pairs(&glued)
}

fn non_blank_lines(text: &str) -> Vec<String> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn chunk(text: &str, width: usize) -> Vec<String> {
    let collapsed: Vec<char> = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect();

    collapsed
        .chunks(width.max(1))
        .map(|c| c.iter().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn lines(text: &str) -> Vec<String> {
        tokenize(text).lines().to_vec()
    }

    #[test]
    fn test_newline_input_uses_line_split() {
        assert_eq!(
            lines("DCTF WEB MENSAL\n\n  Competência 03/2025  \n"),
            vec!["DCTF WEB MENSAL", "Competência 03/2025"]
        );
    }

    #[test]
    fn test_glued_name_and_cpf() {
        let out = lines("RICARDO ANDRE ENGELMANN011.178.841-20");
        assert!(out.len() >= 2);
        assert!(out.iter().any(|t| t == "011.178.841-20"));
    }

    #[test]
    fn test_glued_cpf_in_multiline_input() {
        let out = lines("Recibo\nRICARDO ANDRE ENGELMANN011.178.841-20");
        assert_eq!(
            out,
            vec!["Recibo", "RICARDO ANDRE ENGELMANN", "011.178.841-20"]
        );
    }

    #[test]
    fn test_cnpj_glued_to_period() {
        let out = lines("12.345.678/0001-9504/2025");
        assert!(out.iter().any(|t| t == "12.345.678/0001-95"));
        assert!(out.iter().any(|t| t == "04/2025"));
    }

    #[test]
    fn test_month_de_kept_together() {
        let out = lines("Janeiro de 2025");
        assert!(out.iter().any(|t| t.contains("Janeiro de")));

        let out = lines("15 de Março de 2024");
        assert!(out.iter().any(|t| t.contains("Março de")));
    }

    #[test]
    fn test_flat_document_recovers_fields() {
        assert_eq!(
            lines("BALANCETE SIMPLES NACIONAL 11.222.333/0001-44 Competência 03/2025"),
            vec![
                "BALANCETE SIMPLES NACIONAL",
                "11.222.333/0001-44",
                "Competência",
                "03/2025"
            ]
        );
    }

    #[test]
    fn test_bullet_fallback() {
        assert_eq!(lines("alfa-beta*gama"), vec!["alfa", "beta", "gama"]);
    }

    #[test]
    fn test_chunk_fallback() {
        let word = "x".repeat(170);
        let out = lines(&word);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].chars().count(), 80);
        assert_eq!(out[2].chars().count(), 10);
    }

    #[test]
    fn test_single_word() {
        assert_eq!(lines("recibo"), vec!["recibo"]);
    }

    #[test]
    fn test_blank_input_has_no_tokens() {
        assert!(tokenize("  \n\t ").is_empty());
    }

    #[test]
    fn test_line_is_one_based() {
        let doc = TokenizedDocument::from_lines(vec!["a".into(), "b".into()]);
        assert_eq!(doc.line(1), Some("a"));
        assert_eq!(doc.line(0), None);
        assert_eq!(doc.line(3), None);
        assert_eq!(doc.full_text(), "a b");
    }

    proptest! {
        #[test]
        fn prop_tokens_are_trimmed_and_non_blank(text in ".*\\S.*") {
            let doc = tokenize(&text);
            prop_assert!(!doc.is_empty());
            for line in doc.lines() {
                prop_assert!(!line.trim().is_empty());
                prop_assert_eq!(line.trim(), line.as_str());
            }
        }
    }
}
