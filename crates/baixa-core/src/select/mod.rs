pub mod status;

use crate::config::{EngineConfig, ScoreWeights};
use crate::error::BaixaError;
use crate::matching::FieldMatcher;
use crate::model::{ExtractionResult, FieldKind, Layout, MatchStrategy};
use crate::tokenize::TokenizedDocument;
use serde::Serialize;

/// Score of one candidate layout.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateScore {
    pub layout_id: i64,
    pub layout_name: String,
    pub score: u32,
}

/// The winning layout and what it extracted.
#[derive(Debug, Clone)]
pub struct Selection<'l> {
    pub layout: &'l Layout,
    pub extraction: ExtractionResult,
    pub score: u32,
    pub candidates: Vec<CandidateScore>,
}

/// Weighted sum over the reconciliation kinds that resolved. An obligation
/// found only through the keyword table scores one point less, so a layout
/// whose own pattern or expected value matched outranks it.
pub fn score(extraction: &ExtractionResult, weights: &ScoreWeights) -> u32 {
    FieldKind::RECONCILED
        .iter()
        .filter_map(|kind| extraction.strategy(kind).map(|strategy| (kind, strategy)))
        .map(|(kind, strategy)| match strategy {
            MatchStrategy::Keyword => weights.weight(kind).saturating_sub(1),
            _ => weights.weight(kind),
        })
        .sum()
}

/// Run the matcher per layout and keep the strictly best score; ties keep
/// the earliest layout.
pub fn select_layout<'l>(
    layouts: &'l [Layout],
    doc: &TokenizedDocument,
    config: &EngineConfig,
) -> Result<Selection<'l>, BaixaError> {
    let matcher = FieldMatcher::new(config);
    let mut best: Option<Selection<'l>> = None;
    let mut candidates = Vec::with_capacity(layouts.len());

    for layout in layouts {
        let extraction = matcher.extract(layout, doc);
        let layout_score = score(&extraction, &config.score_weights);
        tracing::debug!(layout = %layout.name, score = layout_score, "scored layout");

        candidates.push(CandidateScore {
            layout_id: layout.id,
            layout_name: layout.name.clone(),
            score: layout_score,
        });

        if best.as_ref().map_or(true, |b| layout_score > b.score) {
            best = Some(Selection {
                layout,
                extraction,
                score: layout_score,
                candidates: Vec::new(),
            });
        }
    }

    match best {
        Some(mut selection) if selection.score > 0 => {
            selection.candidates = candidates;
            Ok(selection)
        }
        _ => Err(BaixaError::NoFieldsResolved),
    }
}
