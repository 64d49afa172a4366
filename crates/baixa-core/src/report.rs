use crate::error::{BaixaError, FailureStage};
use crate::model::{ExtractedValues, FieldKind, MatchStrategy};
use crate::reconcile::ReconcileOutcome;
use crate::select::CandidateScore;
use serde::Serialize;

/// Preview of one field of a layout against a document.
#[derive(Debug, Clone, Serialize)]
pub struct FieldTestResult {
    pub kind: FieldKind,
    /// The value the matcher resolved, if any.
    pub resolved_value: Option<String>,
    /// Strategy that resolved the value.
    pub matched_via: Option<MatchStrategy>,
    /// Whether the field resolved.
    pub passed: bool,
    /// Readiness self-test for the field, as used by status recomputation.
    /// `None` when the field has neither an expected value nor a pattern.
    pub satisfied: Option<bool>,
}

/// Result of testing one layout against one document. Nothing is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutTestReport {
    pub layout_id: i64,
    pub layout_name: String,
    /// Per-field results, in the layout's field order.
    pub per_field: Vec<FieldTestResult>,
    /// Tokenized lines of the document, for display.
    pub raw_lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Completed,
    Failed,
}

/// The layout chosen for a document.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutUsed {
    pub id: i64,
    pub name: String,
    /// Weighted score of the winning layout.
    pub score: u32,
}

/// Result of the full pipeline for one document.
#[derive(Debug, Clone, Serialize)]
pub struct AutoCompleteReport {
    pub status: RunStatus,
    pub layout_used: LayoutUsed,
    /// Obligation, tax ID and period as extracted by the winning layout.
    pub extracted: ExtractedValues,
    /// The completed task instance and side-effect outcomes.
    pub activity_completed: ReconcileOutcome,
    /// Score of every evaluated layout, in evaluation order.
    pub candidates: Vec<CandidateScore>,
}

/// Outcome for one file of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub filename: String,
    pub status: RunStatus,
    /// Stage that failed, for failed files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FailureStage>,
    /// Stable error identifier, for failed files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    /// Human-readable error message, for failed files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AutoCompleteReport>,
}

impl FileResult {
    pub fn completed(filename: &str, report: AutoCompleteReport) -> Self {
        FileResult {
            filename: filename.to_string(),
            status: RunStatus::Completed,
            stage: None,
            error_code: None,
            message: None,
            report: Some(report),
        }
    }

    pub fn failed(filename: &str, error: &BaixaError) -> Self {
        FileResult {
            filename: filename.to_string(),
            status: RunStatus::Failed,
            stage: Some(error.stage()),
            error_code: Some(error.code()),
            message: Some(error.to_string()),
            report: None,
        }
    }
}

/// Combined result of a batch, files in submission order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub total_files: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub per_file_results: Vec<FileResult>,
}

impl BatchReport {
    pub fn from_results(per_file_results: Vec<FileResult>) -> Self {
        let success_count = per_file_results
            .iter()
            .filter(|r| r.status == RunStatus::Completed)
            .count();
        BatchReport {
            total_files: per_file_results.len(),
            success_count,
            failure_count: per_file_results.len() - success_count,
            per_file_results,
        }
    }
}
