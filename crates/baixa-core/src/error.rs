use crate::model::FieldKind;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BaixaError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("layout {0} not found")]
    LayoutNotFound(i64),

    #[error("failed to load layouts from {path}: {reason}")]
    LayoutLoad { path: PathBuf, reason: String },

    #[error("invalid layout: {0}")]
    LayoutInvalid(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no layout configured for tenant {0}")]
    NoLayoutConfigured(i64),

    #[error("no layout resolved any field from the document")]
    NoFieldsResolved,

    #[error("field '{0}' could not be extracted from the document")]
    FieldUnresolved(FieldKind),

    #[error("client with tax id {tax_id} not found")]
    ClientNotFound { tax_id: String },

    #[error("no activity linked to layout '{layout}'")]
    NoActivityLinkedToLayout { layout: String },

    #[error("no pending activity for {period}")]
    NoPendingActivity { period: String },

    #[error("activity type '{found}' is not eligible for automatic completion")]
    WrongActivityType { found: String },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pipeline stage an error belongs to, reported alongside failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Input,
    Extraction,
    Configuration,
    Selection,
    Reconciliation,
    Storage,
}

impl BaixaError {
    pub fn stage(&self) -> FailureStage {
        match self {
            BaixaError::InvalidInput(_) => FailureStage::Input,
            BaixaError::Extraction(_)
            | BaixaError::PdftotextNotFound
            | BaixaError::PdftotextFailed { .. } => FailureStage::Extraction,
            BaixaError::InvalidPattern { .. }
            | BaixaError::LayoutNotFound(_)
            | BaixaError::LayoutLoad { .. }
            | BaixaError::LayoutInvalid(_)
            | BaixaError::Config(_) => FailureStage::Configuration,
            BaixaError::NoLayoutConfigured(_)
            | BaixaError::NoFieldsResolved
            | BaixaError::FieldUnresolved(_) => FailureStage::Selection,
            BaixaError::ClientNotFound { .. }
            | BaixaError::NoActivityLinkedToLayout { .. }
            | BaixaError::NoPendingActivity { .. }
            | BaixaError::WrongActivityType { .. } => FailureStage::Reconciliation,
            BaixaError::Storage(_) | BaixaError::Io(_) | BaixaError::Json(_) => {
                FailureStage::Storage
            }
        }
    }

    /// Stable machine-readable identifier for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            BaixaError::InvalidInput(_) => "invalid_input",
            BaixaError::Extraction(_)
            | BaixaError::PdftotextNotFound
            | BaixaError::PdftotextFailed { .. } => "extraction_failure",
            BaixaError::InvalidPattern { .. } => "invalid_pattern",
            BaixaError::LayoutNotFound(_) => "layout_not_found",
            BaixaError::LayoutLoad { .. } => "layout_load",
            BaixaError::LayoutInvalid(_) => "layout_invalid",
            BaixaError::Config(_) => "config",
            BaixaError::NoLayoutConfigured(_) => "no_layout_configured",
            BaixaError::NoFieldsResolved => "no_fields_resolved",
            BaixaError::FieldUnresolved(_) => "field_unresolved",
            BaixaError::ClientNotFound { .. } => "client_not_found",
            BaixaError::NoActivityLinkedToLayout { .. } => "no_activity_linked_to_layout",
            BaixaError::NoPendingActivity { .. } => "no_pending_activity",
            BaixaError::WrongActivityType { .. } => "wrong_activity_type",
            BaixaError::Storage(_) => "storage",
            BaixaError::Io(_) => "io",
            BaixaError::Json(_) => "json",
        }
    }
}
