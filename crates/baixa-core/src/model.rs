use crate::error::BaixaError;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a configured field. Only the three named kinds drive reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    Obligation,
    TaxId,
    Period,
    Other(String),
}

impl FieldKind {
    pub const RECONCILED: [FieldKind; 3] =
        [FieldKind::Obligation, FieldKind::TaxId, FieldKind::Period];

    pub fn as_str(&self) -> &str {
        match self {
            FieldKind::Obligation => "obrigacao",
            FieldKind::TaxId => "inscricao",
            FieldKind::Period => "competencia",
            FieldKind::Other(name) => name,
        }
    }

    pub fn is_reconciled(&self) -> bool {
        !matches!(self, FieldKind::Other(_))
    }
}

impl From<String> for FieldKind {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "obrigacao" | "obrigação" | "obligation" => FieldKind::Obligation,
            "inscricao" | "inscrição" | "tax_id" | "cnpj" => FieldKind::TaxId,
            "competencia" | "competência" | "period" => FieldKind::Period,
            _ => FieldKind::Other(s),
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStatus {
    #[default]
    Pending,
    Validating,
    Ready,
}

impl LayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutStatus::Pending => "pending",
            LayoutStatus::Validating => "validating",
            LayoutStatus::Ready => "ready",
        }
    }

    pub fn from_str_loose(s: &str) -> LayoutStatus {
        match s.trim().to_lowercase().as_str() {
            "ready" | "pronto" => LayoutStatus::Ready,
            "validating" | "validando" => LayoutStatus::Validating,
            _ => LayoutStatus::Pending,
        }
    }
}

impl fmt::Display for LayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured field within a layout, with its matching hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(default)]
    pub id: i64,
    pub kind: FieldKind,
    #[serde(default)]
    pub expected_value: Option<String>,
    #[serde(default)]
    pub validation_pattern: Option<String>,
    /// 1-based position hint into the tokenized lines.
    #[serde(default)]
    pub target_line: Option<usize>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind) -> Self {
        FieldSpec {
            id: 0,
            kind,
            expected_value: None,
            validation_pattern: None,
            target_line: None,
        }
    }

    pub fn expected(&self) -> Option<&str> {
        self.expected_value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    pub fn pattern(&self) -> Option<&str> {
        self.validation_pattern
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Whether the self-test has anything to check for this field.
    pub fn is_checkable(&self) -> bool {
        self.expected().is_some() || self.pattern().is_some()
    }

    /// Compile the validation pattern (case-insensitive).
    pub fn compile(&self) -> Result<Option<Regex>, BaixaError> {
        match self.pattern() {
            None => Ok(None),
            Some(pattern) => RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(Some)
                .map_err(|e| BaixaError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }),
        }
    }
}

/// Reference document stored with a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A tenant-configured template describing how to find fields in a class of PDFs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    #[serde(default)]
    pub status: LayoutStatus,
    #[serde(skip)]
    pub source_document: Option<SourceDocument>,
    pub fields: Vec<FieldSpec>,
}

impl Layout {
    /// A new layout seeded with one empty field per reconciliation kind.
    pub fn new(tenant_id: i64, name: impl Into<String>) -> Self {
        Layout {
            id: 0,
            tenant_id,
            name: name.into(),
            status: LayoutStatus::Pending,
            source_document: None,
            fields: FieldKind::RECONCILED
                .iter()
                .cloned()
                .map(FieldSpec::new)
                .collect(),
        }
    }

    /// First field of the given kind, if configured.
    pub fn field(&self, kind: &FieldKind) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| &f.kind == kind)
    }

    pub fn field_mut(&mut self, kind: &FieldKind) -> Option<&mut FieldSpec> {
        self.fields.iter_mut().find(|f| &f.kind == kind)
    }
}

/// Strategy that resolved a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    ExactText,
    Regex,
    Positional,
    Heuristic,
    /// Obligation taken from the configured keyword table, not from the
    /// field's own pattern or expected value.
    Keyword,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::ExactText => write!(f, "exact text"),
            MatchStrategy::Regex => write!(f, "regex"),
            MatchStrategy::Positional => write!(f, "position"),
            MatchStrategy::Heuristic => write!(f, "heuristic"),
            MatchStrategy::Keyword => write!(f, "keyword table"),
        }
    }
}

/// A located field value and how it was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    pub value: String,
    pub strategy: MatchStrategy,
}

impl Resolved {
    pub fn new(value: impl Into<String>, strategy: MatchStrategy) -> Self {
        Resolved {
            value: value.into(),
            strategy,
        }
    }
}

/// Outcome of matching one field spec against a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResolution {
    pub kind: FieldKind,
    pub resolved: Option<Resolved>,
}

/// All field resolutions of one layout against one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub fields: Vec<FieldResolution>,
}

impl ExtractionResult {
    /// Resolved value for the first field of `kind` that resolved.
    pub fn value(&self, kind: &FieldKind) -> Option<&str> {
        self.fields
            .iter()
            .filter(|f| &f.kind == kind)
            .find_map(|f| f.resolved.as_ref())
            .map(|r| r.value.as_str())
    }

    /// Strategy behind [`ExtractionResult::value`] for `kind`.
    pub fn strategy(&self, kind: &FieldKind) -> Option<MatchStrategy> {
        self.fields
            .iter()
            .filter(|f| &f.kind == kind)
            .find_map(|f| f.resolved.as_ref())
            .map(|r| r.strategy)
    }

    pub fn is_resolved(&self, kind: &FieldKind) -> bool {
        self.value(kind).is_some()
    }
}

/// The three values reconciliation works from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedValues {
    pub obligation: Option<String>,
    pub tax_id: Option<String>,
    pub period: Option<String>,
}

impl From<&ExtractionResult> for ExtractedValues {
    fn from(result: &ExtractionResult) -> Self {
        ExtractedValues {
            obligation: result.value(&FieldKind::Obligation).map(str::to_string),
            tax_id: result.value(&FieldKind::TaxId).map(str::to_string),
            period: result.value(&FieldKind::Period).map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub tax_id: String,
}

/// Base obligation-activity definition linked to a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDefinition {
    pub id: i64,
    pub obligation_id: i64,
    pub obligation_name: String,
    pub activity_text: String,
}

/// A scheduled task for one client, obligation and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub id: i64,
    pub client_id: i64,
    pub obligation_id: i64,
    pub group_id: i64,
    pub year: i32,
    pub month: u32,
    pub activity_text: String,
    pub completed: bool,
    pub completed_at: Option<String>,
    pub type_tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFileRecord {
    pub client_id: i64,
    pub task_instance_id: i64,
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub tenant_id: i64,
    pub title: String,
    pub message: String,
}

/// A file submitted for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile {
            filename: filename.into(),
            bytes,
        }
    }
}
