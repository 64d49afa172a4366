use crate::model::FieldSpec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A layout definition as written in an import file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutDef {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Reference document used for status recomputation, relative to the
    /// definition file.
    #[serde(default)]
    pub source_document: Option<PathBuf>,
    pub fields: Vec<FieldSpec>,
    /// Activities this layout completes.
    #[serde(default)]
    pub activities: Vec<ActivityDef>,
}

/// An obligation activity linked to the layout on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDef {
    pub obligation_id: i64,
    pub obligation_name: String,
    pub activity_text: String,
}
