pub mod schema;

use crate::error::BaixaError;
use crate::model::{FieldKind, Layout, SourceDocument};
use schema::LayoutDef;
use std::collections::HashSet;
use std::path::Path;

/// Load a layout definition from a JSON file.
pub fn load_layout(path: &Path) -> Result<LayoutDef, BaixaError> {
    let content = std::fs::read_to_string(path).map_err(|e| BaixaError::LayoutLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_layout(&content, path)
}

/// Parse a layout definition from a JSON string.
pub fn parse_layout(json: &str, source: &Path) -> Result<LayoutDef, BaixaError> {
    let def: LayoutDef = serde_json::from_str(json).map_err(|e| BaixaError::LayoutLoad {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_layout(&def)?;
    Ok(def)
}

/// Parse a layout definition from a JSON string (no file path context).
pub fn parse_layout_str(json: &str) -> Result<LayoutDef, BaixaError> {
    let def: LayoutDef = serde_json::from_str(json).map_err(BaixaError::Json)?;
    validate_layout(&def)?;
    Ok(def)
}

/// Validate that a layout definition is well-formed.
pub fn validate_layout(def: &LayoutDef) -> Result<(), BaixaError> {
    if def.name.trim().is_empty() {
        return Err(BaixaError::LayoutInvalid("name must not be empty".into()));
    }

    if def.fields.is_empty() {
        return Err(BaixaError::LayoutInvalid(format!(
            "layout '{}' has no fields",
            def.name
        )));
    }

    let mut seen = HashSet::new();
    for field in &def.fields {
        if field.kind.is_reconciled() && !seen.insert(field.kind.clone()) {
            return Err(BaixaError::LayoutInvalid(format!(
                "layout '{}' declares '{}' more than once",
                def.name, field.kind
            )));
        }

        if let FieldKind::Other(name) = &field.kind {
            if name.trim().is_empty() {
                return Err(BaixaError::LayoutInvalid(format!(
                    "layout '{}' has a field without a kind",
                    def.name
                )));
            }
        }

        if field.target_line == Some(0) {
            return Err(BaixaError::LayoutInvalid(format!(
                "field '{}' of layout '{}': target_line is 1-based",
                field.kind, def.name
            )));
        }

        field.compile()?;
    }

    for activity in &def.activities {
        if activity.activity_text.trim().is_empty() {
            return Err(BaixaError::LayoutInvalid(format!(
                "layout '{}' links an activity without text",
                def.name
            )));
        }
    }

    Ok(())
}

/// Build a tenant layout from a definition, reading its reference document
/// relative to `base_dir`. Reconciled kinds the definition leaves out get a
/// blank field spec.
pub fn to_layout(def: &LayoutDef, tenant_id: i64, base_dir: &Path) -> Result<Layout, BaixaError> {
    let source_document = match &def.source_document {
        Some(relative) => {
            let path = base_dir.join(relative);
            let bytes = std::fs::read(&path).map_err(|e| BaixaError::LayoutLoad {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| relative.display().to_string());
            Some(SourceDocument { filename, bytes })
        }
        None => None,
    };

    let mut layout = Layout::new(tenant_id, def.name.clone());
    for field in &def.fields {
        if field.kind.is_reconciled() {
            if let Some(slot) = layout.field_mut(&field.kind) {
                *slot = field.clone();
                continue;
            }
        }
        layout.fields.push(field.clone());
    }
    layout.source_document = source_document;
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "name": "Balancete",
        "fields": [
            { "kind": "obrigacao", "validation_pattern": "BALANCETE" },
            { "kind": "inscricao", "target_line": 2 },
            { "kind": "competencia" }
        ],
        "activities": [
            { "obligation_id": 10, "obligation_name": "Balancete", "activity_text": "Enviar balancete" }
        ]
    }"#;

    #[test]
    fn test_parse_valid_layout() {
        let def = parse_layout_str(VALID).unwrap();
        assert_eq!(def.name, "Balancete");
        assert_eq!(def.fields.len(), 3);
        assert_eq!(def.fields[1].kind, FieldKind::TaxId);
        assert_eq!(def.activities.len(), 1);
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let json = r#"{ "name": "X", "fields": [ { "kind": "obrigacao", "validation_pattern": "(" } ] }"#;
        assert!(matches!(
            parse_layout_str(json),
            Err(BaixaError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let json = r#"{ "name": "X", "fields": [ { "kind": "competencia" }, { "kind": "competência" } ] }"#;
        assert!(matches!(
            parse_layout_str(json),
            Err(BaixaError::LayoutInvalid(_))
        ));
    }

    #[test]
    fn test_zero_target_line_rejected() {
        let json = r#"{ "name": "X", "fields": [ { "kind": "inscricao", "target_line": 0 } ] }"#;
        assert!(parse_layout_str(json).is_err());
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(parse_layout_str(r#"{ "name": "X", "fields": [] }"#).is_err());
    }

    #[test]
    fn test_shipped_layouts_are_valid() {
        for json in [
            include_str!("../../../../layouts/balancete.json"),
            include_str!("../../../../layouts/dctf.json"),
        ] {
            parse_layout_str(json).unwrap();
        }
    }

    #[test]
    fn test_load_reports_path() {
        let err = load_layout(Path::new("/nonexistent/layout.json")).unwrap_err();
        assert!(matches!(err, BaixaError::LayoutLoad { .. }));
    }

    #[test]
    fn test_to_layout_reads_source_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ref.txt"), "BALANCETE\n03/2025").unwrap();
        let mut def = parse_layout_str(VALID).unwrap();
        def.source_document = Some("ref.txt".into());

        let layout = to_layout(&def, 4, dir.path()).unwrap();
        assert_eq!(layout.tenant_id, 4);
        assert_eq!(layout.id, 0);
        let doc = layout.source_document.unwrap();
        assert_eq!(doc.filename, "ref.txt");
        assert_eq!(doc.bytes, b"BALANCETE\n03/2025");
    }

    #[test]
    fn test_to_layout_seeds_missing_kinds() {
        let json = r#"{
            "name": "Só obrigação",
            "fields": [
                { "kind": "obrigacao", "validation_pattern": "BALANCETE" },
                { "kind": "filial", "target_line": 5 }
            ]
        }"#;
        let def = parse_layout_str(json).unwrap();
        let layout = to_layout(&def, 1, Path::new(".")).unwrap();

        let kinds: Vec<&str> = layout.fields.iter().map(|f| f.kind.as_str()).collect();
        assert_eq!(kinds, vec!["obrigacao", "inscricao", "competencia", "filial"]);
        assert_eq!(
            layout.fields[0].validation_pattern.as_deref(),
            Some("BALANCETE")
        );
        assert!(!layout.fields[1].is_checkable());
        assert!(layout.source_document.is_none());
    }
}
