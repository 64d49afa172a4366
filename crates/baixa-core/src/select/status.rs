use crate::matching::field_satisfied;
use crate::model::{Layout, LayoutStatus};
use crate::tokenize::TokenizedDocument;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub status: LayoutStatus,
    pub fields_passed: usize,
    pub fields_total: usize,
}

/// Derive a layout's readiness from the self-test of its checkable fields
/// against `doc` (its reference document, if any).
pub fn evaluate_status(layout: &Layout, doc: Option<&TokenizedDocument>) -> StatusReport {
    let checkable: Vec<_> = layout.fields.iter().filter(|f| f.is_checkable()).collect();
    let fields_total = checkable.len();
    let fields_passed = match doc {
        Some(doc) => checkable.iter().filter(|f| field_satisfied(f, doc)).count(),
        None => 0,
    };

    let status = if fields_total == 0 || fields_passed == 0 {
        LayoutStatus::Pending
    } else if fields_passed < fields_total {
        LayoutStatus::Validating
    } else {
        LayoutStatus::Ready
    };

    StatusReport {
        status,
        fields_passed,
        fields_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldKind;
    use crate::tokenize::tokenize;

    fn layout(obligation: Option<&str>, period: Option<&str>) -> Layout {
        let mut l = Layout::new(1, "DCTF");
        l.field_mut(&FieldKind::Obligation).unwrap().validation_pattern =
            obligation.map(str::to_string);
        l.field_mut(&FieldKind::Period).unwrap().expected_value = period.map(str::to_string);
        l
    }

    #[test]
    fn test_no_checkable_fields_is_pending() {
        let doc = tokenize("DCTF\n03/2025");
        let report = evaluate_status(&layout(None, None), Some(&doc));
        assert_eq!(report.status, LayoutStatus::Pending);
        assert_eq!(report.fields_total, 0);
    }

    #[test]
    fn test_all_pass_is_ready() {
        let doc = tokenize("DCTF WEB\n03/2025");
        let report = evaluate_status(&layout(Some("DCTF"), Some("03/2025")), Some(&doc));
        assert_eq!(
            report,
            StatusReport {
                status: LayoutStatus::Ready,
                fields_passed: 2,
                fields_total: 2
            }
        );
    }

    #[test]
    fn test_some_pass_is_validating() {
        let doc = tokenize("DCTF WEB\n04/2025");
        let report = evaluate_status(&layout(Some("DCTF"), Some("03/2025")), Some(&doc));
        assert_eq!(report.status, LayoutStatus::Validating);
        assert_eq!(report.fields_passed, 1);
    }

    #[test]
    fn test_none_pass_is_pending() {
        let doc = tokenize("CAGED\n04/2025");
        let report = evaluate_status(&layout(Some("DCTF"), Some("03/2025")), Some(&doc));
        assert_eq!(report.status, LayoutStatus::Pending);
    }

    #[test]
    fn test_missing_document_is_pending() {
        let report = evaluate_status(&layout(Some("DCTF"), None), None);
        assert_eq!(report.status, LayoutStatus::Pending);
        assert_eq!(report.fields_total, 1);
    }
}
