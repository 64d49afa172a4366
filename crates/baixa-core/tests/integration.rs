//! Integration tests for the extraction pipeline end to end.
//!
//! Uses a MockExtractor that decodes the submitted bytes as the first-page
//! text, so these tests run without poppler-utils.

use baixa_core::clock::FixedClock;
use baixa_core::config::EngineConfig;
use baixa_core::error::{BaixaError, FailureStage};
use baixa_core::extraction::PdfExtractor;
use baixa_core::layouts;
use baixa_core::model::{
    FieldKind, Layout, LayoutStatus, MatchStrategy, SourceDocument, TaskInstance, UploadedFile,
};
use baixa_core::report::RunStatus;
use baixa_core::store::{SqliteStore, Store};
use baixa_core::Pipeline;
use chrono::{TimeZone, Utc};
use std::path::Path;

const BALANCETE_TEXT: &str = "BALANCETE SIMPLES NACIONAL 11.222.333/0001-44 Competência 03/2025";
const DCTF_TEXT: &str = "DCTF WEB\n22.333.444/0001-55\nCompetência: 04/2025";

struct MockExtractor;

impl PdfExtractor for MockExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, BaixaError> {
        if pdf_bytes.starts_with(b"%corrupt") {
            return Err(BaixaError::Extraction("broken xref table".into()));
        }
        Ok(String::from_utf8_lossy(pdf_bytes).into_owned())
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2025, 4, 10, 14, 30, 5).unwrap())
}

fn file(name: &str, text: &str) -> UploadedFile {
    UploadedFile::new(name, text.as_bytes().to_vec())
}

fn instance(client_id: i64, obligation_id: i64, month: u32, text: &str, tag: &str) -> TaskInstance {
    TaskInstance {
        id: 0,
        client_id,
        obligation_id,
        group_id: client_id * 100 + obligation_id,
        year: 2025,
        month,
        activity_text: text.into(),
        completed: false,
        completed_at: None,
        type_tag: tag.into(),
    }
}

fn layout_with_pattern(name: &str, pattern: &str) -> Layout {
    let mut layout = Layout::new(1, name);
    layout
        .field_mut(&FieldKind::Obligation)
        .unwrap()
        .validation_pattern = Some(pattern.into());
    layout
}

/// Tenant 1 with a Balancete layout, one client and one pending instance.
struct Setup {
    store: SqliteStore,
    layout_id: i64,
    instance_id: i64,
}

fn setup(type_tag: &str) -> Setup {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let layout_id = store
        .save_layout(&layout_with_pattern("Balancete", "BALANCETE"))
        .unwrap();
    let activity = store
        .add_activity(10, "Balancete", "Enviar balancete")
        .unwrap();
    store.link_activity(layout_id, activity).unwrap();
    let client = store
        .add_client(1, "ACME Comércio Ltda", "11.222.333/0001-44")
        .unwrap();
    let instance_id = store
        .add_task_instance(&instance(client, 10, 3, "Enviar balancete", type_tag))
        .unwrap();
    Setup {
        store,
        layout_id,
        instance_id,
    }
}

// ---------------------------------------------------------------------------
// Full pipeline on a flat first page
// ---------------------------------------------------------------------------
#[test]
fn auto_complete_flat_balancete() {
    let mut s = setup("PDF Layout");
    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);

    let report = pipeline
        .auto_complete(&mut s.store, 1, &file("balancete.pdf", BALANCETE_TEXT))
        .unwrap();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.layout_used.id, s.layout_id);
    assert_eq!(report.layout_used.score, 7);
    assert_eq!(report.extracted.tax_id.as_deref(), Some("11.222.333/0001-44"));
    assert_eq!(report.extracted.period.as_deref(), Some("03/2025"));
    assert_eq!(
        report.extracted.obligation.as_deref(),
        Some("BALANCETE SIMPLES NACIONAL")
    );

    let outcome = &report.activity_completed;
    assert_eq!(outcome.task_instance_id, s.instance_id);
    assert_eq!(outcome.completed_at, "2025-04-10 11:30:05");
    assert!(outcome.archived);
    assert!(outcome.notified);
    assert_eq!(outcome.department.as_deref(), Some("Contábil"));

    let stored = s.store.task_instance(s.instance_id).unwrap().unwrap();
    assert!(stored.completed);
    assert_eq!(stored.completed_at.as_deref(), Some("2025-04-10 11:30:05"));
    assert_eq!(s.store.group_comments(stored.group_id).unwrap().len(), 1);
    assert_eq!(s.store.archived_files(s.instance_id).unwrap().len(), 1);
}

#[test]
fn auto_complete_is_idempotent() {
    let mut s = setup("PDF Layout");
    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);
    let doc = file("balancete.pdf", BALANCETE_TEXT);

    pipeline.auto_complete(&mut s.store, 1, &doc).unwrap();
    let err = pipeline.auto_complete(&mut s.store, 1, &doc).unwrap_err();
    assert!(matches!(err, BaixaError::NoPendingActivity { .. }));
    assert_eq!(err.stage(), FailureStage::Reconciliation);

    let stored = s.store.task_instance(s.instance_id).unwrap().unwrap();
    assert_eq!(s.store.group_comments(stored.group_id).unwrap().len(), 1);
}

#[test]
fn wrong_activity_type_leaves_instance_pending() {
    let mut s = setup("PDF Conferência");
    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);

    let err = pipeline
        .auto_complete(&mut s.store, 1, &file("balancete.pdf", BALANCETE_TEXT))
        .unwrap_err();
    assert!(matches!(err, BaixaError::WrongActivityType { .. }));
    assert_eq!(err.code(), "wrong_activity_type");
    assert!(!s.store.task_instance(s.instance_id).unwrap().unwrap().completed);
}

#[test]
fn unknown_client_is_reported() {
    let mut s = setup("PDF Layout");
    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);
    let text = "BALANCETE SIMPLES NACIONAL 99.888.777/0001-66 Competência 03/2025";

    let err = pipeline
        .auto_complete(&mut s.store, 1, &file("outro.pdf", text))
        .unwrap_err();
    assert!(
        matches!(err, BaixaError::ClientNotFound { ref tax_id } if tax_id == "99.888.777/0001-66")
    );
}

#[test]
fn input_and_configuration_errors() {
    let mut s = setup("PDF Layout");
    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);
    let doc = file("balancete.pdf", BALANCETE_TEXT);

    assert!(matches!(
        pipeline.auto_complete(&mut s.store, 0, &doc),
        Err(BaixaError::InvalidInput(_))
    ));
    assert!(matches!(
        pipeline.auto_complete(&mut s.store, 1, &UploadedFile::new("vazio.pdf", vec![])),
        Err(BaixaError::InvalidInput(_))
    ));
    assert!(matches!(
        pipeline.auto_complete(&mut s.store, 2, &doc),
        Err(BaixaError::NoLayoutConfigured(2))
    ));
    assert!(matches!(
        pipeline.auto_complete(&mut s.store, 1, &file("nada.pdf", "texto qualquer sem campos")),
        Err(BaixaError::NoFieldsResolved)
    ));
    assert!(matches!(
        pipeline.auto_complete(&mut s.store, 1, &file("ruim.pdf", "%corrupt")),
        Err(BaixaError::Extraction(_))
    ));
}

#[test]
fn own_obligation_pattern_beats_keyword_table() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.save_layout(&layout_with_pattern("DCTF", "DCTF")).unwrap();
    let balancete = store
        .save_layout(&layout_with_pattern("Balancete", "BALANCETE"))
        .unwrap();
    let activity = store.add_activity(10, "Balancete", "Enviar balancete").unwrap();
    store.link_activity(balancete, activity).unwrap();
    let client = store
        .add_client(1, "ACME Comércio Ltda", "11.222.333/0001-44")
        .unwrap();
    let pending = store
        .add_task_instance(&instance(client, 10, 3, "Enviar balancete", "PDF Layout"))
        .unwrap();

    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);
    let report = pipeline
        .auto_complete(&mut store, 1, &file("balancete.pdf", BALANCETE_TEXT))
        .unwrap();

    assert_eq!(report.layout_used.id, balancete);
    assert_eq!(report.layout_used.score, 7);
    let scores: Vec<u32> = report.candidates.iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![6, 7]);
    assert_eq!(report.activity_completed.task_instance_id, pending);
}

#[test]
fn imported_layout_with_only_an_obligation_field() {
    let def = layouts::parse_layout_str(
        r#"{
            "name": "Balancete",
            "fields": [ { "kind": "obrigacao", "validation_pattern": "BALANCETE" } ],
            "activities": [
                { "obligation_id": 10, "obligation_name": "Balancete", "activity_text": "Enviar balancete" }
            ]
        }"#,
    )
    .unwrap();
    let layout = layouts::to_layout(&def, 1, Path::new(".")).unwrap();

    let mut store = SqliteStore::open_in_memory().unwrap();
    let layout_id = store.import_layout(&layout, &def.activities).unwrap();
    assert_eq!(store.get_layout(layout_id).unwrap().fields.len(), 3);
    let client = store
        .add_client(1, "ACME Comércio Ltda", "11.222.333/0001-44")
        .unwrap();
    let pending = store
        .add_task_instance(&instance(client, 10, 3, "Enviar balancete", "PDF Layout"))
        .unwrap();

    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);
    let text = "BALANCETE SIMPLES NACIONAL 11.222.333/0001-44 Competencia 03/2025";
    let report = pipeline
        .auto_complete(&mut store, 1, &file("balancete.pdf", text))
        .unwrap();

    assert_eq!(report.layout_used.id, layout_id);
    assert_eq!(report.extracted.tax_id.as_deref(), Some("11.222.333/0001-44"));
    assert_eq!(report.activity_completed.task_instance_id, pending);
}

// ---------------------------------------------------------------------------
// Batch: files are independent and reported in order
// ---------------------------------------------------------------------------
#[test]
fn batch_failures_are_independent() {
    let mut s = setup("PDF Layout");
    let dctf = s.store.save_layout(&layout_with_pattern("DCTF", "DCTF")).unwrap();
    let activity = s.store.add_activity(20, "DCTF", "Transmitir DCTF").unwrap();
    s.store.link_activity(dctf, activity).unwrap();
    let other_client = s
        .store
        .add_client(1, "Beta Serviços", "22.333.444/0001-55")
        .unwrap();
    let dctf_instance = s
        .store
        .add_task_instance(&instance(other_client, 20, 4, "Transmitir DCTF", "PDF Layout"))
        .unwrap();

    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);

    let files = vec![
        file("balancete.pdf", BALANCETE_TEXT),
        file("corrompido.pdf", "%corrupt"),
        UploadedFile::new("vazio.pdf", vec![]),
        file("dctf.pdf", DCTF_TEXT),
    ];
    let report = pipeline.auto_complete_batch(&mut s.store, 1, &files).unwrap();

    assert_eq!(report.total_files, 4);
    assert_eq!(report.success_count, 2);
    assert_eq!(report.failure_count, 2);

    let names: Vec<&str> = report
        .per_file_results
        .iter()
        .map(|r| r.filename.as_str())
        .collect();
    assert_eq!(names, vec!["balancete.pdf", "corrompido.pdf", "vazio.pdf", "dctf.pdf"]);

    let corrupt = &report.per_file_results[1];
    assert_eq!(corrupt.status, RunStatus::Failed);
    assert_eq!(corrupt.stage, Some(FailureStage::Extraction));
    assert_eq!(corrupt.error_code, Some("extraction_failure"));

    let empty = &report.per_file_results[2];
    assert_eq!(empty.stage, Some(FailureStage::Input));

    let dctf_report = report.per_file_results[3].report.as_ref().unwrap();
    assert_eq!(dctf_report.layout_used.name, "DCTF");
    assert_eq!(dctf_report.activity_completed.task_instance_id, dctf_instance);
    assert_eq!(dctf_report.candidates.len(), 2);

    assert!(s.store.task_instance(s.instance_id).unwrap().unwrap().completed);
    assert!(s.store.task_instance(dctf_instance).unwrap().unwrap().completed);
}

#[test]
fn batch_without_files_is_invalid() {
    let mut s = setup("PDF Layout");
    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);
    assert!(matches!(
        pipeline.auto_complete_batch(&mut s.store, 1, &[]),
        Err(BaixaError::InvalidInput(_))
    ));
}

// ---------------------------------------------------------------------------
// Layout preview and status
// ---------------------------------------------------------------------------
#[test]
fn test_layout_previews_without_mutation() {
    let s = setup("PDF Layout");
    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);

    let report = pipeline
        .test_layout(&s.store, s.layout_id, &file("balancete.pdf", BALANCETE_TEXT))
        .unwrap();

    assert_eq!(report.layout_name, "Balancete");
    assert_eq!(report.per_field.len(), 3);
    assert!(report.per_field.iter().all(|f| f.passed));
    assert_eq!(report.per_field[0].matched_via, Some(MatchStrategy::Regex));
    let satisfied: Vec<Option<bool>> = report.per_field.iter().map(|f| f.satisfied).collect();
    assert_eq!(satisfied, vec![Some(true), None, None]);
    assert_eq!(
        report.raw_lines,
        vec![
            "BALANCETE SIMPLES NACIONAL",
            "11.222.333/0001-44",
            "Competência",
            "03/2025"
        ]
    );
    assert!(!s.store.task_instance(s.instance_id).unwrap().unwrap().completed);
}

#[test]
fn test_layout_unknown_id() {
    let s = setup("PDF Layout");
    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);
    assert!(matches!(
        pipeline.test_layout(&s.store, 999, &file("x.pdf", BALANCETE_TEXT)),
        Err(BaixaError::LayoutNotFound(999))
    ));
}

#[test]
fn recompute_status_is_persisted() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let mut layout = layout_with_pattern("Balancete", "BALANCETE");
    layout.field_mut(&FieldKind::Period).unwrap().expected_value = Some("03/2025".into());
    layout.source_document = Some(SourceDocument {
        filename: "referencia.pdf".into(),
        bytes: BALANCETE_TEXT.as_bytes().to_vec(),
    });
    let ready_id = store.save_layout(&layout).unwrap();

    layout.field_mut(&FieldKind::Period).unwrap().expected_value = Some("12/2024".into());
    let validating_id = store.save_layout(&layout).unwrap();

    layout.source_document = None;
    let pending_id = store.save_layout(&layout).unwrap();

    let config = EngineConfig::default();
    let clock = clock();
    let pipeline = Pipeline::new(&MockExtractor, &config, &clock);

    let ready = pipeline.recompute_layout_status(&mut store, ready_id).unwrap();
    assert_eq!(ready.status, LayoutStatus::Ready);
    assert_eq!((ready.fields_passed, ready.fields_total), (2, 2));

    let validating = pipeline
        .recompute_layout_status(&mut store, validating_id)
        .unwrap();
    assert_eq!(validating.status, LayoutStatus::Validating);

    let pending = pipeline.recompute_layout_status(&mut store, pending_id).unwrap();
    assert_eq!(pending.status, LayoutStatus::Pending);

    assert_eq!(store.get_layout(ready_id).unwrap().status, LayoutStatus::Ready);
    assert_eq!(
        store.get_layout(validating_id).unwrap().status,
        LayoutStatus::Validating
    );
}
