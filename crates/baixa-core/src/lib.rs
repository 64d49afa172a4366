pub mod clock;
pub mod config;
pub mod error;
pub mod extraction;
pub mod layouts;
pub mod matching;
pub mod model;
pub mod period;
pub mod reconcile;
pub mod report;
pub mod select;
pub mod store;
pub mod tokenize;

use clock::Clock;
use config::EngineConfig;
use error::BaixaError;
use extraction::PdfExtractor;
use matching::FieldMatcher;
use model::{ExtractedValues, Layout, UploadedFile};
use reconcile::ReconcileRequest;
use report::{
    AutoCompleteReport, BatchReport, FieldTestResult, FileResult, LayoutTestReport, LayoutUsed,
    RunStatus,
};
use select::status::{evaluate_status, StatusReport};
use store::Store;
use tokenize::TokenizedDocument;

/// Main API entry point: the extraction pipeline and its collaborators.
pub struct Pipeline<'a> {
    extractor: &'a dyn PdfExtractor,
    config: &'a EngineConfig,
    clock: &'a dyn Clock,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        extractor: &'a dyn PdfExtractor,
        config: &'a EngineConfig,
        clock: &'a dyn Clock,
    ) -> Self {
        Pipeline {
            extractor,
            config,
            clock,
        }
    }

    /// Extract the first page and tokenize it.
    pub fn read_document(&self, bytes: &[u8]) -> Result<TokenizedDocument, BaixaError> {
        let text = self.extractor.extract_text(bytes)?;
        if text.trim().is_empty() {
            return Err(BaixaError::Extraction(
                "no text found on the first page".into(),
            ));
        }
        Ok(tokenize::tokenize_with_width(&text, self.config.chunk_width))
    }

    /// Run one layout against one file and report per-field results.
    /// Performs no mutation.
    pub fn test_layout(
        &self,
        store: &dyn Store,
        layout_id: i64,
        file: &UploadedFile,
    ) -> Result<LayoutTestReport, BaixaError> {
        validate_file(file)?;
        let layout = store.get_layout(layout_id)?;
        let doc = self.read_document(&file.bytes)?;
        let extraction = FieldMatcher::new(self.config).extract(&layout, &doc);

        let per_field = layout
            .fields
            .iter()
            .zip(extraction.fields)
            .map(|(spec, f)| FieldTestResult {
                passed: f.resolved.is_some(),
                satisfied: spec
                    .is_checkable()
                    .then(|| matching::field_satisfied(spec, &doc)),
                matched_via: f.resolved.as_ref().map(|r| r.strategy),
                resolved_value: f.resolved.map(|r| r.value),
                kind: f.kind,
            })
            .collect();

        Ok(LayoutTestReport {
            layout_id: layout.id,
            layout_name: layout.name,
            per_field,
            raw_lines: doc.lines().to_vec(),
        })
    }

    /// Full pipeline for one file against every layout of the tenant.
    pub fn auto_complete(
        &self,
        store: &mut dyn Store,
        tenant_id: i64,
        file: &UploadedFile,
    ) -> Result<AutoCompleteReport, BaixaError> {
        validate_tenant(tenant_id)?;
        validate_file(file)?;
        let layouts = tenant_layouts(store, tenant_id)?;
        self.process(store, tenant_id, &layouts, file)
    }

    /// Run the pipeline per file, in submission order. A failing file is
    /// recorded and never stops the rest of the batch.
    pub fn auto_complete_batch(
        &self,
        store: &mut dyn Store,
        tenant_id: i64,
        files: &[UploadedFile],
    ) -> Result<BatchReport, BaixaError> {
        validate_tenant(tenant_id)?;
        if files.is_empty() {
            return Err(BaixaError::InvalidInput("no files submitted".into()));
        }
        let layouts = tenant_layouts(store, tenant_id)?;

        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let outcome = match validate_file(file) {
                Ok(()) => self.process(store, tenant_id, &layouts, file),
                Err(e) => Err(e),
            };
            results.push(match outcome {
                Ok(report) => FileResult::completed(&file.filename, report),
                Err(e) => {
                    tracing::debug!(file = %file.filename, error = %e, "batch file failed");
                    FileResult::failed(&file.filename, &e)
                }
            });
        }

        Ok(BatchReport::from_results(results))
    }

    /// Re-derive a layout's status from its reference document and persist it.
    pub fn recompute_layout_status(
        &self,
        store: &mut dyn Store,
        layout_id: i64,
    ) -> Result<StatusReport, BaixaError> {
        let layout = store.get_layout(layout_id)?;
        let doc = layout
            .source_document
            .as_ref()
            .and_then(|source| match self.read_document(&source.bytes) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!(
                        layout = %layout.name,
                        file = %source.filename,
                        error = %e,
                        "reference document unreadable; no field passes"
                    );
                    None
                }
            });

        let report = evaluate_status(&layout, doc.as_ref());
        store.update_layout_status(layout.id, report.status)?;
        tracing::debug!(layout = %layout.name, status = %report.status, "layout status recomputed");
        Ok(report)
    }

    fn process(
        &self,
        store: &mut dyn Store,
        tenant_id: i64,
        layouts: &[Layout],
        file: &UploadedFile,
    ) -> Result<AutoCompleteReport, BaixaError> {
        let doc = self.read_document(&file.bytes)?;
        tracing::debug!(file = %file.filename, lines = doc.len(), "document tokenized");

        let selection = select::select_layout(layouts, &doc, self.config)?;
        let extracted = ExtractedValues::from(&selection.extraction);

        let outcome = reconcile::reconcile(
            store,
            self.clock,
            self.config,
            &ReconcileRequest {
                tenant_id,
                layout: selection.layout,
                values: &extracted,
                file,
            },
        )?;

        Ok(AutoCompleteReport {
            status: RunStatus::Completed,
            layout_used: LayoutUsed {
                id: selection.layout.id,
                name: selection.layout.name.clone(),
                score: selection.score,
            },
            extracted,
            activity_completed: outcome,
            candidates: selection.candidates,
        })
    }
}

fn tenant_layouts(store: &dyn Store, tenant_id: i64) -> Result<Vec<Layout>, BaixaError> {
    let layouts = store.list_layouts(tenant_id)?;
    if layouts.is_empty() {
        return Err(BaixaError::NoLayoutConfigured(tenant_id));
    }
    Ok(layouts)
}

fn validate_tenant(tenant_id: i64) -> Result<(), BaixaError> {
    if tenant_id <= 0 {
        return Err(BaixaError::InvalidInput(format!(
            "invalid tenant id {tenant_id}"
        )));
    }
    Ok(())
}

fn validate_file(file: &UploadedFile) -> Result<(), BaixaError> {
    if file.filename.trim().is_empty() {
        return Err(BaixaError::InvalidInput("file has no name".into()));
    }
    if file.bytes.is_empty() {
        return Err(BaixaError::InvalidInput(format!(
            "file '{}' is empty",
            file.filename
        )));
    }
    Ok(())
}
