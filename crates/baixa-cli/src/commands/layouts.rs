use baixa_core::clock::SystemClock;
use baixa_core::error::BaixaError;
use baixa_core::extraction::DetectingExtractor;
use baixa_core::layouts;
use baixa_core::store::Store;
use baixa_core::Pipeline;
use std::path::{Path, PathBuf};

use super::Context;
use crate::output;

pub fn import(ctx: &Context, tenant: i64, files: &[PathBuf]) -> Result<(), BaixaError> {
    if tenant <= 0 {
        return Err(BaixaError::InvalidInput(format!("invalid tenant id {tenant}")));
    }

    // Validate everything before touching the database.
    let defs = files
        .iter()
        .map(|path| layouts::load_layout(path).map(|def| (path, def)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut store = ctx.open_store()?;
    let extractor = DetectingExtractor::new();
    let pipeline = Pipeline::new(&extractor, &ctx.config, &SystemClock);

    for (path, def) in &defs {
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let layout = layouts::to_layout(def, tenant, base_dir)?;
        let layout_id = store.import_layout(&layout, &def.activities)?;

        let status = pipeline.recompute_layout_status(&mut store, layout_id)?;
        println!(
            "Imported '{}' as layout {} ({}, {}/{} fields pass)",
            def.name, layout_id, status.status, status.fields_passed, status.fields_total
        );
    }
    Ok(())
}

pub fn list(ctx: &Context, tenant: i64) -> Result<(), BaixaError> {
    let store = ctx.open_store()?;
    let layouts = store.list_layouts(tenant)?;
    if ctx.json() {
        output::json::print(&layouts)
    } else {
        output::table::print_layouts(&layouts);
        Ok(())
    }
}

pub fn validate(file: &Path) -> Result<(), BaixaError> {
    let def = layouts::load_layout(file)?;
    println!(
        "Valid layout: {} ({} fields, {} linked activities)",
        def.name,
        def.fields.len(),
        def.activities.len()
    );
    Ok(())
}
