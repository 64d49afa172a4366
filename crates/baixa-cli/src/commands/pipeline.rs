use baixa_core::clock::SystemClock;
use baixa_core::error::BaixaError;
use baixa_core::extraction::DetectingExtractor;
use baixa_core::Pipeline;
use std::path::{Path, PathBuf};

use super::{read_upload, Context};
use crate::output;

pub fn test_layout(ctx: &Context, layout_id: i64, input_file: &Path) -> Result<(), BaixaError> {
    let store = ctx.open_store()?;
    let file = read_upload(input_file)?;
    let extractor = DetectingExtractor::new();
    let pipeline = Pipeline::new(&extractor, &ctx.config, &SystemClock);

    let report = pipeline.test_layout(&store, layout_id, &file)?;
    if ctx.json() {
        output::json::print(&report)
    } else {
        output::table::print_layout_test(&report);
        Ok(())
    }
}

pub fn auto_complete(ctx: &Context, tenant: i64, input_file: &Path) -> Result<(), BaixaError> {
    let mut store = ctx.open_store()?;
    let file = read_upload(input_file)?;
    let extractor = DetectingExtractor::new();
    let pipeline = Pipeline::new(&extractor, &ctx.config, &SystemClock);

    let report = pipeline.auto_complete(&mut store, tenant, &file)?;
    if ctx.json() {
        output::json::print(&report)
    } else {
        output::table::print_auto_complete(&report);
        Ok(())
    }
}

pub fn auto_complete_batch(
    ctx: &Context,
    tenant: i64,
    input_files: &[PathBuf],
) -> Result<(), BaixaError> {
    let mut store = ctx.open_store()?;
    let files = input_files
        .iter()
        .map(|p| read_upload(p))
        .collect::<Result<Vec<_>, _>>()?;
    let extractor = DetectingExtractor::new();
    let pipeline = Pipeline::new(&extractor, &ctx.config, &SystemClock);

    let report = pipeline.auto_complete_batch(&mut store, tenant, &files)?;
    if ctx.json() {
        output::json::print(&report)
    } else {
        output::table::print_batch(&report);
        Ok(())
    }
}

pub fn recompute_status(ctx: &Context, layout_id: i64) -> Result<(), BaixaError> {
    let mut store = ctx.open_store()?;
    let extractor = DetectingExtractor::new();
    let pipeline = Pipeline::new(&extractor, &ctx.config, &SystemClock);

    let report = pipeline.recompute_layout_status(&mut store, layout_id)?;
    if ctx.json() {
        output::json::print(&report)
    } else {
        output::table::print_status(layout_id, &report);
        Ok(())
    }
}
