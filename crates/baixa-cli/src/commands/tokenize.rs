use baixa_core::clock::SystemClock;
use baixa_core::error::BaixaError;
use baixa_core::extraction::DetectingExtractor;
use baixa_core::Pipeline;
use std::path::Path;

use super::{read_upload, Context};
use crate::output;

pub fn run(ctx: &Context, input_file: &Path) -> Result<(), BaixaError> {
    let file = read_upload(input_file)?;
    let extractor = DetectingExtractor::new();
    let pipeline = Pipeline::new(&extractor, &ctx.config, &SystemClock);

    let doc = pipeline.read_document(&file.bytes)?;
    if ctx.json() {
        output::json::print(&doc.lines())
    } else {
        output::table::print_tokens(doc.lines());
        Ok(())
    }
}
