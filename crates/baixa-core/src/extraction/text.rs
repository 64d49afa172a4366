use crate::error::BaixaError;
use crate::extraction::PdfExtractor;

/// Backend for documents whose text was already extracted upstream.
///
/// Bytes are decoded as UTF-8 (lossily) and cut at the first form feed, so
/// `pdftotext` output for a whole file behaves like a first-page extraction.
#[derive(Default)]
pub struct PlainTextExtractor;

impl PdfExtractor for PlainTextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, BaixaError> {
        let text = String::from_utf8_lossy(pdf_bytes);
        let first_page = text.split('\x0c').next().unwrap_or_default();
        Ok(first_page.to_string())
    }

    fn backend_name(&self) -> &str {
        "plain-text"
    }
}
