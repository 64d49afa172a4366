use crate::error::BaixaError;
use crate::extraction::{PdfExtractor, PdftotextExtractor, PlainTextExtractor};

/// Dispatches on the `%PDF-` magic: real PDFs go through pdftotext,
/// anything else is treated as already-extracted text.
#[derive(Default)]
pub struct DetectingExtractor {
    pdf: PdftotextExtractor,
    text: PlainTextExtractor,
}

impl DetectingExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    fn backend_for(&self, bytes: &[u8]) -> &dyn PdfExtractor {
        if is_pdf(bytes) {
            &self.pdf
        } else {
            &self.text
        }
    }
}

/// Whether `bytes` carry a PDF header (leading whitespace tolerated).
pub fn is_pdf(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(b"%PDF-")
}

impl PdfExtractor for DetectingExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, BaixaError> {
        let backend = self.backend_for(pdf_bytes);
        tracing::debug!(backend = backend.backend_name(), "extracting text");
        backend.extract_text(pdf_bytes)
    }

    fn backend_name(&self) -> &str {
        "detect"
    }
}
