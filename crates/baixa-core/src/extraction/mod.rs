pub mod detect;
pub mod pdftotext;
pub mod text;

pub use detect::DetectingExtractor;
pub use pdftotext::PdftotextExtractor;
pub use text::PlainTextExtractor;

use crate::error::BaixaError;

/// Trait for PDF text extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract the text of the document's first page.
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, BaixaError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
