use crate::error::BaixaError;
use crate::extraction::PdfExtractor;
use std::io::Write;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Only the first page is read, in raw content-stream order (no `-layout`),
/// which keeps labels and values of a row on the same or adjacent lines.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<String, BaixaError> {
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| BaixaError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| BaixaError::Extraction(e.to_string()))?;

        let output = Command::new("pdftotext")
            .args(["-f", "1", "-l", "1", "-enc", "UTF-8"])
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BaixaError::PdftotextNotFound
                } else {
                    BaixaError::Extraction(format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(BaixaError::PdftotextFailed { code, stderr });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let first_page = text.split('\x0c').next().unwrap_or_default();
        tracing::debug!(chars = first_page.len(), "pdftotext extracted first page");
        Ok(first_page.to_string())
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_bytes_fail() {
        if !PdftotextExtractor::is_available() {
            return;
        }
        let err = PdftotextExtractor::new()
            .extract_text(b"not a pdf")
            .unwrap_err();
        assert!(matches!(err, BaixaError::PdftotextFailed { .. }));
    }
}
