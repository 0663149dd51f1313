//! Text extraction from uploaded document sources.
//!
//! PDF sources go through the `pdf-extract` text layer; TXT sources are read as UTF-8 with
//! a basic binary sniff. Extraction cannot be partially completed: any failure here aborts
//! ingestion for the document.

use std::path::Path;

use thiserror::Error;

/// Errors raised while obtaining text from a source document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Source bytes were not readable as text.
    #[error("source is not readable text")]
    InvalidText,
    /// PDF text layer could not be decoded.
    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),
    /// Extraction succeeded but produced no usable text.
    #[error("source contained no extractable text")]
    Empty,
}

/// Supported source document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceType {
    /// PDF document with a text layer.
    Pdf,
    /// Plain UTF-8 text document.
    Txt,
}

impl SourceType {
    /// Detect the source type from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Detect the source type from a file path.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Label persisted in the `file_type` field of indexed records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }
}

/// Extract the full text of a source document.
///
/// Returns [`ExtractionError::Empty`] when the source decodes to nothing but whitespace;
/// downstream chunking treats empty text as an empty document, but a caller handing us a
/// source expects text back.
pub fn extract_text(bytes: &[u8], source_type: SourceType) -> Result<String, ExtractionError> {
    let text = match source_type {
        SourceType::Txt => extract_plain_text(bytes)?,
        SourceType::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|error| ExtractionError::Pdf(error.to_string()))?,
    };

    if text.trim().is_empty() {
        return Err(ExtractionError::Empty);
    }
    Ok(text)
}

fn extract_plain_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let content = std::str::from_utf8(bytes).map_err(|_| ExtractionError::InvalidText)?;
    if looks_binary(content) {
        return Err(ExtractionError::InvalidText);
    }
    Ok(content.to_string())
}

/// Reject content whose control-character density suggests a binary payload with a
/// text-looking extension.
fn looks_binary(content: &str) -> bool {
    if content.is_empty() {
        return false;
    }
    let control_chars = content
        .chars()
        .filter(|c| c.is_control() && *c != '\n' && *c != '\r' && *c != '\t')
        .count();
    control_chars > content.chars().count() / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn txt_extraction_round_trips_utf8() {
        let text = extract_text("Lease term: 12 months.\n".as_bytes(), SourceType::Txt)
            .expect("extraction succeeded");
        assert_eq!(text, "Lease term: 12 months.\n");
    }

    #[test]
    fn txt_extraction_rejects_invalid_utf8() {
        let error = extract_text(&[0xff, 0xfe, 0x00], SourceType::Txt).unwrap_err();
        assert!(matches!(error, ExtractionError::InvalidText));
    }

    #[test]
    fn txt_extraction_rejects_binary_density() {
        let bytes: Vec<u8> = (0u8..8).chain("ab".bytes()).collect();
        let error = extract_text(&bytes, SourceType::Txt).unwrap_err();
        assert!(matches!(error, ExtractionError::InvalidText));
    }

    #[test]
    fn txt_extraction_rejects_whitespace_only() {
        let error = extract_text("   \n\t  ".as_bytes(), SourceType::Txt).unwrap_err();
        assert!(matches!(error, ExtractionError::Empty));
    }

    #[test]
    fn source_type_from_extension_is_case_insensitive() {
        assert_eq!(SourceType::from_extension("PDF"), Some(SourceType::Pdf));
        assert_eq!(SourceType::from_extension("txt"), Some(SourceType::Txt));
        assert_eq!(SourceType::from_extension("docx"), None);
    }

    #[test]
    fn source_type_from_path_uses_extension() {
        assert_eq!(
            SourceType::from_path(Path::new("lease.pdf")),
            Some(SourceType::Pdf)
        );
        assert_eq!(SourceType::from_path(Path::new("noext")), None);
    }
}
