use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::error::ExtractionError;

/// Format of an uploaded document, decided once at the upload boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Text,
}

impl FileType {
    /// Detect from the filename extension, falling back to magic bytes.
    pub fn detect(filename: &str, bytes: &[u8]) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => return FileType::Pdf,
            Some("docx") => return FileType::Docx,
            _ => {}
        }
        if bytes.starts_with(b"%PDF-") {
            FileType::Pdf
        } else if bytes.starts_with(b"PK\x03\x04") {
            FileType::Docx
        } else {
            FileType::Text
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileType::Pdf => "PDF",
            FileType::Docx => "DOCX",
            FileType::Text => "text",
        };
        f.write_str(name)
    }
}

/// Turn raw upload bytes into plain text for chunking.
pub fn extract_text(file_type: FileType, bytes: &[u8]) -> Result<String, ExtractionError> {
    match file_type {
        FileType::Text => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            let text = std::str::from_utf8(bytes)?;
            if text.trim().is_empty() {
                return Err(ExtractionError::Empty);
            }
            Ok(text.to_string())
        }
        FileType::Pdf | FileType::Docx => Err(ExtractionError::Unsupported(file_type)),
    }
}
