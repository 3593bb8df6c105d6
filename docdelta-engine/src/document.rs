//! Uploaded documents and format handling.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use docdelta::{ContentHash, Side};
use serde::{Deserialize, Serialize};

use crate::EngineError;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Accepted document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeType {
    Pdf,
    Docx,
    Text,
}

impl MimeType {
    pub fn as_str(self) -> &'static str {
        match self {
            MimeType::Pdf => "application/pdf",
            MimeType::Docx => DOCX_MIME,
            MimeType::Text => "text/plain",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(MimeType::Pdf),
            "docx" => Some(MimeType::Docx),
            "txt" | "text" => Some(MimeType::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MimeType {
    type Err = String;

    /// Parses a MIME type, ignoring parameters such as `; charset=utf-8`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" => Ok(MimeType::Pdf),
            DOCX_MIME => Ok(MimeType::Docx),
            "text/plain" => Ok(MimeType::Text),
            _ => Err(s.to_string()),
        }
    }
}

/// One side of a comparison request, as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUpload {
    /// File name shown in the response summary
    pub name: String,
    /// Declared MIME type, validated by [`DocumentUpload::mime_type`]
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: bytes.into(),
        }
    }

    /// A `text/plain` document.
    pub fn text(name: impl Into<String>, text: &str) -> Self {
        Self::new(name, MimeType::Text.as_str(), text.as_bytes())
    }

    pub fn content_hash(&self) -> ContentHash {
        ContentHash::of(&self.bytes)
    }

    pub fn mime_type(&self, side: Side) -> Result<MimeType, EngineError> {
        self.mime
            .parse()
            .map_err(|mime| EngineError::UnsupportedFormat { side, mime })
    }

    /// Check size and format before any work is done.
    pub fn validate(&self, side: Side, max_bytes: usize) -> Result<MimeType, EngineError> {
        if self.bytes.len() > max_bytes {
            return Err(EngineError::DocumentTooLarge {
                side,
                size: self.bytes.len(),
                limit: max_bytes,
            });
        }
        self.mime_type(side)
    }
}

/// Formats the export layer renders results to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
    Word,
}

impl ExportFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Word => DOCX_MIME,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Word => "docx",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            "word" | "docx" => Ok(ExportFormat::Word),
            _ => Err(format!("unknown export format {:?} (expected csv, pdf or word)", s)),
        }
    }
}
