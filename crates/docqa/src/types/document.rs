//! Text units, chunks and supported file formats

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::metadata::{keys, Metadata};

/// Supported input formats, chosen purely by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF, one unit per page
    Pdf,
    /// Word document (.docx / .doc), whole document
    Word,
    /// Markdown rendered to text, whole document
    Markdown,
    /// HTML rendered to text, whole document
    Html,
    /// CSV, one unit per data row
    Csv,
    /// Anything else: best-effort text with encoding detection
    PlainText,
}

impl DocumentFormat {
    /// Detect the format from a bare extension (without the dot)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" | "doc" => Self::Word,
            "md" => Self::Markdown,
            "htm" | "html" => Self::Html,
            "csv" => Self::Csv,
            _ => Self::PlainText,
        }
    }

    /// Detect the format from a path
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::PlainText)
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Word => "Word Document",
            Self::Markdown => "Markdown",
            Self::Html => "HTML",
            Self::Csv => "CSV",
            Self::PlainText => "Text File",
        }
    }
}

/// The `file_type` metadata value for a path: lowercased extension with its dot
pub fn file_type_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// One logical piece of extracted content (a page, a whole file, a CSV row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    pub content: String,
    pub metadata: Metadata,
}

impl TextUnit {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }
}

/// A bounded-length slice of a text unit, ready for embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub metadata: Metadata,
}

impl Chunk {
    pub fn new(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Display filename, if present and non-empty
    pub fn source(&self) -> Option<&str> {
        self.metadata.source()
    }

    pub fn page(&self) -> Option<u32> {
        self.metadata.page()
    }

    pub fn chunk_id(&self) -> Option<u32> {
        self.metadata.chunk_id()
    }

    /// Provenance tag used when the chunk is shown to the model
    pub fn provenance_tag(&self) -> String {
        let source = self.source().unwrap_or("Unknown");
        let page = self
            .metadata
            .get(keys::PAGE)
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        format!("[Source: {}, Page: {}]", source, page)
    }

    /// Length in characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
