//! Provenance metadata attached to text units, chunks and stored vectors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Well-known metadata keys
pub mod keys {
    /// Display filename used for citations and filtering
    pub const SOURCE: &str = "source";
    /// Base name of the file actually read from disk
    pub const FILENAME: &str = "filename";
    /// Lowercased extension including the dot, e.g. `.pdf`
    pub const FILE_TYPE: &str = "file_type";
    /// 0-based page index (paged formats only)
    pub const PAGE: &str = "page";
    /// 0-based data row (CSV only)
    pub const ROW: &str = "row";
    /// Ordinal of a unit within its file, then of a chunk within its unit
    pub const CHUNK_ID: &str = "chunk_id";
    /// Ordinal of the parent unit, kept on chunks
    pub const UNIT_INDEX: &str = "unit_index";
    /// Name the user uploaded the file under
    pub const ORIGINAL_FILENAME: &str = "original_filename";
    pub const UPLOAD_ID: &str = "upload_id";
    pub const UPLOAD_TIMESTAMP: &str = "upload_timestamp";
    pub const FILE_SIZE: &str = "file_size";
}

/// A scalar metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    /// Borrow as a string if this is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view; integral text values are accepted too
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for MetadataValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for MetadataValue {
    fn from(v: u64) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for MetadataValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// String-keyed scalar metadata, ordered for stable serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(BTreeMap<String, MetadataValue>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<MetadataValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(MetadataValue::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(MetadataValue::as_i64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataValue> {
        self.0.remove(key)
    }

    /// Merge `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: &Metadata) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The display filename: `source`, non-empty
    pub fn source(&self) -> Option<&str> {
        self.get_str(keys::SOURCE).filter(|s| !s.is_empty())
    }

    /// The name a whole document is managed under: the uploaded name, else `source`
    pub fn document_name(&self) -> Option<&str> {
        self.get_str(keys::ORIGINAL_FILENAME)
            .filter(|s| !s.is_empty())
            .or_else(|| self.source())
    }

    pub fn page(&self) -> Option<u32> {
        self.get_i64(keys::PAGE).and_then(|p| u32::try_from(p).ok())
    }

    pub fn chunk_id(&self) -> Option<u32> {
        self.get_i64(keys::CHUNK_ID).and_then(|c| u32::try_from(c).ok())
    }
}

impl FromIterator<(String, MetadataValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, MetadataValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_precedence() {
        let mut base = Metadata::new().with("a", 1i64).with("b", "base");
        let top = Metadata::new().with("b", "top").with("c", true);
        base.merge(&top);

        assert_eq!(base.get_i64("a"), Some(1));
        assert_eq!(base.get_str("b"), Some("top"));
        assert_eq!(base.get("c"), Some(&MetadataValue::Bool(true)));
    }

    #[test]
    fn test_json_roundtrip_keeps_scalar_kinds() {
        let meta = Metadata::new()
            .with(keys::SOURCE, "report.pdf")
            .with(keys::PAGE, 3u32)
            .with("score", 0.5f64);
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"page":3,"score":0.5,"source":"report.pdf"}"#);

        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meta);
        assert_eq!(back.page(), Some(3));
    }

    #[test]
    fn test_document_name_prefers_original_filename() {
        let meta = Metadata::new()
            .with(keys::SOURCE, "tmpab12.pdf")
            .with(keys::ORIGINAL_FILENAME, "Contract.pdf");
        assert_eq!(meta.document_name(), Some("Contract.pdf"));

        let meta = Metadata::new().with(keys::SOURCE, "notes.txt");
        assert_eq!(meta.document_name(), Some("notes.txt"));

        let meta = Metadata::new().with(keys::SOURCE, "");
        assert_eq!(meta.source(), None);
    }
}
