use crate::DocumentPath;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field content of one document, keyed by field name.
pub type Fields = IndexMap<String, FieldValue>;

/// A document field value.
///
/// Every column is coerced to text, so there is a single variant. It
/// serializes with the document store's tag, e.g. `{"stringValue": "42"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    #[serde(rename = "stringValue")]
    String(String),
}

impl FieldValue {
    pub fn as_str(&self) -> &str {
        match self {
            Self::String(v) => v,
        }
    }
}

impl From<String> for FieldValue {
    fn from(src: String) -> Self {
        Self::String(src)
    }
}

impl From<&str> for FieldValue {
    fn from(src: &str) -> Self {
        Self::String(src.to_string())
    }
}

/// A named document: its full path and its complete field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: DocumentPath,
    pub fields: Fields,
}

/// A write operation handed to a sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Write {
    /// Replaces the document at `name` with exactly `fields`. Fields present
    /// in a stored document but absent here are removed; there is no merge.
    Update(Document),
}

impl Write {
    pub fn update(name: DocumentPath, fields: Fields) -> Self {
        Self::Update(Document { name, fields })
    }

    /// The path the write targets.
    pub fn name(&self) -> &DocumentPath {
        match self {
            Self::Update(document) => &document.name,
        }
    }

    pub fn document(&self) -> &Document {
        match self {
            Self::Update(document) => document,
        }
    }

    pub fn into_document(self) -> Document {
        match self {
            Self::Update(document) => document,
        }
    }
}
