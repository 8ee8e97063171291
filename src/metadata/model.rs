//! Metadata value types
//!
//! Every non-required field has a default. Serialization omits fields equal
//! to their default, and deserialization fills them back in, so documents on
//! disk stay minimal.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::time::optional_timestamp;

/// Current cache info schema version
pub const CACHE_INFO_VERSION: u32 = 1;

/// Free-form key/value metadata attached to an entry, passed through untouched
pub type Metadata = BTreeMap<String, Value>;

fn default_version() -> u32 {
    CACHE_INFO_VERSION
}

/// Metadata for one cached item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Relative identifier of the cached item, unique within its part
    pub path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(
        default,
        with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created: Option<NaiveDateTime>,

    #[serde(
        default,
        with = "optional_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_access: Option<NaiveDateTime>,

    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: Metadata,
}

impl EntryMetadata {
    /// Create an entry with only its path set
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: String::new(),
            created: None,
            last_access: None,
            size: None,
            metadata: Metadata::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_created(mut self, created: NaiveDateTime) -> Self {
        self.created = Some(created);
        self
    }

    pub fn with_last_access(mut self, last_access: NaiveDateTime) -> Self {
        self.last_access = Some(last_access);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Convert to a plain JSON record, omitting default fields
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Build from a (possibly sparse) JSON record; only `path` is required
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// A named part of the cache (e.g. "models", "datasets")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl PartInfo {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// All entries of one part, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartData {
    #[serde(default)]
    pub entries: Vec<EntryMetadata>,
}

impl PartData {
    pub fn new(entries: Vec<EntryMetadata>) -> Self {
        Self { entries }
    }

    /// Find the first entry with the given path
    pub fn find(&self, path: &str) -> Option<&EntryMetadata> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    pub(crate) fn position(&self, path: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.path == path)
    }

    /// Sum of known entry sizes; entries without a size count as zero
    pub fn total_size(&self) -> u64 {
        self.entries.iter().filter_map(|entry| entry.size).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

/// Top-level description of a cache directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheInfo {
    /// Schema version, always written
    #[serde(default = "default_version")]
    pub version: u32,

    /// Owning library or tool
    pub library: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub parts: Vec<PartInfo>,
}

impl CacheInfo {
    pub fn new(library: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            version: CACHE_INFO_VERSION,
            library: library.into(),
            description: description.into(),
            parts: Vec::new(),
        }
    }

    pub fn with_parts(mut self, parts: Vec<PartInfo>) -> Self {
        self.parts = parts;
        self
    }

    /// Find a declared part by name
    pub fn part(&self, name: &str) -> Option<&PartInfo> {
        self.parts.iter().find(|part| part.name == name)
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    /// Build from a JSON record; fails if `library` is missing
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
