//! Error types for the metadata registry
//!
//! "Not found" is never an error here: absent parts and entries surface as
//! `None`, empty lists or `false`. Only hard failures live in this enum.

use std::io;
use std::path::{Path, PathBuf};

/// Hard failures raised by the manager and registry
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A metadata document exists but cannot be parsed, or lacks a required field
    #[error("corrupted metadata document {}: {source}", .path.display())]
    DataCorruption {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem failure while reading or writing metadata
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Part name that cannot be mapped to a document under the cache root
    #[error("invalid part name: {0:?}")]
    InvalidPartName(String),
}

impl RegistryError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        RegistryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupted(path: &Path, source: serde_json::Error) -> Self {
        RegistryError::DataCorruption {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the on-disk store is inconsistent (as opposed to an I/O failure)
    pub fn is_corruption(&self) -> bool {
        matches!(self, RegistryError::DataCorruption { .. })
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
