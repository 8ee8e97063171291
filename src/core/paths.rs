//! On-disk layout of the metadata store
//!
//! Everything lives under `<root>/.cache-registry/`: one `info.json` for the
//! cache info and one `parts/<name>.json` per part.

use std::path::{Path, PathBuf};

use crate::core::error::{RegistryError, Result};

/// Metadata directory name, relative to the cache root
pub const METADATA_DIR: &str = ".cache-registry";
/// Cache info document name
pub const INFO_FILE: &str = "info.json";
/// Directory holding one document per part
pub const PARTS_DIR: &str = "parts";
/// Extension of part documents
pub const PART_EXTENSION: &str = "json";

/// Get the metadata directory for a given cache root
pub fn metadata_dir(root: &Path) -> PathBuf {
    root.join(METADATA_DIR)
}

/// Get the cache info document for a given cache root
pub fn info_file(root: &Path) -> PathBuf {
    metadata_dir(root).join(INFO_FILE)
}

/// Get the directory holding part documents
pub fn parts_dir(root: &Path) -> PathBuf {
    metadata_dir(root).join(PARTS_DIR)
}

/// Check that a part name can be used as a file stem
pub fn is_valid_part_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

/// Get the document for a part, rejecting names that would escape `parts/`
pub fn part_file(root: &Path, name: &str) -> Result<PathBuf> {
    if !is_valid_part_name(name) {
        return Err(RegistryError::InvalidPartName(name.to_string()));
    }
    Ok(parts_dir(root).join(format!("{name}.{PART_EXTENSION}")))
}

/// Recover the part name from a document path (`parts/models.json` -> `models`)
pub fn part_name_from_file(path: &Path) -> Option<String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(PART_EXTENSION) {
        return None;
    }
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| is_valid_part_name(stem))
        .map(str::to_string)
}
