//! Metadata manager - Read/write cache info and part documents
//!
//! Every mutator loads the whole part, changes it in memory and writes the
//! whole part back. There is no locking: concurrent writers to the same part
//! race and the last full write wins.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::error::{RegistryError, Result};
use crate::core::paths::{
    info_file, is_valid_part_name, part_file, part_name_from_file, parts_dir,
};
use crate::core::time;
use crate::metadata::model::{CacheInfo, EntryMetadata, PartData};

/// Low-level persistence of the metadata store under one cache root
#[derive(Debug, Clone)]
pub struct MetadataManager {
    root: PathBuf,
}

impl MetadataManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root this manager stores metadata for
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether a cache info document is present
    pub fn exists(&self) -> bool {
        info_file(&self.root).is_file()
    }

    /// Write the cache info, replacing any previous document
    pub fn write_info(&self, info: &CacheInfo) -> Result<()> {
        write_document(&info_file(&self.root), info)?;
        debug!(library = %info.library, parts = info.parts.len(), "Wrote cache info");
        Ok(())
    }

    /// Read the cache info, or `None` if none was written yet
    pub fn read_info(&self) -> Result<Option<CacheInfo>> {
        read_document(&info_file(&self.root))
    }

    /// Write all entries of a part as one document
    pub fn write_part(&self, part_name: &str, data: &PartData) -> Result<()> {
        let path = part_file(&self.root, part_name)?;
        write_document(&path, data)?;
        debug!(part = part_name, entries = data.len(), "Wrote part");
        Ok(())
    }

    /// Read a part, or `None` if it has no document
    pub fn read_part(&self, part_name: &str) -> Result<Option<PartData>> {
        // A name that cannot be stored cannot have been written either
        if !is_valid_part_name(part_name) {
            return Ok(None);
        }
        read_document(&part_file(&self.root, part_name)?)
    }

    /// Delete a part's document. Returns false if there was none.
    pub fn remove_part(&self, part_name: &str) -> Result<bool> {
        if !is_valid_part_name(part_name) {
            return Ok(false);
        }
        let path = part_file(&self.root, part_name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(part = part_name, "Removed part document");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RegistryError::io(&path, e)),
        }
    }

    /// All parts that have a stored document, keyed by part name
    ///
    /// Parts only declared in the cache info are not included.
    pub fn get_all_parts(&self) -> Result<BTreeMap<String, PartData>> {
        let dir = parts_dir(&self.root);
        let mut parts = BTreeMap::new();
        if !dir.is_dir() {
            return Ok(parts);
        }

        // Follow links so symlinked documents are listed like `read_part` sees them
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
                RegistryError::io(&path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = part_name_from_file(entry.path()) else {
                continue;
            };
            if let Some(data) = read_document::<PartData>(entry.path())? {
                parts.insert(name, data);
            }
        }

        Ok(parts)
    }

    /// Add an entry to a part, creating the part if needed
    ///
    /// With `update_if_exists`, an entry with the same path is replaced in
    /// place. Without it the entry is appended even if the path is already
    /// present.
    pub fn add_entry(
        &self,
        part_name: &str,
        entry: EntryMetadata,
        update_if_exists: bool,
    ) -> Result<()> {
        let mut data = self.read_part(part_name)?.unwrap_or_default();

        match data.position(&entry.path) {
            Some(index) if update_if_exists => {
                debug!(part = part_name, path = %entry.path, "Replacing entry");
                data.entries[index] = entry;
            }
            _ => {
                debug!(part = part_name, path = %entry.path, "Appending entry");
                data.entries.push(entry);
            }
        }

        self.write_part(part_name, &data)
    }

    /// Remove the first entry with the given path. Returns false (and writes
    /// nothing) if the part or entry does not exist.
    pub fn remove_entry(&self, part_name: &str, path: &str) -> Result<bool> {
        let Some(mut data) = self.read_part(part_name)? else {
            return Ok(false);
        };
        let Some(index) = data.position(path) else {
            return Ok(false);
        };

        data.entries.remove(index);
        self.write_part(part_name, &data)?;
        debug!(part = part_name, path, "Removed entry");
        Ok(true)
    }

    /// Set an entry's last access time to now. Returns false (and writes
    /// nothing) if the part or entry does not exist.
    ///
    /// The stored value never moves backwards, even if the clock does.
    pub fn update_entry_access(&self, part_name: &str, path: &str) -> Result<bool> {
        let Some(mut data) = self.read_part(part_name)? else {
            return Ok(false);
        };
        let Some(index) = data.position(path) else {
            return Ok(false);
        };

        let now = time::now();
        let entry = &mut data.entries[index];
        entry.last_access = Some(match entry.last_access {
            Some(previous) if previous > now => previous,
            _ => now,
        });

        self.write_part(part_name, &data)?;
        debug!(part = part_name, path, "Updated entry access time");
        Ok(true)
    }
}

/// Read and parse a JSON document. A missing file is `None`; a file that
/// does not parse is corruption.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RegistryError::io(path, e)),
    };

    // Invalid UTF-8 surfaces as a parse error, not an I/O error
    match serde_json::from_slice(&content) {
        Ok(value) => {
            debug!(path = %path.display(), "Read metadata document");
            Ok(Some(value))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupted metadata document");
            Err(RegistryError::corrupted(path, e))
        }
    }
}

/// Serialize a document and persist it through a temporary file in the same
/// directory, so readers see either the old or the new document.
fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| RegistryError::io(path, ErrorKind::InvalidInput.into()))?;
    fs::create_dir_all(dir).map_err(|e| RegistryError::io(dir, e))?;

    let json = serde_json::to_string_pretty(value).map_err(|e| RegistryError::corrupted(path, e))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|e| RegistryError::io(dir, e))?;
    if let Err(e) = writeln!(file, "{json}") {
        return Err(RegistryError::io(file.path(), e));
    }
    file.persist(path)
        .map_err(|e| RegistryError::io(path, e.error))?;
    Ok(())
}
