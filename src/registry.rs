//! Cache registry - Part and entry lifecycle on top of the metadata manager
//!
//! The registry never touches the cached payload itself. Collaborators that
//! own the files (e.g. a cleaner) delete them once `remove` returns `true`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::error::{RegistryError, Result};
use crate::core::paths::is_valid_part_name;
use crate::core::time;
use crate::metadata::manager::MetadataManager;
use crate::metadata::model::{CacheInfo, EntryMetadata, Metadata, PartInfo};

/// Settings needed to open a registry, loadable from a host tool's config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Cache root directory
    pub cache_path: PathBuf,

    /// Library or tool owning the cache
    pub library: String,

    #[serde(default)]
    pub description: String,
}

impl RegistryConfig {
    pub fn new(cache_path: impl Into<PathBuf>, library: impl Into<String>) -> Self {
        Self {
            cache_path: cache_path.into(),
            library: library.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// High-level registry for one cache directory
///
/// Creating a registry has no side effects; the store is only written by
/// `register_*` and the other mutating calls.
#[derive(Debug, Clone)]
pub struct CacheRegistry {
    manager: MetadataManager,
    library: String,
    description: String,
}

impl CacheRegistry {
    pub fn new(
        cache_path: impl Into<PathBuf>,
        library: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            manager: MetadataManager::new(cache_path),
            library: library.into(),
            description: description.into(),
        }
    }

    pub fn from_config(config: RegistryConfig) -> Self {
        Self::new(config.cache_path, config.library, config.description)
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    /// The underlying manager, for collaborators that need whole-part access
    pub fn manager(&self) -> &MetadataManager {
        &self.manager
    }

    /// Current cache info, if the cache has been initialized
    pub fn info(&self) -> Result<Option<CacheInfo>> {
        self.manager.read_info()
    }

    /// Declare a part in the cache info
    ///
    /// Registering an existing name does not add a second part; its
    /// description is only replaced when a non-empty one is given.
    #[instrument(skip(self), fields(library = %self.library))]
    pub fn register_part(&self, name: &str, description: &str) -> Result<()> {
        if !is_valid_part_name(name) {
            return Err(RegistryError::InvalidPartName(name.to_string()));
        }

        let mut info = self
            .manager
            .read_info()?
            .unwrap_or_else(|| CacheInfo::new(&self.library, &self.description));

        match info.parts.iter_mut().find(|part| part.name == name) {
            Some(part) => {
                if !description.is_empty() {
                    part.description = description.to_string();
                }
            }
            None => {
                debug!("Declaring new part");
                info.parts.push(PartInfo::new(name, description));
            }
        }

        self.manager.write_info(&info)
    }

    /// Forget a part: drop it from the cache info and delete its entries
    ///
    /// Returns true if the part was declared or had stored entries.
    #[instrument(skip(self), fields(library = %self.library))]
    pub fn unregister_part(&self, name: &str) -> Result<bool> {
        let mut declared = false;
        if let Some(mut info) = self.manager.read_info()? {
            let before = info.parts.len();
            info.parts.retain(|part| part.name != name);
            if info.parts.len() != before {
                self.manager.write_info(&info)?;
                declared = true;
            }
        }

        let stored = self.manager.remove_part(name)?;
        Ok(declared || stored)
    }

    /// Record an entry, stamping its creation and access times with now
    ///
    /// Re-registering a path replaces the previous entry in place.
    #[instrument(skip(self, description, metadata), fields(library = %self.library))]
    pub fn register_entry(
        &self,
        part: &str,
        path: &str,
        description: &str,
        size: Option<u64>,
        metadata: Metadata,
    ) -> Result<()> {
        let now = time::now();
        let mut entry = EntryMetadata::new(path)
            .with_description(description)
            .with_created(now)
            .with_last_access(now)
            .with_metadata(metadata);
        entry.size = size;

        self.manager.add_entry(part, entry, true)
    }

    /// Declared parts, in registration order
    pub fn list_parts(&self) -> Result<Vec<PartInfo>> {
        Ok(self
            .manager
            .read_info()?
            .map(|info| info.parts)
            .unwrap_or_default())
    }

    /// Entries of a part; empty for a part that has none stored
    pub fn list_entries(&self, part: &str) -> Result<Vec<EntryMetadata>> {
        Ok(self
            .manager
            .read_part(part)?
            .map(|data| data.entries)
            .unwrap_or_default())
    }

    pub fn get_entry(&self, part: &str, path: &str) -> Result<Option<EntryMetadata>> {
        Ok(self
            .manager
            .read_part(part)?
            .and_then(|data| data.find(path).cloned()))
    }

    /// Mark an entry as accessed now. Missing entries are ignored.
    pub fn touch(&self, part: &str, path: &str) -> Result<bool> {
        self.manager.update_entry_access(part, path)
    }

    /// Remove an entry's metadata. On `true` the caller deletes the payload.
    #[instrument(skip(self), fields(library = %self.library))]
    pub fn remove(&self, part: &str, path: &str) -> Result<bool> {
        self.manager.remove_entry(part, path)
    }

    /// Replace an entry's size, keeping its other fields and position.
    /// Missing entries are ignored.
    pub fn update_size(&self, part: &str, path: &str, size: u64) -> Result<bool> {
        let Some(entry) = self.get_entry(part, path)? else {
            return Ok(false);
        };
        self.manager.add_entry(part, entry.with_size(size), true)?;
        Ok(true)
    }

    /// Total recorded size of a part in bytes (0 for an unknown part)
    pub fn part_size(&self, part: &str) -> Result<u64> {
        Ok(self
            .manager
            .read_part(part)?
            .map(|data| data.total_size())
            .unwrap_or(0))
    }
}
