//! ds-cache-registry - Metadata registry for local caches of library assets
//!
//! Tracks, per cache directory, a top-level cache info and, per named part
//! ("models", "datasets", ...), the entries describing each cached item:
//! - Value types with minimal JSON documents (defaults omitted on write,
//!   filled in on read)
//! - Whole-document persistence under `<root>/.cache-registry/`
//! - A registry API for part and entry lifecycles
//!
//! Deleting payload files, eviction policy and cross-process locking are
//! left to the tools calling into the registry.

pub mod core;
pub mod metadata;
pub mod registry;

pub use crate::core::error::{RegistryError, Result};
pub use crate::metadata::manager::MetadataManager;
pub use crate::metadata::model::{
    CacheInfo, EntryMetadata, Metadata, PartData, PartInfo, CACHE_INFO_VERSION,
};
pub use crate::registry::{CacheRegistry, RegistryConfig};
