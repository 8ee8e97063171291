//! Metadata module - Manages the `.cache-registry/` metadata directory
//!
//! Provides:
//! - Value types for cache info, parts and entries
//! - Whole-document persistence of those types (MetadataManager)

pub mod manager;
pub mod model;
