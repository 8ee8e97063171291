//! Core module - Shared plumbing for the metadata store
//!
//! This module provides:
//! - Error types (hard failures only; "not found" is a normal outcome)
//! - On-disk layout of the metadata directory
//! - Timestamp formatting and the serde adapter for optional timestamps

pub mod error;
pub mod paths;
pub mod time;
