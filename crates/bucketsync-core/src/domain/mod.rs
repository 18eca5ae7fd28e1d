//! Domain types
//!
//! This module contains the core domain types for bucketsync:
//! - Newtypes for validated keys, cursor tokens and local paths
//! - Remote object snapshots and listing pages
//! - The per-object freshness verdict
//! - Run counters and the run summary
//! - Domain-specific error types

pub mod errors;
pub mod newtypes;
pub mod object;
pub mod run;
pub mod verdict;

// Re-export commonly used types
pub use errors::DomainError;
pub use newtypes::{CursorToken, ObjectKey, SyncPath};
pub use object::{ListingPage, RemoteObjectMetadata};
pub use run::{RunCounters, RunResult};
pub use verdict::FreshnessVerdict;
