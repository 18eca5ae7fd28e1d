//! bucketsync Core - Domain logic and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemoteObjectMetadata`, `ListingPage`, `FreshnessVerdict`, `RunResult`
//! - **Port definitions** - Traits for adapters: `IRemoteStorage`, `ILocalFileSystem`,
//!   `INotificationService`
//! - **Configuration** - Typed YAML configuration with validation
//!
//! # Architecture
//!
//! The domain module contains pure types with no I/O. Ports define trait
//! interfaces that adapter crates implement; the sync engine in
//! `bucketsync-sync` drives them.

pub mod config;
pub mod domain;
pub mod ports;
