//! Port definitions (hexagonal architecture interfaces)
//!
//! The sync engine depends only on these traits; their implementations
//! live in the adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteStorage`] - Bucket listing, download links, object transfer
//! - [`ILocalFileSystem`] - Local mirror inspection and writes
//! - [`INotificationService`] - Push notifications about incomplete runs

pub mod local_filesystem;
pub mod notification;
pub mod remote_storage;

pub use local_filesystem::{FileSystemState, ILocalFileSystem};
pub use notification::{INotificationService, Notification, NotificationPriority};
pub use remote_storage::IRemoteStorage;
