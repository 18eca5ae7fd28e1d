//! Remote object snapshots and listing pages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::{CursorToken, ObjectKey};

/// Metadata of one remote object as reported by a listing page
///
/// Immutable snapshot; a later listing may report different values for the
/// same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObjectMetadata {
    /// Bucket key of the object
    pub key: ObjectKey,
    /// Size in bytes
    pub size: u64,
    /// Last modification time on the remote side
    pub modified_at: DateTime<Utc>,
}

impl RemoteObjectMetadata {
    #[must_use]
    pub fn new(key: ObjectKey, size: u64, modified_at: DateTime<Utc>) -> Self {
        Self {
            key,
            size,
            modified_at,
        }
    }
}

/// One page of a paginated bucket listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Objects in listing order
    pub items: Vec<RemoteObjectMetadata>,
    /// Token for the next page; `None` on the last page
    pub cursor: Option<CursorToken>,
    /// Whether this is the final page of the walk
    pub is_last: bool,
}

impl ListingPage {
    /// Build a final page
    #[must_use]
    pub fn last(items: Vec<RemoteObjectMetadata>) -> Self {
        Self {
            items,
            cursor: None,
            is_last: true,
        }
    }

    /// Build an intermediate page continuing at `cursor`
    #[must_use]
    pub fn more(items: Vec<RemoteObjectMetadata>, cursor: CursorToken) -> Self {
        Self {
            items,
            cursor: Some(cursor),
            is_last: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
