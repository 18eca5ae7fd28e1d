//! Per-object freshness decision

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of comparing a remote object with its local copy
///
/// Computed fresh on every run and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessVerdict {
    /// Local copy exists, is non-empty and at least as new as the remote
    Present,
    /// No regular file at the local path
    Missing,
    /// Local copy is older than the remote object
    Stale,
    /// Local copy is zero bytes long
    Empty,
}

impl FreshnessVerdict {
    /// Whether the object has to be fetched again
    #[must_use]
    pub fn needs_download(self) -> bool {
        !matches!(self, Self::Present)
    }
}

impl fmt::Display for FreshnessVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Present => "present",
            Self::Missing => "missing",
            Self::Stale => "stale",
            Self::Empty => "empty",
        };
        f.write_str(s)
    }
}
