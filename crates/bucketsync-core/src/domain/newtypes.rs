//! Domain newtypes with validation
//!
//! Strongly-typed wrappers for object keys, listing cursors and local paths.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// ObjectKey
// ============================================================================

/// Key of an object in the remote bucket
///
/// Keys are path-like strings using `/` as the hierarchy delimiter
/// (e.g. `photos/2019/06/beach.jpg`). The remote service is the authority
/// on what a key may contain, so construction only rejects the empty key;
/// whether a key can be mirrored locally is decided by [`SyncPath::join_key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Create a new ObjectKey
    ///
    /// # Errors
    /// Returns `DomainError::InvalidKey` if the key is empty
    pub fn new(key: String) -> Result<Self, DomainError> {
        if key.is_empty() {
            return Err(DomainError::InvalidKey("Object key cannot be empty".into()));
        }
        Ok(Self(key))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the `/`-delimited segments of the key
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Last segment of the key (the file name when mirrored)
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for ObjectKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ObjectKey> for String {
    fn from(key: ObjectKey) -> Self {
        key.0
    }
}

// ============================================================================
// CursorToken
// ============================================================================

/// Opaque listing cursor (marker) returned by the remote service
///
/// Must be passed back verbatim to fetch the next page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CursorToken(String);

impl CursorToken {
    /// Create a new CursorToken
    ///
    /// # Errors
    /// Returns `DomainError::InvalidCursor` if the token is empty
    pub fn new(token: String) -> Result<Self, DomainError> {
        if token.is_empty() {
            return Err(DomainError::InvalidCursor(
                "Cursor token cannot be empty".into(),
            ));
        }
        Ok(Self(token))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CursorToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CursorToken {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CursorToken> for String {
    fn from(token: CursorToken) -> Self {
        token.0
    }
}

// ============================================================================
// SyncPath
// ============================================================================

/// An absolute, normalized local filesystem path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncPath(PathBuf);

impl SyncPath {
    /// Create a new SyncPath, validating it is absolute
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path is not absolute
    pub fn new(path: PathBuf) -> Result<Self, DomainError> {
        if !path.is_absolute() {
            return Err(DomainError::InvalidPath(format!(
                "Path must be absolute: {}",
                path.display()
            )));
        }

        // We don't use fs::canonicalize() as the path might not exist yet
        let normalized = Self::normalize_path(&path)?;
        Ok(Self(normalized))
    }

    /// Get the inner path reference
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Convert to owned PathBuf
    #[must_use]
    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Map an object key onto the local hierarchy below this path
    ///
    /// Each `/`-delimited segment of the key becomes one path component.
    /// Keys that would escape this root or that have no file name are
    /// rejected: empty segments (`a//b`, leading or trailing `/`), `.` and
    /// `..` segments, and NUL bytes.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidKey` if the key cannot be mapped safely
    pub fn join_key(&self, key: &ObjectKey) -> Result<Self, DomainError> {
        let mut path = self.0.clone();

        for segment in key.segments() {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\0')
            {
                return Err(DomainError::InvalidKey(format!(
                    "Key cannot be mapped to a local path: {key}"
                )));
            }
            // A segment like "C:" or one containing a separator on other
            // platforms must stay a single normal component.
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => path.push(segment),
                _ => {
                    return Err(DomainError::InvalidKey(format!(
                        "Key segment is not a plain file name: {segment}"
                    )))
                }
            }
        }

        if !path.starts_with(&self.0) {
            return Err(DomainError::PathNotInSyncRoot(format!(
                "{} is not within {}",
                path.display(),
                self.0.display()
            )));
        }

        Ok(Self(path))
    }

    /// Normalize a path by resolving . and .. components
    fn normalize_path(path: &Path) -> Result<PathBuf, DomainError> {
        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::Prefix(p) => normalized.push(p.as_os_str()),
                Component::RootDir => normalized.push(Component::RootDir.as_os_str()),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(DomainError::InvalidPath(
                            "Path escapes root via ..".to_string(),
                        ));
                    }
                }
                Component::Normal(c) => normalized.push(c),
            }
        }

        Ok(normalized)
    }
}

impl Display for SyncPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl TryFrom<PathBuf> for SyncPath {
    type Error = DomainError;

    fn try_from(value: PathBuf) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SyncPath> for PathBuf {
    fn from(path: SyncPath) -> Self {
        path.0
    }
}

impl AsRef<Path> for SyncPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
