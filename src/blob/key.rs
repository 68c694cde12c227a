//! Opaque blob keys.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::error::{Result, SnagError};

/// File extension for every blob written by the store.
pub const BLOB_EXTENSION: &str = "jpg";

/// File name of one blob inside the store directory.
///
/// Generated keys are `<uuid-v4>.jpg`. Parsed keys may be any single path
/// component, so every UTF-8 file name found in the directory can still be
/// addressed (and swept).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobKey(String);

impl BlobKey {
    /// Generate a fresh random key.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}.{BLOB_EXTENSION}", Uuid::new_v4()))
    }

    /// Parse a key, rejecting anything that is not a single path component
    /// on this platform.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut components = Path::new(raw).components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(name)), None) if name == OsStr::new(raw)
        );
        if !single || raw.contains('\0') {
            return Err(SnagError::InvalidKey {
                key: raw.to_string(),
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// Borrow the key as a file name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BlobKey {
    type Error = SnagError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<BlobKey> for String {
    fn from(key: BlobKey) -> Self {
        key.0
    }
}

/// A file in the store directory whose name is not valid UTF-8.
///
/// Records only hold UTF-8 keys, so such a file is always an orphan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawBlobName(OsString);

impl RawBlobName {
    pub fn as_os_str(&self) -> &OsStr {
        &self.0
    }
}

impl From<OsString> for RawBlobName {
    fn from(name: OsString) -> Self {
        Self(name)
    }
}

impl fmt::Display for RawBlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl Serialize for RawBlobName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
