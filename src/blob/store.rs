//! Filesystem-backed blob storage for photo bytes.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use image::DynamicImage;
use tracing::{debug, instrument, trace};

use super::key::{BlobKey, RawBlobName};
use crate::error::{Result, SnagError};

/// Key/bytes store rooted at a single directory.
///
/// The directory is created on the first write. Until then every read
/// behaves as if the store were empty. The store does no internal locking:
/// it expects a single owner that serializes mutations.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `dir`. Nothing is touched on disk yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the blob files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &BlobKey) -> PathBuf {
        self.dir.join(key.as_str())
    }

    /// Persist `bytes` under a freshly generated key.
    ///
    /// The bytes land in a hidden temp file in the store directory, are
    /// synced, then renamed onto the final name. A crash leaves either no
    /// file or a stray temp file (reclaimed by the next sweep), never a
    /// truncated blob under a real key.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn save(&self, bytes: &[u8]) -> Result<BlobKey> {
        let key = BlobKey::generate();
        self.write_atomic(&self.path_for(&key), bytes)
            .map_err(|source| SnagError::BlobWrite {
                key: key.to_string(),
                source,
            })?;
        debug!(%key, "Blob saved");
        Ok(key)
    }

    fn write_atomic(&self, target: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(target).map_err(|e| e.error)?;
        Ok(())
    }

    /// Read a blob. Missing or unreadable files are `None`.
    #[instrument(skip(self), fields(key = %key))]
    pub fn load(&self, key: &BlobKey) -> Option<Vec<u8>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => {
                trace!(len = bytes.len(), "Blob loaded");
                Some(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!("Blob absent");
                None
            }
            Err(e) => {
                debug!(error = %e, "Blob unreadable, treating as absent");
                None
            }
        }
    }

    /// Read and decode a blob. Missing keys and undecodable bytes are both `None`.
    #[instrument(skip(self), fields(key = %key))]
    pub fn load_decoded(&self, key: &BlobKey) -> Option<DynamicImage> {
        let bytes = self.load(key)?;
        match image::load_from_memory(&bytes) {
            Ok(img) => Some(img),
            Err(e) => {
                debug!(error = %e, "Blob failed to decode, treating as absent");
                None
            }
        }
    }

    /// Whether a blob file exists for `key`.
    pub fn contains(&self, key: &BlobKey) -> bool {
        self.path_for(key).is_file()
    }

    /// On-disk size of one blob, if present.
    pub fn blob_size(&self, key: &BlobKey) -> Option<u64> {
        file_size(&self.path_for(key))
    }

    pub(crate) fn entry_size(&self, name: &BlobName) -> Option<u64> {
        file_size(&name.path_in(&self.dir))
    }

    /// Remove a blob.
    ///
    /// Returns `Ok(true)` if a file was removed and `Ok(false)` if it was
    /// already gone. Only unexpected filesystem errors are surfaced.
    #[instrument(skip(self), fields(key = %key))]
    pub fn delete(&self, key: &BlobKey) -> Result<bool> {
        let removed = remove_file(&self.path_for(key), key.as_str())?;
        if removed {
            debug!("Blob deleted");
        } else {
            trace!("Blob already absent");
        }
        Ok(removed)
    }

    /// Remove any directory entry, keyed or not.
    pub(crate) fn delete_entry(&self, name: &BlobName) -> Result<bool> {
        match name {
            BlobName::Key(key) => self.delete(key),
            BlobName::Raw(raw) => remove_file(&name.path_in(&self.dir), &raw.to_string()),
        }
    }

    /// Every regular file in the store directory with its size.
    pub(crate) fn entries(&self) -> Result<Vec<BlobEntry>> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(dir = %self.dir.display(), "Blob directory not created yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(SnagError::BlobList {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| SnagError::BlobList {
                path: self.dir.clone(),
                source,
            })?;
            // Entries can vanish between listing and stat.
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let name = BlobName::from_file_name(entry.file_name());
            if let BlobName::Raw(raw) = &name {
                trace!(name = %raw, "File name has no key form");
            }
            entries.push(BlobEntry {
                name,
                size: meta.len(),
            });
        }
        Ok(entries)
    }

    /// Every UTF-8 key currently present on disk.
    ///
    /// Files with non-UTF-8 names are left out; [`file_count`](Self::file_count),
    /// [`total_size`](Self::total_size) and the sweep still see them.
    #[instrument(skip(self))]
    pub fn enumerate_keys(&self) -> Result<BTreeSet<BlobKey>> {
        let keys: BTreeSet<BlobKey> = self
            .entries()?
            .into_iter()
            .filter_map(|entry| match entry.name {
                BlobName::Key(key) => Some(key),
                BlobName::Raw(_) => None,
            })
            .collect();
        debug!(count = keys.len(), "Enumerated blob keys");
        Ok(keys)
    }

    /// Number of regular files in the store directory.
    pub fn file_count(&self) -> Result<usize> {
        Ok(self.entries()?.len())
    }

    /// Sum of the sizes of every file on disk. An unreadable directory counts as empty.
    #[instrument(skip(self))]
    pub fn total_size(&self) -> u64 {
        match self.entries() {
            Ok(entries) => entries.iter().map(|entry| entry.size).sum(),
            Err(e) => {
                debug!(error = %e, "Could not list blob directory for size");
                0
            }
        }
    }

    /// Delete every file. Maintenance only; stops at the first failure.
    #[instrument(skip(self))]
    pub fn clear_all(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in self.entries()? {
            if self.delete_entry(&entry.name)? {
                removed += 1;
            }
        }
        debug!(removed, "Blob store cleared");
        Ok(removed)
    }
}

/// Name of one file in the store directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlobName {
    Key(BlobKey),
    Raw(RawBlobName),
}

impl BlobName {
    fn from_file_name(name: OsString) -> Self {
        match name.into_string() {
            Ok(name) => match BlobKey::parse(&name) {
                Ok(key) => Self::Key(key),
                Err(_) => Self::Raw(RawBlobName::from(OsString::from(name))),
            },
            Err(raw) => Self::Raw(RawBlobName::from(raw)),
        }
    }

    fn path_in(&self, dir: &Path) -> PathBuf {
        match self {
            Self::Key(key) => dir.join(key.as_str()),
            Self::Raw(raw) => dir.join(raw.as_os_str()),
        }
    }
}

impl fmt::Display for BlobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => fmt::Display::fmt(key, f),
            Self::Raw(raw) => fmt::Display::fmt(raw, f),
        }
    }
}

/// One regular file found in the store directory.
#[derive(Debug, Clone)]
pub(crate) struct BlobEntry {
    pub(crate) name: BlobName,
    pub(crate) size: u64,
}

fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(fs::Metadata::is_file)
        .map(|m| m.len())
}

fn remove_file(path: &Path, label: &str) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(source) => Err(SnagError::BlobDelete {
            key: label.to_string(),
            source,
        }),
    }
}
