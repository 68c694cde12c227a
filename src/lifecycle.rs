//! Ordered add/delete flows across the blob store and the record store.
//!
//! The two stores share no transaction. Every flow is ordered so that a
//! crash between steps can only leave an orphaned blob, never a photo row
//! whose bytes are gone. Orphans are reclaimed by [`Tracker::sweep_orphans`].

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::blob::{BlobKey, BlobStore, SweepReport, format_size};
use crate::config::Settings;
use crate::error::Result;
use crate::image_ops::{self, PreparedPhoto};
use crate::record::{Photo, RecordCounts, Snag, SnagDb};

/// Result of a delete that may have leaked blobs.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteOutcome {
    /// Whether the record existed and was removed.
    pub deleted: bool,
    /// Photo rows removed along with it.
    pub photos_removed: usize,
    /// Blob deletions that failed; the files are left for the next sweep.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Blob and record totals.
#[derive(Debug, Clone, Serialize)]
pub struct StorageUsage {
    pub blob_dir: String,
    pub blob_count: usize,
    pub total_bytes: u64,
    pub formatted: String,
    pub records: RecordCounts,
}

/// Owner of both stores and the only place that mutates them together.
pub struct Tracker {
    blobs: BlobStore,
    db: SnagDb,
}

impl Tracker {
    /// Open the stores under `settings.data_dir`.
    ///
    /// Runs an orphan sweep first when `sweep_on_start` is set; nothing can
    /// be mid-add at that point.
    #[instrument(skip_all, fields(data_dir = %settings.data_dir.display()))]
    pub fn open(settings: &Settings) -> Result<Self> {
        let db = SnagDb::open(settings.db_path())?;
        let mut tracker = Self::new(BlobStore::new(settings.images_dir()), db);
        if settings.sweep_on_start {
            let report = tracker.sweep_orphans(false)?;
            debug!(removed = report.orphan_count(), "Startup sweep finished");
        }
        Ok(tracker)
    }

    pub const fn new(blobs: BlobStore, db: SnagDb) -> Self {
        Self { blobs, db }
    }

    pub const fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub const fn db(&self) -> &SnagDb {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut SnagDb {
        &mut self.db
    }

    /// Store encoded bytes, then commit the photo row.
    ///
    /// If the commit fails the blob stays behind as an orphan.
    #[instrument(skip(self, prepared), fields(bytes = prepared.bytes.len()))]
    pub fn add_photo(&mut self, snag_id: &Uuid, prepared: &PreparedPhoto) -> Result<Photo> {
        // Fail early rather than leave a blob for a snag that is not there.
        self.db.require_snag(snag_id)?;

        let key = self.blobs.save(&prepared.bytes)?;
        let photo = Photo::new(*snag_id, key, Some(prepared.dimensions()));
        self.db.insert_photo(&photo)?;

        info!(photo = %photo.id, filename = %photo.filename, "Photo added");
        Ok(photo)
    }

    /// Decode, compress and add an image file.
    pub fn add_photo_from_path(&mut self, snag_id: &Uuid, path: &Path, quality: u8) -> Result<Photo> {
        let prepared = image_ops::prepare_file(path, quality)?;
        self.add_photo(snag_id, &prepared)
    }

    /// Delete a photo's blob, then its row.
    ///
    /// A failed blob delete does not stop the row delete; it is returned
    /// as a warning.
    #[instrument(skip(self))]
    pub fn delete_photo(&mut self, photo_id: &Uuid) -> Result<DeleteOutcome> {
        let Some(photo) = self.db.get_photo(photo_id)? else {
            return Ok(DeleteOutcome::default());
        };

        let mut outcome = DeleteOutcome::default();
        self.delete_blob_lenient(&photo.filename, &mut outcome.warnings);

        outcome.deleted = self.db.delete_photo(photo_id)?;
        outcome.photos_removed = usize::from(outcome.deleted);
        Ok(outcome)
    }

    /// Delete every photo blob of a snag, then the snag row (photo rows
    /// cascade).
    #[instrument(skip(self))]
    pub fn delete_snag(&mut self, snag_id: &Uuid) -> Result<DeleteOutcome> {
        let Some(snag) = self.db.get_snag(snag_id)? else {
            return Ok(DeleteOutcome::default());
        };

        let mut outcome = DeleteOutcome {
            photos_removed: snag.photo_count(),
            ..DeleteOutcome::default()
        };
        for photo in &snag.photos {
            self.delete_blob_lenient(&photo.filename, &mut outcome.warnings);
        }

        outcome.deleted = self.db.delete_snag(snag_id)?;
        Ok(outcome)
    }

    fn delete_blob_lenient(&self, key: &BlobKey, warnings: &mut Vec<String>) {
        match self.blobs.delete(key) {
            Ok(true) => {}
            Ok(false) => debug!(%key, "Blob already absent"),
            Err(e) => {
                warn!(%key, error = %e, "Blob delete failed; leaving it for the orphan sweep");
                warnings.push(e.to_string());
            }
        }
    }

    /// Create a snag.
    pub fn create_snag(&mut self, snag: &Snag) -> Result<()> {
        self.db.create_snag(snag)
    }

    /// Encoded bytes for a photo, if both the row and the blob exist.
    pub fn photo_bytes(&self, photo: &Photo) -> Option<Vec<u8>> {
        self.blobs.load(&photo.filename)
    }

    /// Reconcile the blob directory against the record store.
    ///
    /// Takes `&mut self` so no add can be in flight between reading the
    /// referenced keys and deleting.
    #[instrument(skip(self))]
    pub fn sweep_orphans(&mut self, dry_run: bool) -> Result<SweepReport> {
        let keep = self.db.referenced_keys()?;
        if dry_run {
            self.blobs.plan_sweep(&keep)
        } else {
            self.blobs.reconcile(&keep)
        }
    }

    /// Blob and record totals.
    pub fn storage_usage(&self) -> Result<StorageUsage> {
        let total_bytes = self.blobs.total_size();
        Ok(StorageUsage {
            blob_dir: self.blobs.dir().display().to_string(),
            blob_count: self.blobs.file_count()?,
            total_bytes,
            formatted: format_size(total_bytes),
            records: self.db.counts()?,
        })
    }

    /// Delete every blob. Photo rows are left in place; their images
    /// will load as missing.
    #[instrument(skip(self))]
    pub fn clear_images(&mut self) -> Result<usize> {
        let removed = self.blobs.clear_all()?;
        info!(removed, "Image store cleared");
        Ok(removed)
    }
}
