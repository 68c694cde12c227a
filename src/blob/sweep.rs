//! Orphan sweep: delete blobs the record store no longer references.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, instrument, trace};

use super::key::{BlobKey, RawBlobName};
use super::store::{BlobName, BlobStore};
use crate::error::{Result, SnagError};

/// Outcome of a sweep (or a dry-run plan of one).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    /// Files found on disk.
    pub scanned: usize,
    /// Files whose key is in the keep set.
    pub kept: usize,
    /// Orphans removed (or, for a dry run, that would be removed).
    pub removed: Vec<BlobKey>,
    /// Orphans with non-UTF-8 names, shown lossily.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub removed_unnamed: Vec<RawBlobName>,
    /// Bytes freed by the removed files.
    pub reclaimed_bytes: u64,
    /// True when nothing was deleted.
    pub dry_run: bool,
}

impl SweepReport {
    /// Number of orphans in the report.
    pub fn orphan_count(&self) -> usize {
        self.removed.len() + self.removed_unnamed.len()
    }

    fn push(&mut self, name: BlobName) {
        match name {
            BlobName::Key(key) => self.removed.push(key),
            BlobName::Raw(raw) => self.removed_unnamed.push(raw),
        }
    }

    fn into_orphans(self) -> impl Iterator<Item = BlobName> {
        self.removed
            .into_iter()
            .map(BlobName::Key)
            .chain(self.removed_unnamed.into_iter().map(BlobName::Raw))
    }
}

impl BlobStore {
    /// Compute what [`reconcile`](Self::reconcile) would delete, without deleting.
    #[instrument(skip(self, keep), fields(keep = keep.len()))]
    pub fn plan_sweep(&self, keep: &HashSet<BlobKey>) -> Result<SweepReport> {
        let entries = self.entries()?;
        let mut report = SweepReport {
            scanned: entries.len(),
            dry_run: true,
            ..SweepReport::default()
        };
        for entry in entries {
            match &entry.name {
                BlobName::Key(key) if keep.contains(key) => report.kept += 1,
                _ => {
                    report.reclaimed_bytes += entry.size;
                    report.push(entry.name);
                }
            }
        }
        debug!(orphans = report.orphan_count(), "Sweep planned");
        Ok(report)
    }

    /// Delete every file whose key is not in `keep`.
    ///
    /// `keep` must be the complete referenced set at the time of the call;
    /// keys in it without a file are ignored.
    #[instrument(skip(self, keep), fields(keep = keep.len()))]
    pub fn reconcile(&self, keep: &HashSet<BlobKey>) -> Result<SweepReport> {
        let plan = self.plan_sweep(keep)?;
        self.apply_sweep(plan)
    }

    /// Delete the orphans listed in `plan`.
    ///
    /// Deletion continues past individual failures, which are reported
    /// together as [`SnagError::SweepIncomplete`] naming each file left
    /// behind. The plan must come from [`plan_sweep`](Self::plan_sweep)
    /// with no photo added since.
    #[instrument(skip(self, plan), fields(orphans = plan.orphan_count()))]
    pub fn apply_sweep(&self, plan: SweepReport) -> Result<SweepReport> {
        let mut report = SweepReport {
            scanned: plan.scanned,
            kept: plan.kept,
            ..SweepReport::default()
        };
        let mut failed = Vec::new();

        for name in plan.into_orphans() {
            let size = self.entry_size(&name).unwrap_or(0);
            match self.delete_entry(&name) {
                Ok(true) => {
                    trace!(%name, size, "Orphan removed");
                    report.reclaimed_bytes += size;
                    report.push(name);
                }
                Ok(false) => trace!(%name, "Orphan vanished before delete"),
                Err(e) => {
                    debug!(%name, error = %e, "Orphan delete failed");
                    failed.push(name.to_string());
                }
            }
        }

        if !failed.is_empty() {
            return Err(SnagError::SweepIncomplete {
                removed: report.orphan_count(),
                failed,
            });
        }

        info!(
            scanned = report.scanned,
            removed = report.orphan_count(),
            reclaimed_bytes = report.reclaimed_bytes,
            "Orphan sweep complete"
        );
        Ok(report)
    }
}
