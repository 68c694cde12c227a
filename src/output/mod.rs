//! Output mode abstraction for robot and human output.

use std::path::Path;

use serde::Serialize;
use uuid::Uuid;

use crate::blob::{BlobStore, SweepReport};
use crate::cli::Cli;
use crate::error::SnagError;
use crate::lifecycle::{DeleteOutcome, StorageUsage};
use crate::record::{Photo, Snag, SnagSummary};

pub mod human;
pub mod robot;

pub use human::HumanOutput;
pub use robot::RobotOutput;

/// A photo row plus what the blob store holds for it.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoView {
    #[serde(flatten)]
    pub photo: Photo,
    /// Whether the blob file exists.
    pub present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

impl PhotoView {
    pub fn new(photo: Photo, blobs: &BlobStore) -> Self {
        let size_bytes = blobs.blob_size(&photo.filename);
        Self {
            present: size_bytes.is_some(),
            size_bytes,
            photo,
        }
    }
}

/// A snag with its photos resolved against the blob store.
#[derive(Debug, Clone, Serialize)]
pub struct SnagDetail {
    /// The snag with `photos` moved out into `photos` below.
    #[serde(flatten)]
    pub snag: Snag,
    pub photos: Vec<PhotoView>,
}

impl SnagDetail {
    pub fn new(mut snag: Snag, blobs: &BlobStore) -> Self {
        let photos = std::mem::take(&mut snag.photos)
            .into_iter()
            .map(|photo| PhotoView::new(photo, blobs))
            .collect();
        Self { snag, photos }
    }
}

/// JSON formatting options for robot mode.
#[derive(Debug, Clone, Copy)]
pub enum RobotFormat {
    /// Pretty-printed JSON (default for --robot).
    Json,
    /// Single-line JSON (--format=json-compact).
    JsonCompact,
}

/// Determines how command output is rendered.
#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    /// JSON output for AI agents and scripting.
    Robot(RobotFormat),
    /// Styled terminal output for human users.
    Human,
}

impl OutputMode {
    /// Create OutputMode from CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.use_json() {
            let format = if cli.use_compact_json() {
                RobotFormat::JsonCompact
            } else {
                RobotFormat::Json
            };
            Self::Robot(format)
        } else {
            if cli.no_color {
                console::set_colors_enabled(false);
                console::set_colors_enabled_stderr(false);
            }
            Self::Human
        }
    }

    /// Returns true if output should be JSON.
    #[must_use]
    pub const fn is_robot(&self) -> bool {
        matches!(self, Self::Robot(_))
    }

    /// Convert into the appropriate Output implementation.
    #[must_use]
    pub fn into_output(self) -> Box<dyn Output> {
        match self {
            Self::Robot(format) => Box::new(RobotOutput::new(format)),
            Self::Human => Box::new(HumanOutput::new()),
        }
    }
}

/// Trait for all output operations.
///
/// Commands call these methods without knowing the output mode.
pub trait Output {
    // Basic messages
    fn success(&self, message: &str);
    fn error(&self, error: &SnagError);
    fn warning(&self, message: &str);

    // Snags
    fn snag_created(&self, snag: &Snag);
    fn snag_list(&self, snags: &[SnagSummary]);
    fn snag_detail(&self, detail: &SnagDetail);
    fn snag_updated(&self, snag: &Snag, changed: bool);
    fn snag_deleted(&self, id: &Uuid, outcome: &DeleteOutcome);

    // Photos
    fn photo_added(&self, photo: &Photo);
    fn photo_detail(&self, view: &PhotoView);
    fn photo_removed(&self, id: &Uuid, outcome: &DeleteOutcome);
    fn photo_exported(&self, photo: &Photo, path: &Path, bytes: usize);

    // Storage maintenance
    fn storage_usage(&self, usage: &StorageUsage);
    fn sweep_report(&self, report: &SweepReport);
    fn images_cleared(&self, removed: usize);

    // Metadata
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>);
}
