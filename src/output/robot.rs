//! Robot mode JSON output implementation.

use std::path::Path;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, instrument, trace};
use uuid::Uuid;

use super::{Output, PhotoView, RobotFormat, SnagDetail};
use crate::blob::SweepReport;
use crate::error::SnagError;
use crate::lifecycle::{DeleteOutcome, StorageUsage};
use crate::record::{Photo, Snag, SnagSummary};

/// JSON output implementation for AI agents and scripting.
///
/// Results go to stdout; errors go to stderr.
pub struct RobotOutput {
    format: RobotFormat,
}

impl RobotOutput {
    pub const fn new(format: RobotFormat) -> Self {
        Self { format }
    }

    fn render<T: Serialize + ?Sized>(&self, data: &T) -> Option<String> {
        let rendered = match self.format {
            RobotFormat::Json => serde_json::to_string_pretty(data),
            RobotFormat::JsonCompact => serde_json::to_string(data),
        };
        match rendered {
            Ok(json) => {
                trace!(json_len = json.len(), "JSON serialized");
                Some(json)
            }
            Err(e) => {
                error!(error = %e, "JSON serialization failed");
                None
            }
        }
    }

    /// Output any serializable data as JSON to stdout.
    #[instrument(skip(self, data), fields(format = ?self.format))]
    fn output_json<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            println!("{json}");
        }
    }

    fn output_json_stderr<T: Serialize + ?Sized>(&self, data: &T) {
        if let Some(json) = self.render(data) {
            eprintln!("{json}");
        }
    }
}

impl Output for RobotOutput {
    fn success(&self, message: &str) {
        self.output_json(&json!({ "success": true, "message": message }));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &SnagError) {
        debug!(error = %error, "Robot: error");
        self.output_json_stderr(&json!({
            "error": true,
            "message": error.to_string(),
            "suggestion": error.suggestion(),
            "recoverable": error.is_user_recoverable(),
        }));
    }

    fn warning(&self, message: &str) {
        self.output_json_stderr(&json!({ "warning": true, "message": message }));
    }

    fn snag_created(&self, snag: &Snag) {
        self.output_json(snag);
    }

    #[instrument(skip(self, snags), fields(count = snags.len()))]
    fn snag_list(&self, snags: &[SnagSummary]) {
        self.output_json(snags);
    }

    fn snag_detail(&self, detail: &SnagDetail) {
        self.output_json(detail);
    }

    fn snag_updated(&self, snag: &Snag, changed: bool) {
        self.output_json(&json!({ "changed": changed, "snag": snag }));
    }

    fn snag_deleted(&self, id: &Uuid, outcome: &DeleteOutcome) {
        self.output_json(&json!({ "id": id, "outcome": outcome }));
    }

    fn photo_added(&self, photo: &Photo) {
        self.output_json(photo);
    }

    fn photo_detail(&self, view: &PhotoView) {
        self.output_json(view);
    }

    fn photo_removed(&self, id: &Uuid, outcome: &DeleteOutcome) {
        self.output_json(&json!({ "id": id, "outcome": outcome }));
    }

    fn photo_exported(&self, photo: &Photo, path: &Path, bytes: usize) {
        self.output_json(&json!({
            "id": photo.id,
            "path": path.display().to_string(),
            "bytes": bytes,
        }));
    }

    fn storage_usage(&self, usage: &StorageUsage) {
        self.output_json(usage);
    }

    fn sweep_report(&self, report: &SweepReport) {
        self.output_json(report);
    }

    fn images_cleared(&self, removed: usize) {
        self.output_json(&json!({ "removed": removed }));
    }

    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        self.output_json(&json!({
            "version": version,
            "git_sha": git_sha,
            "build_time": build_time,
            "rustc": option_env!("VERGEN_RUSTC_SEMVER"),
            "target": option_env!("VERGEN_CARGO_TARGET_TRIPLE"),
        }));
    }
}
