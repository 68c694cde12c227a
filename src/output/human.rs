//! Human-friendly terminal output.

use std::path::Path;

use chrono::{DateTime, Local, Utc};
use console::{Alignment, Term, measure_text_width, pad_str, truncate_str};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use super::{Output, PhotoView, SnagDetail};
use crate::blob::{SweepReport, format_size};
use crate::error::SnagError;
use crate::lifecycle::{DeleteOutcome, StorageUsage};
use crate::record::{Photo, Snag, SnagSummary};
use crate::theme::SnagTheme;

/// Characters of a UUID shown in tables; enough to pass back as a prefix.
const SHORT_ID_LEN: usize = 8;

fn short_id(id: &Uuid) -> String {
    id.to_string()[..SHORT_ID_LEN].to_string()
}

fn local_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Styled terminal output implementation for human users.
pub struct HumanOutput {
    theme: SnagTheme,
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanOutput {
    pub fn new() -> Self {
        Self {
            theme: SnagTheme::default(),
        }
    }

    /// Title column width left on an interactive terminal; `None` when piped.
    fn title_budget() -> Option<usize> {
        let term = Term::stdout();
        if !term.is_term() {
            return None;
        }
        // id, priority, status, photo count and date columns plus gaps.
        let fixed = SHORT_ID_LEN + 8 + 13 + 4 + 16 + 10;
        Some(usize::from(term.size().1).saturating_sub(fixed).max(12))
    }

    fn field(&self, name: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        println!(
            "  {}{}",
            self.theme.label.apply_to(format!("{name:<10}")),
            value
        );
    }

    fn warnings(&self, outcome: &DeleteOutcome) {
        for warning in &outcome.warnings {
            self.warning(&format!("{warning} (left for `snag sweep`)"));
        }
    }
}

impl Output for HumanOutput {
    fn success(&self, message: &str) {
        println!("{} {message}", self.theme.success.apply_to("[OK]"));
    }

    #[instrument(skip(self))]
    fn error(&self, error: &SnagError) {
        debug!(
            error = %error,
            recoverable = error.is_user_recoverable(),
            "Outputting error"
        );
        eprintln!(
            "{} {}",
            self.theme.error.apply_to("[ERR]"),
            self.theme.value.apply_to(error)
        );
        if let SnagError::SweepIncomplete { failed, .. } = error {
            for item in failed {
                eprintln!("      {}", self.theme.muted.apply_to(item));
            }
        }
        if let Some(suggestion) = error.suggestion() {
            trace!(suggestion, "Adding suggestion");
            eprintln!("      {}", self.theme.muted.apply_to(suggestion));
        }
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {message}", self.theme.warning.apply_to("[WARN]"));
    }

    fn snag_created(&self, snag: &Snag) {
        self.success(&format!(
            "Created snag {} {}",
            self.theme.id.apply_to(short_id(&snag.id)),
            snag.title
        ));
    }

    #[instrument(skip(self, snags), fields(count = snags.len()))]
    fn snag_list(&self, snags: &[SnagSummary]) {
        if snags.is_empty() {
            println!("{}", self.theme.muted.apply_to("No snags"));
            return;
        }

        let titles: Vec<String> = snags
            .iter()
            .map(|snag| {
                if snag.location.is_empty() {
                    snag.title.clone()
                } else {
                    format!("{} @ {}", snag.title, snag.location)
                }
            })
            .collect();
        let natural = titles
            .iter()
            .map(|t| measure_text_width(t))
            .max()
            .unwrap_or(0)
            .max("TITLE".len());
        let title_width = Self::title_budget().map_or(natural, |budget| natural.min(budget));

        println!(
            "{}",
            self.theme.header.apply_to(format!(
                "{:<8}  {:<title_width$}  {:<8}  {:<13}  {:>4}  {}",
                "ID", "TITLE", "PRIORITY", "STATUS", "PICS", "UPDATED"
            ))
        );
        for (snag, title) in snags.iter().zip(&titles) {
            let title = truncate_str(title, title_width, "…");
            println!(
                "{}  {}  {}  {}  {:>4}  {}",
                self.theme.id.apply_to(short_id(&snag.id)),
                pad_str(&title, title_width, Alignment::Left, None),
                self.theme
                    .priority(snag.priority)
                    .apply_to(format!("{:<8}", snag.priority.label())),
                self.theme
                    .status(snag.status)
                    .apply_to(format!("{:<13}", snag.status.label())),
                snag.photo_count,
                self.theme.muted.apply_to(local_time(&snag.updated_at)),
            );
        }
    }

    fn snag_detail(&self, detail: &SnagDetail) {
        let snag = &detail.snag;
        println!("{}", self.theme.header.apply_to(&snag.title));
        self.field("Id", &snag.id.to_string());
        self.field("Location", &snag.location);
        self.field(
            "Priority",
            &self.theme.priority(snag.priority).apply_to(snag.priority).to_string(),
        );
        self.field(
            "Status",
            &self.theme.status(snag.status).apply_to(snag.status).to_string(),
        );
        self.field("Created", &local_time(&snag.created_at));
        self.field("Updated", &local_time(&snag.updated_at));
        if !snag.notes.is_empty() {
            println!();
            for line in snag.notes.lines() {
                println!("  {line}");
            }
        }

        println!();
        if detail.photos.is_empty() {
            println!("  {}", self.theme.muted.apply_to("No photos"));
            return;
        }
        println!("  {}", self.theme.label.apply_to(format!("Photos ({})", detail.photos.len())));
        for view in &detail.photos {
            println!("    {}", self.photo_line(view));
        }
    }

    fn snag_updated(&self, snag: &Snag, changed: bool) {
        if changed {
            self.success(&format!("Updated snag {}", self.theme.id.apply_to(short_id(&snag.id))));
        } else {
            println!(
                "{}",
                self.theme.muted.apply_to(format!("Snag {} unchanged", short_id(&snag.id)))
            );
        }
    }

    fn snag_deleted(&self, id: &Uuid, outcome: &DeleteOutcome) {
        self.warnings(outcome);
        self.success(&format!(
            "Deleted snag {} and {} photo(s)",
            self.theme.id.apply_to(short_id(id)),
            outcome.photos_removed
        ));
    }

    fn photo_added(&self, photo: &Photo) {
        let dims = match (photo.width, photo.height) {
            (Some(w), Some(h)) => format!(" ({w}x{h})"),
            _ => String::new(),
        };
        self.success(&format!(
            "Added photo {}{dims}",
            self.theme.id.apply_to(short_id(&photo.id))
        ));
    }

    fn photo_detail(&self, view: &PhotoView) {
        println!("{}", self.photo_line(view));
        self.field("Snag", &view.photo.snag_id.to_string());
        self.field("File", view.photo.filename.as_str());
    }

    fn photo_removed(&self, id: &Uuid, outcome: &DeleteOutcome) {
        self.warnings(outcome);
        self.success(&format!("Removed photo {}", self.theme.id.apply_to(short_id(id))));
    }

    fn photo_exported(&self, photo: &Photo, path: &Path, bytes: usize) {
        self.success(&format!(
            "Exported photo {} to {} ({})",
            self.theme.id.apply_to(short_id(&photo.id)),
            path.display(),
            format_size(bytes as u64)
        ));
    }

    fn storage_usage(&self, usage: &StorageUsage) {
        println!("{}", self.theme.header.apply_to("Storage"));
        self.field("Images", &usage.blob_dir);
        self.field("Files", &usage.blob_count.to_string());
        self.field("Size", &usage.formatted);
        self.field("Snags", &usage.records.snags.to_string());
        self.field("Photos", &usage.records.photos.to_string());
        if usage.blob_count > usage.records.photos {
            println!(
                "  {}",
                self.theme
                    .muted
                    .apply_to("More files than photos; `snag sweep --dry-run` lists the orphans")
            );
        }
    }

    fn sweep_report(&self, report: &SweepReport) {
        let verb = if report.dry_run { "Would remove" } else { "Removed" };
        for key in &report.removed {
            println!("  {} {key}", self.theme.muted.apply_to("-"));
        }
        for name in &report.removed_unnamed {
            println!("  {} {name}", self.theme.muted.apply_to("-"));
        }
        self.success(&format!(
            "{verb} {} orphan(s), {} ({} scanned, {} kept)",
            report.orphan_count(),
            format_size(report.reclaimed_bytes),
            report.scanned,
            report.kept
        ));
    }

    fn images_cleared(&self, removed: usize) {
        self.success(&format!("Removed {removed} image file(s)"));
    }

    #[instrument(skip(self))]
    fn version_info(&self, version: &str, git_sha: Option<&str>, build_time: Option<&str>) {
        println!("{} {}", self.theme.header.apply_to("snag"), self.theme.value.apply_to(version));
        if let Some(sha) = git_sha {
            self.field("Git SHA", sha);
        }
        if let Some(time) = build_time {
            self.field("Built", time);
        }
        if let Some(rustc) = option_env!("VERGEN_RUSTC_SEMVER") {
            self.field("Rust", rustc);
        }
        if let Some(target) = option_env!("VERGEN_CARGO_TARGET_TRIPLE") {
            self.field("Target", target);
        }
    }
}

impl HumanOutput {
    fn photo_line(&self, view: &PhotoView) -> String {
        let photo = &view.photo;
        let dims = match (photo.width, photo.height) {
            (Some(w), Some(h)) => format!("{w}x{h}"),
            _ => "?x?".to_string(),
        };
        let size = match view.size_bytes {
            Some(bytes) => format_size(bytes),
            None => self.theme.error.apply_to("missing").to_string(),
        };
        format!(
            "{}  {dims:<11}  {size:<10}  {}",
            self.theme.id.apply_to(short_id(&photo.id)),
            self.theme.muted.apply_to(local_time(&photo.created_at))
        )
    }
}
