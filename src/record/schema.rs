//! Snag and photo record types.
//!
//! These are the metadata half of the system. A [`Photo`] points at its
//! bytes only through [`Photo::filename`], a key into the blob store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blob::BlobKey;
use crate::error::SnagError;

/// How urgent a snag is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Stable storage form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Display form.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = SnagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| SnagError::InvalidField {
                field: "priority",
                value: s.to_string(),
            })
    }
}

/// Where a snag is in its workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    Open,
    InProgress,
    Closed,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Closed];

    /// Stable storage form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in-progress",
            Self::Closed => "closed",
        }
    }

    /// Display form.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Closed => "Closed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Status {
    type Err = SnagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        Self::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| SnagError::InvalidField {
                field: "status",
                value: s.to_string(),
            })
    }
}

/// Lowercase and fold spaces/underscores so "In Progress" parses as "in-progress".
fn normalize(s: &str) -> String {
    s.trim().to_lowercase().replace([' ', '_'], "-")
}

/// Current time at the precision the record store keeps (microseconds).
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Next `updated_at` after `previous`: now, or 1ms past `previous` if the
/// clock has not moved on (or went backwards).
pub fn advance_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}

/// A tracked defect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snag {
    pub id: Uuid,
    pub title: String,
    pub notes: String,
    pub location: String,
    pub priority: Priority,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owned photos, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
}

impl Snag {
    /// Create a new open, medium-priority snag stamped with the current time.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            notes: String::new(),
            location: String::new(),
            priority: Priority::default(),
            status: Status::default(),
            created_at: now,
            updated_at: now,
            photos: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }
}

/// Metadata for one image attached to a snag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: Uuid,
    /// Owning snag.
    pub snag_id: Uuid,
    /// Blob store key holding the encoded bytes.
    pub filename: BlobKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Photo {
    #[must_use]
    pub fn new(snag_id: Uuid, filename: BlobKey, dimensions: Option<(u32, u32)>) -> Self {
        Self {
            id: Uuid::new_v4(),
            snag_id,
            filename,
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
            created_at: now(),
        }
    }
}

/// Partial update of a snag's editable fields. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnagPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

impl SnagPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `snag`, returning whether any field actually changed.
    /// Does not touch `updated_at`.
    pub fn apply(&self, snag: &mut Snag) -> bool {
        let mut changed = false;
        changed |= set_if_changed(&mut snag.title, self.title.as_ref());
        changed |= set_if_changed(&mut snag.notes, self.notes.as_ref());
        changed |= set_if_changed(&mut snag.location, self.location.as_ref());
        changed |= set_if_changed(&mut snag.priority, self.priority.as_ref());
        changed |= set_if_changed(&mut snag.status, self.status.as_ref());
        changed
    }
}

fn set_if_changed<T: PartialEq + Clone>(field: &mut T, value: Option<&T>) -> bool {
    match value {
        Some(v) if *v != *field => {
            *field = v.clone();
            true
        }
        _ => false,
    }
}

/// List filter. Empty filter matches every snag.
#[derive(Debug, Clone, Default)]
pub struct SnagFilter {
    /// Case-insensitive substring over title, location and notes.
    pub search: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

/// One row of a snag listing.
#[derive(Debug, Clone, Serialize)]
pub struct SnagSummary {
    pub id: Uuid,
    pub title: String,
    pub location: String,
    pub priority: Priority,
    pub status: Status,
    pub photo_count: usize,
    pub updated_at: DateTime<Utc>,
}

/// Row totals for the record store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub snags: usize,
    pub photos: usize,
}
