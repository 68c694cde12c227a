//! Snag and photo metadata.
//!
//! SQLite-backed record store. Photo rows carry the blob key of their
//! bytes; deleting a snag cascades to its photo rows. The set of keys held
//! here is what the orphan sweep treats as live.
//!
//! # Tables
//!
//! - `snags`: one row per tracked defect
//! - `photos`: one row per attached image, `snag_id` → `snags.id`

mod db;
mod schema;

pub use db::{MIN_PREFIX_LEN, SnagDb};
pub use schema::{
    Photo, Priority, RecordCounts, Snag, SnagFilter, SnagPatch, SnagSummary, Status,
    advance_timestamp, now,
};
