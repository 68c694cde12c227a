//! Photo blob storage.
//!
//! Photo bytes live as plain files in one directory, named by an opaque
//! key. Metadata lives elsewhere (see [`crate::record`]) and refers to a blob
//! only by that key, so the two stores can drift apart after a crash.
//! [`BlobStore::reconcile`] repairs that drift.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.local/share/snagcap/
//! └── images/
//!     ├── 0b1f0c8e-....jpg
//!     └── 7d2a94c1-....jpg
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::collections::HashSet;
//! use snag::blob::{BlobStore, format_size};
//!
//! let store = BlobStore::new("/tmp/images");
//! let key = store.save(&jpeg_bytes)?;
//! assert!(store.load(&key).is_some());
//!
//! // Drop everything the record store no longer references.
//! let keep: HashSet<_> = db.referenced_keys()?;
//! let report = store.reconcile(&keep)?;
//! println!("freed {}", format_size(report.reclaimed_bytes));
//! ```

mod key;
mod size;
mod store;
mod sweep;

pub use key::{BLOB_EXTENSION, BlobKey, RawBlobName};
pub use size::format_size;
pub use store::BlobStore;
pub use sweep::SweepReport;
