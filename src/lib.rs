//! snag - construction snag tracker library.
//!
//! Exposes the stores and flows behind the `snag` CLI for use in tests
//! and other front ends.
//!
//! # Modules
//!
//! - `blob`: Filesystem photo store, orphan sweep and size accounting
//! - `record`: SQLite store for snag and photo metadata
//! - `lifecycle`: Ordered add/delete flows across both stores
//! - `image_ops`: Decode and JPEG-compress images for storage
//! - `config`: Settings from TOML/YAML files and CLI overrides
//! - `error`: Error types with user-recoverable hints
//! - `output`: Output mode abstraction (robot/human)
#![forbid(unsafe_code)]

pub mod blob;
pub mod cli;
pub mod config;
pub mod error;
pub mod image_ops;
pub mod lifecycle;
pub mod logging;
pub mod output;
pub mod record;
pub mod theme;
