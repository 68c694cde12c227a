//! Common test utilities for the snag tracker.
//!
//! - `cli`: CLI runner with an isolated data directory and fluent assertions
//! - `fixtures`: Test images and populated stores
//! - `env`: Locked environment variable guards
//! - `assertions`: Output shape checks
#![allow(dead_code)]

pub mod cli;
pub mod env;

use tracing_subscriber::EnvFilter;

pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
