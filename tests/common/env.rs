//! Environment variable helpers for tests.
#![allow(dead_code)]

use env_lock::{EnvGuard as LockedEnvGuard, lock_env};
use tracing::{instrument, trace};

/// RAII guard to restore environment variables on drop.
///
/// Holds the process-wide env lock, so tests that touch the environment
/// run one at a time.
pub struct EnvGuard<'a> {
    _guard: LockedEnvGuard<'a>,
}

impl<'a> EnvGuard<'a> {
    #[must_use]
    #[instrument]
    pub fn set(key: &'a str, value: &str) -> Self {
        trace!(key, value, "Setting env var");
        let guard = lock_env([(key, Some(value))]);
        Self { _guard: guard }
    }

    /// Set several variables under one lock.
    #[must_use]
    pub fn set_all(vars: &[(&'a str, Option<&str>)]) -> Self {
        let guard = lock_env(vars.iter().copied());
        Self { _guard: guard }
    }
}

/// Point the platform config directory at `dir` and clear `SNAG_*` overrides.
#[must_use]
pub fn with_config_home(dir: &str) -> EnvGuard<'static> {
    EnvGuard::set_all(&[
        ("XDG_CONFIG_HOME", Some(dir)),
        ("SNAG_CONFIG", None),
        ("SNAG_DATA_DIR", None),
    ])
}
