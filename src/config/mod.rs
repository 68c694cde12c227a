//! Configuration for the snag tracker.
//!
//! Settings come from, in increasing precedence: built-in defaults, a
//! TOML or YAML config file, and CLI flags (or their `SNAG_*` env vars).

mod path;
mod settings;

pub use path::{
    APP_DIR, CONFIG_FILE_NAMES, default_config_dir, expand_home, find_default_config, home_dir,
    resolve_path,
};
pub use settings::{ConfigFormat, DB_FILE, IMAGES_DIR, Overrides, Settings, SettingsFile};
