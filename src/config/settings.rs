//! Runtime settings loaded from TOML or YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::path::{APP_DIR, expand_home, find_default_config, resolve_path};
use crate::error::{Result, SnagError};
use crate::image_ops::DEFAULT_JPEG_QUALITY;

/// Name of the blob directory under the data directory.
pub const IMAGES_DIR: &str = "images";
/// Name of the record database under the data directory.
pub const DB_FILE: &str = "snags.db";

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml).
    Yaml,
    /// TOML format (.toml).
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension.
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Settings as written in a config file. Every key is optional.
///
/// # Example TOML
///
/// ```toml
/// data_dir = "~/site-a"
/// jpeg_quality = 85
/// sweep_on_start = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub data_dir: Option<PathBuf>,
    pub jpeg_quality: Option<u8>,
    pub sweep_on_start: Option<bool>,
}

impl SettingsFile {
    /// Parse config content in the given format.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Yaml if content.trim().is_empty() => Ok(Self::default()),
            ConfigFormat::Yaml => serde_yaml::from_str(content)
                .map_err(|e| SnagError::ConfigParse(format!("YAML: {e}"))),
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| SnagError::ConfigParse(format!("TOML: {e}")))
            }
        }
    }

    /// Read and parse a config file, detecting format by extension.
    #[instrument(fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let format = ConfigFormat::from_extension(path).ok_or_else(|| {
            SnagError::ConfigParse(format!(
                "Unknown config format for '{}': expected .yaml, .yml, or .toml",
                path.display()
            ))
        })?;

        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SnagError::ConfigNotFound {
                    path: path.display().to_string(),
                }
            } else {
                SnagError::Io(e)
            }
        })?;
        debug!(format = ?format, bytes = content.len(), "Read config file");
        Self::parse(&content, format)
    }
}

/// Values that beat the config file: CLI flags and their env vars.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Explicit config file; must exist.
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub jpeg_quality: Option<u8>,
}

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Root for `snags.db` and `images/`.
    pub data_dir: PathBuf,
    /// JPEG quality for ingested photos (1-100).
    pub jpeg_quality: u8,
    /// Run the orphan sweep when the tracker opens.
    pub sweep_on_start: bool,
    /// Config file the settings came from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Default settings rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            sweep_on_start: false,
            source: None,
        }
    }

    /// Blob store directory.
    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join(IMAGES_DIR)
    }

    /// Record database path.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    /// Load settings: overrides, then config file, then defaults.
    ///
    /// An explicit config path must exist. Without one, the platform config
    /// directory is searched and a missing file means defaults.
    #[instrument(skip_all)]
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let source = match &overrides.config {
            Some(path) => {
                let path = expand_home(path)?.unwrap_or_else(|| path.clone());
                if !path.is_file() {
                    return Err(SnagError::ConfigNotFound {
                        path: path.display().to_string(),
                    });
                }
                Some(path)
            }
            None => find_default_config(),
        };

        let file = match &source {
            Some(path) => SettingsFile::load(path)?,
            None => SettingsFile::default(),
        };
        trace!(?file, "Config file values");

        Self::merge(file, source, overrides)
    }

    /// Combine file values with overrides and defaults, then validate.
    pub fn merge(file: SettingsFile, source: Option<PathBuf>, overrides: &Overrides) -> Result<Self> {
        let config_dir = source
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        let data_dir = match (&overrides.data_dir, file.data_dir) {
            (Some(dir), _) => expand_home(dir)?.unwrap_or_else(|| dir.clone()),
            (None, Some(dir)) => resolve_path(&dir, &config_dir)?,
            (None, None) => default_data_root()?,
        };

        let settings = Self {
            data_dir,
            jpeg_quality: overrides
                .jpeg_quality
                .or(file.jpeg_quality)
                .unwrap_or(DEFAULT_JPEG_QUALITY),
            sweep_on_start: file.sweep_on_start.unwrap_or(false),
            source,
        };
        settings.validate()?;
        debug!(
            data_dir = %settings.data_dir.display(),
            jpeg_quality = settings.jpeg_quality,
            sweep_on_start = settings.sweep_on_start,
            "Settings resolved"
        );
        Ok(settings)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(SnagError::ConfigInvalid(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(SnagError::ConfigInvalid("data_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_data_root() -> Result<PathBuf> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| SnagError::ConfigInvalid("Could not determine local data directory".to_string()))
}
