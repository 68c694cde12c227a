//! Image ingestion: decode a source image and re-encode it for storage.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageEncoder};
use tracing::{debug, instrument};

use crate::error::{Result, SnagError};

/// JPEG quality used when none is configured.
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Encoded bytes ready for the blob store, plus the pixel dimensions the
/// photo record keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PreparedPhoto {
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Load and decode an image file.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be decoded.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_source(path: &Path) -> Result<DynamicImage> {
    if !path.exists() {
        return Err(SnagError::ImageNotFound {
            path: path.display().to_string(),
        });
    }

    let img = image::open(path).map_err(|e| SnagError::ImageProcessing(e.to_string()))?;
    debug!(width = img.width(), height = img.height(), "Source image decoded");
    Ok(img)
}

/// Encode `img` as JPEG at `quality` (1-100).
///
/// Alpha is dropped; JPEG has no transparency.
pub fn prepare_for_storage(img: &DynamicImage, quality: u8) -> Result<PreparedPhoto> {
    if !(1..=100).contains(&quality) {
        return Err(SnagError::InvalidField {
            field: "quality",
            value: quality.to_string(),
        });
    }

    let (width, height) = img.dimensions();
    let rgb = img.to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut bytes), quality)
        .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .map_err(|e| SnagError::ImageProcessing(e.to_string()))?;

    debug!(width, height, quality, encoded = bytes.len(), "Image prepared");
    Ok(PreparedPhoto {
        bytes,
        width,
        height,
    })
}

/// [`load_source`] then [`prepare_for_storage`].
pub fn prepare_file(path: &Path, quality: u8) -> Result<PreparedPhoto> {
    let img = load_source(path)?;
    prepare_for_storage(&img, quality)
}
