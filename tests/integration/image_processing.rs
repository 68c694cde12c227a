//! Integration tests for image ingestion.

use std::path::Path;

use image::GenericImageView;
use snag::error::SnagError;
use snag::image_ops::{DEFAULT_JPEG_QUALITY, load_source, prepare_file};

use crate::common::fixtures::TestImages;

#[test]
fn test_prepare_png_file() {
    let images = TestImages::new();
    let path = images.png("tile.png", 64, 32);

    let prepared = prepare_file(&path, DEFAULT_JPEG_QUALITY).unwrap();
    assert_eq!(prepared.dimensions(), (64, 32));
    let decoded = image::load_from_memory(&prepared.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (64, 32));
}

#[test]
fn test_transparency_is_flattened() {
    let images = TestImages::new();
    let path = images.transparent_png("glass.png", 16);

    let prepared = prepare_file(&path, 90).unwrap();
    let decoded = image::load_from_memory(&prepared.bytes).unwrap();
    assert_eq!(decoded.dimensions(), (16, 16));
    assert!(!decoded.color().has_alpha());
}

#[test]
fn test_quality_changes_output_size() {
    let images = TestImages::new();
    let path = images.png("detail.png", 200, 200);

    let high = prepare_file(&path, 100).unwrap();
    let low = prepare_file(&path, 5).unwrap();
    assert!(low.bytes.len() < high.bytes.len());
}

#[test]
fn test_missing_file() {
    let err = load_source(Path::new("/nonexistent/snag.png")).unwrap_err();
    assert!(matches!(err, SnagError::ImageNotFound { .. }));
    assert!(err.is_user_recoverable());
}

#[test]
fn test_undecodable_file() {
    let images = TestImages::new();
    let path = images.corrupt("fake.png");
    assert!(matches!(
        prepare_file(&path, DEFAULT_JPEG_QUALITY),
        Err(SnagError::ImageProcessing(_))
    ));
}
