//! Integration tests for the filesystem blob store.

use snag::blob::{BLOB_EXTENSION, BlobKey, BlobStore};
use snag::error::SnagError;
use tempfile::TempDir;

use crate::common::assertions::visible_files;

fn store() -> (TempDir, BlobStore) {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path().join("images"));
    (temp, store)
}

#[test]
fn test_round_trip() {
    let (_temp, store) = store();
    let bytes: Vec<u8> = (0..=255).cycle().take(10_000).collect();
    let key = store.save(&bytes).unwrap();
    assert_eq!(store.load(&key), Some(bytes));
}

#[test]
fn test_identical_bytes_get_distinct_keys() {
    let (_temp, store) = store();
    let a = store.save(b"same").unwrap();
    let b = store.save(b"same").unwrap();
    assert_ne!(a, b);

    store.delete(&a).unwrap();
    assert_eq!(store.load(&b).as_deref(), Some(&b"same"[..]));
}

#[test]
fn test_keys_are_plain_jpg_file_names() {
    let (_temp, store) = store();
    let key = store.save(b"x").unwrap();
    assert!(key.as_str().ends_with(&format!(".{BLOB_EXTENSION}")));
    assert_eq!(visible_files(store.dir()), vec![key.to_string()]);
}

#[test]
fn test_directory_created_lazily() {
    let (_temp, store) = store();
    assert!(!store.dir().exists());
    assert_eq!(store.total_size(), 0);
    assert!(store.enumerate_keys().unwrap().is_empty());
    assert_eq!(store.load(&BlobKey::generate()), None);
    assert!(!store.dir().exists());

    store.save(b"first").unwrap();
    assert!(store.dir().is_dir());
}

#[test]
fn test_delete_reduces_total_size_exactly() {
    let (_temp, store) = store();
    let small = store.save(&[1; 100]).unwrap();
    let _large = store.save(&[2; 4_000]).unwrap();
    assert_eq!(store.total_size(), 4_100);

    assert!(store.delete(&small).unwrap());
    assert_eq!(store.total_size(), 4_000);
    assert_eq!(store.load(&small), None);
}

#[test]
fn test_delete_missing_is_not_an_error() {
    let (_temp, store) = store();
    assert!(!store.delete(&BlobKey::generate()).unwrap());
}

#[test]
fn test_clear_all_empties_store() {
    let (_temp, store) = store();
    for i in 0..5u8 {
        store.save(&[i; 10]).unwrap();
    }
    assert_eq!(store.total_size(), 50);
    assert_eq!(store.clear_all().unwrap(), 5);
    assert_eq!(store.total_size(), 0);
    assert!(store.enumerate_keys().unwrap().is_empty());
}

#[test]
fn test_subdirectories_are_ignored() {
    let (_temp, store) = store();
    let key = store.save(b"photo").unwrap();
    std::fs::create_dir(store.dir().join("nested")).unwrap();
    std::fs::write(store.dir().join("nested").join("inner.jpg"), b"hidden").unwrap();

    let keys = store.enumerate_keys().unwrap();
    assert_eq!(keys.into_iter().collect::<Vec<_>>(), vec![key]);
    assert_eq!(store.total_size(), 5);
}

#[test]
fn test_load_decoded_rejects_garbage() {
    let (_temp, store) = store();
    let key = store.save(b"not a jpeg").unwrap();
    assert!(store.load(&key).is_some());
    assert!(store.load_decoded(&key).is_none());
}

#[test]
fn test_key_parsing_rejects_traversal() {
    for bad in ["", ".", "..", "../etc/passwd", "a/b.jpg", "a\\b.jpg"] {
        assert!(
            matches!(BlobKey::parse(bad), Err(SnagError::InvalidKey { .. })),
            "accepted {bad:?}"
        );
    }
}

#[cfg(unix)]
#[test]
fn test_save_into_unwritable_location_fails_cleanly() {
    let temp = TempDir::new().unwrap();
    // A regular file where the directory should be.
    let blocker = temp.path().join("images");
    std::fs::write(&blocker, b"").unwrap();
    let store = BlobStore::new(&blocker);

    let err = store.save(b"bytes").unwrap_err();
    assert!(matches!(err, SnagError::BlobWrite { .. }));
}
