//! Integration tests for the orphan sweep.

use std::collections::HashSet;

use snag::blob::{BlobKey, BlobStore};
use snag::error::SnagError;
use snag::record::{Photo, Snag, SnagDb};
use tempfile::TempDir;

fn keys(store: &BlobStore) -> HashSet<BlobKey> {
    store.enumerate_keys().unwrap().into_iter().collect()
}

#[test]
fn test_sweep_keeps_exactly_the_referenced_set() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    let a = store.save(b"a").unwrap();
    let b = store.save(b"b").unwrap();
    let c = store.save(b"c").unwrap();

    let keep: HashSet<_> = [a.clone(), b.clone()].into_iter().collect();
    let report = store.reconcile(&keep).unwrap();

    assert_eq!(report.removed, vec![c]);
    assert_eq!(keys(&store), keep);
}

#[test]
fn test_sweep_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    let a = store.save(b"a").unwrap();
    store.save(b"orphan").unwrap();
    let keep: HashSet<_> = [a].into_iter().collect();

    let first = store.reconcile(&keep).unwrap();
    let after_first = keys(&store);
    let second = store.reconcile(&keep).unwrap();

    assert_eq!(first.orphan_count(), 1);
    assert_eq!(second.orphan_count(), 0);
    assert_eq!(keys(&store), after_first);
}

#[test]
fn test_sweep_with_empty_keep_set_removes_everything() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    store.save(&[0; 300]).unwrap();
    store.save(&[0; 700]).unwrap();

    let report = store.reconcile(&HashSet::new()).unwrap();
    assert_eq!(report.orphan_count(), 2);
    assert_eq!(report.reclaimed_bytes, 1_000);
    assert_eq!(store.total_size(), 0);
}

#[test]
fn test_leftover_temp_file_is_swept() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    let live = store.save(b"live").unwrap();
    // What an interrupted save leaves behind.
    std::fs::write(temp.path().join(".interrupted123.tmp"), b"partial").unwrap();

    let keep: HashSet<_> = [live.clone()].into_iter().collect();
    let report = store.reconcile(&keep).unwrap();

    assert_eq!(report.orphan_count(), 1);
    assert_eq!(report.removed[0].as_str(), ".interrupted123.tmp");
    assert!(store.contains(&live));
}

#[test]
fn test_crash_between_save_and_commit_is_recovered() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path().join("images"));
    let mut db = SnagDb::open(temp.path().join("snags.db")).unwrap();

    let snag = Snag::new("Skirting board");
    db.create_snag(&snag).unwrap();
    let committed = store.save(b"committed").unwrap();
    db.insert_photo(&Photo::new(snag.id, committed.clone(), None)).unwrap();

    // Blob written, then the process died before its row was inserted.
    let uncommitted = store.save(b"uncommitted").unwrap();
    drop(db);

    let db = SnagDb::open(temp.path().join("snags.db")).unwrap();
    let report = store.reconcile(&db.referenced_keys().unwrap()).unwrap();

    assert_eq!(report.removed, vec![uncommitted.clone()]);
    assert!(!store.contains(&uncommitted));
    assert_eq!(store.load(&committed).as_deref(), Some(&b"committed"[..]));
}

#[test]
fn test_dry_run_reports_without_deleting() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    let orphan = store.save(&[9; 64]).unwrap();

    let plan = store.plan_sweep(&HashSet::new()).unwrap();
    assert!(plan.dry_run);
    assert_eq!(plan.reclaimed_bytes, 64);
    assert!(store.contains(&orphan));
}

#[cfg(unix)]
#[test]
fn test_stray_backslash_file_is_counted_and_swept() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    let live = store.save(b"x").unwrap();
    std::fs::write(temp.path().join("a\\b.jpg"), b"stray bytes").unwrap();

    assert_eq!(store.enumerate_keys().unwrap().len(), 2);
    assert_eq!(store.total_size(), 12);

    let keep: HashSet<_> = [live.clone()].into_iter().collect();
    let report = store.reconcile(&keep).unwrap();

    assert_eq!(report.removed[0].as_str(), "a\\b.jpg");
    assert_eq!(report.reclaimed_bytes, 11);
    assert_eq!(keys(&store), keep);
    assert_eq!(store.total_size(), 1);
}

#[test]
fn test_sweep_continues_past_a_failed_delete() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    let live = store.save(b"live").unwrap();
    let first = store.save(b"orphan one").unwrap();
    let pinned = store.save(b"orphan two").unwrap();
    let last = store.save(b"orphan three").unwrap();

    let keep: HashSet<_> = [live.clone()].into_iter().collect();
    let plan = store.plan_sweep(&keep).unwrap();
    assert_eq!(plan.orphan_count(), 3);

    // A non-empty directory under the key's name cannot be unlinked.
    let pinned_path = temp.path().join(pinned.as_str());
    std::fs::remove_file(&pinned_path).unwrap();
    std::fs::create_dir(&pinned_path).unwrap();
    std::fs::write(pinned_path.join("inner"), b"x").unwrap();

    let err = store.apply_sweep(plan).unwrap_err();
    match err {
        SnagError::SweepIncomplete { removed, failed } => {
            assert_eq!(removed, 2);
            assert_eq!(failed, vec![pinned.to_string()]);
        }
        other => panic!("expected SweepIncomplete, got {other:?}"),
    }
    assert!(!store.contains(&first));
    assert!(!store.contains(&last));
    assert!(store.contains(&live));
    assert!(pinned_path.is_dir());
}
