use pls_store::{KeyValueStore, MemoryStore, SqliteStore};
use tempfile::TempDir;

fn exercise(store: &dyn KeyValueStore) {
    assert_eq!(store.get("missing").unwrap(), None);

    store.set("k", b"v1").unwrap();
    assert_eq!(store.get("k").unwrap(), Some(b"v1".to_vec()));

    store.set("k", b"v2").unwrap();
    assert_eq!(store.get("k").unwrap(), Some(b"v2".to_vec()));

    store.set("empty", b"").unwrap();
    assert_eq!(store.get("empty").unwrap(), Some(Vec::new()));

    store.delete("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);

    // Deleting an absent key is fine.
    store.delete("k").unwrap();
}

// ── MemoryStore ──────────────────────────────────────────────────

#[test]
fn memory_store_contract() {
    exercise(&MemoryStore::new());
}

#[test]
fn memory_store_len() {
    let store = MemoryStore::new();
    assert!(store.is_empty().unwrap());
    store.set("a", b"1").unwrap();
    store.set("b", b"2").unwrap();
    assert_eq!(store.len().unwrap(), 2);
}

// ── SqliteStore ──────────────────────────────────────────────────

#[test]
fn sqlite_in_memory_contract() {
    exercise(&SqliteStore::open_in_memory().unwrap());
}

#[test]
fn sqlite_file_contract() {
    let dir = TempDir::new().unwrap();
    exercise(&SqliteStore::open(dir.path().join("pls.sqlite3")).unwrap());
}

#[test]
fn sqlite_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pls.sqlite3");

    {
        let store = SqliteStore::open(&path).unwrap();
        store.set("pls_license_storage_map", &[1, 2, 3, 0, 255]).unwrap();
    }

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(
        reopened.get("pls_license_storage_map").unwrap(),
        Some(vec![1, 2, 3, 0, 255])
    );
}

#[test]
fn sqlite_open_in_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let result = SqliteStore::open(dir.path().join("no/such/dir/pls.sqlite3"));
    assert!(result.is_err());
}
