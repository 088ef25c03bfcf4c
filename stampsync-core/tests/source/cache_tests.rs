// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for the source cache
//!
//! - Atomic pair writes
//! - A half-present pair is a cache miss
//! - Cache age drives freshness

use std::time::SystemTime;

use stampsync_core::source::{signature_path, CacheError, CacheStore};
use tempfile::TempDir;

use super::support::{cache_path, set_cache_age, signer, HOUR};

#[test]
fn test_load_missing_cache() {
    let temp = TempDir::new().unwrap();
    let cache = CacheStore::new(cache_path(&temp));

    assert!(matches!(cache.load(), Err(CacheError::NotFound(_))));
}

#[test]
fn test_missing_signature_is_a_miss() {
    let temp = TempDir::new().unwrap();
    let cache = CacheStore::new(cache_path(&temp));
    cache.store(b"list", b"sig").unwrap();
    std::fs::remove_file(cache.signature_path()).unwrap();

    assert!(matches!(cache.load(), Err(CacheError::NotFound(p)) if p == cache.signature_path()));
}

#[test]
fn test_store_creates_parent_directory() {
    let temp = TempDir::new().unwrap();
    let cache = CacheStore::new(temp.path().join("nested/dir/list.md"));

    cache.store(b"list", b"sig").unwrap();
    assert_eq!(cache.load().unwrap().0, b"list");
    assert_eq!(
        cache.signature_path(),
        signature_path(&temp.path().join("nested/dir/list.md"))
    );
}

#[test]
fn test_failed_signature_write_leaves_no_trusted_pair() {
    let temp = TempDir::new().unwrap();
    let key = signer(1);
    let cache = CacheStore::new(cache_path(&temp));

    // A non-empty directory where the signature belongs: its rename fails
    std::fs::create_dir(cache.signature_path()).unwrap();
    std::fs::write(cache.signature_path().join("keep"), b"").unwrap();

    let sig = key.sign(b"new list", "new");
    assert!(cache.store(b"new list", sig.as_bytes()).is_err());

    // The list without its signature is never loaded as a pair
    assert!(cache.load().is_err());
    // and no temp file is left behind
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 2);
}

#[test]
fn test_concurrent_stores_do_not_collide() {
    let temp = TempDir::new().unwrap();
    let cache = CacheStore::new(cache_path(&temp));

    let writers: Vec<_> = [b"list one".as_slice(), b"list two".as_slice()]
        .into_iter()
        .map(|blob| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    cache.store(blob, b"sig").unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let (blob, _) = cache.load().unwrap();
    assert!(blob == b"list one" || blob == b"list two");
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 2);
}

#[test]
fn test_overwrite_replaces_both_files() {
    let temp = TempDir::new().unwrap();
    let cache = CacheStore::new(cache_path(&temp));
    cache.store(b"one", b"sig one").unwrap();
    cache.store(b"two", b"sig two").unwrap();

    assert_eq!(cache.load().unwrap(), (b"two".to_vec(), b"sig two".to_vec()));
}

#[test]
fn test_age_tracks_modification_time() {
    let temp = TempDir::new().unwrap();
    let cache = CacheStore::new(cache_path(&temp));
    cache.store(b"list", b"sig").unwrap();

    let now = SystemTime::now();
    set_cache_age(cache.path(), now, 5 * HOUR);
    let age = cache.age(now).unwrap();
    assert!(age.abs_diff(5 * HOUR) < std::time::Duration::from_secs(1));
}

#[test]
fn test_age_of_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let cache = CacheStore::new(cache_path(&temp));

    assert!(matches!(cache.age(SystemTime::now()), Err(CacheError::Io(_))));
}
