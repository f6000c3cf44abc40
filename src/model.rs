// src/model.rs

use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// A creation-date record: a date-time with its original timezone offset.
pub type Stamp = DateTime<FixedOffset>;

/// A repository-relative path key. Stores the path with its original
/// casing (backslashes normalized to `/`), but hashes and compares
/// case-insensitively, since filesystem path casing is not always
/// significant.
#[derive(Debug, Clone)]
pub struct PathKey(String);

impl PathKey {
    pub fn new(path: &str) -> Self {
        PathKey(path.replace('\\', "/"))
    }
}

impl PartialEq for PathKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for PathKey {}

impl Hash for PathKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

/// Maps repository-relative paths to creation stamps. Built once per run:
/// seeded by the stamp importers, extended by the history scanner, read
/// by the applicator.
#[derive(Debug, Default)]
pub struct StampMap {
    entries: HashMap<PathKey, Stamp>,
}

impl StampMap {
    pub fn new() -> Self {
        StampMap::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<Stamp> {
        self.entries.get(&PathKey::new(path)).copied()
    }

    /// Idempotent insert: the first writer for a path wins. Returns true
    /// if the entry was actually inserted. The history scanner uses this
    /// so that imported stamps are never overwritten by history-derived
    /// ones, and so that re-running a scan stays safe.
    pub fn insert_if_absent(&mut self, path: &str, stamp: Stamp) -> bool {
        let key = PathKey::new(path);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, stamp);
        true
    }

    /// Plain overwrite. Importers use this for their own "last line wins"
    /// rule within a single pass.
    pub fn set(&mut self, path: &str, stamp: Stamp) {
        self.entries.insert(PathKey::new(path), stamp);
    }

    pub fn remove(&mut self, path: &str) -> Option<Stamp> {
        self.entries.remove(&PathKey::new(path))
    }
}
