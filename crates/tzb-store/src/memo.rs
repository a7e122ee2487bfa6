//! Content-addressed recompute skipping.
//!
//! A memo answers one question: given a key, the digest of everything that
//! went into computing it, and the file the result lives in, can the
//! previous result be reused? [`get_or_compute`] wraps that question around
//! a compute closure. The builder owns no cache state itself.

use crate::atomic::write_json_atomic;
use crate::error::StoreError;
use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

pub const MEMO_INDEX_FILE: &str = "zone-cache.json";

pub trait Memoize: Send + Sync {
    /// Whether the result for `key` computed from `input` is still valid in
    /// `output`.
    fn is_fresh(&self, key: &str, input: &ContentHash, output: &Path) -> bool;

    /// Remember that `output_digest` was computed from `input`.
    fn record(&self, key: &str, input: ContentHash, output_digest: ContentHash);

    /// Persist whatever was recorded.
    fn finish(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// How a memoized value was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum Memoized<T> {
    Reused(T),
    Computed(T),
}

impl<T> Memoized<T> {
    pub fn into_inner(self) -> T {
        match self {
            Memoized::Reused(value) | Memoized::Computed(value) => value,
        }
    }

    pub fn was_reused(&self) -> bool {
        matches!(self, Memoized::Reused(_))
    }
}

/// Reuse the result in `output` when fresh (loading it with `reload`),
/// otherwise run `compute`, which must write `output` and return the value
/// with the digest of the bytes written.
///
/// A failing `reload` falls back to `compute`.
pub fn get_or_compute<T, E, R, C>(
    memo: &dyn Memoize,
    key: &str,
    input: &ContentHash,
    output: &Path,
    reload: R,
    compute: C,
) -> Result<Memoized<T>, E>
where
    R: FnOnce() -> Result<T, E>,
    C: FnOnce() -> Result<(T, ContentHash), E>,
    E: std::fmt::Display,
{
    if memo.is_fresh(key, input, output) {
        match reload() {
            Ok(value) => {
                debug!(key, "reusing memoized result");
                return Ok(Memoized::Reused(value));
            }
            Err(err) => warn!(key, error = %err, "memoized result unreadable, recomputing"),
        }
    }
    let (value, output_digest) = compute()?;
    memo.record(key, input.clone(), output_digest);
    Ok(Memoized::Computed(value))
}

/// Always recompute.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMemo;

impl Memoize for NoMemo {
    fn is_fresh(&self, _key: &str, _input: &ContentHash, _output: &Path) -> bool {
        false
    }

    fn record(&self, _key: &str, _input: ContentHash, _output_digest: ContentHash) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoEntry {
    pub input_digest: ContentHash,
    pub output_digest: ContentHash,
}

/// A memo index kept as a JSON file (`<working>/zone-cache.json`).
///
/// An entry is fresh when its input digest matches and the output file on
/// disk still hashes to the recorded output digest.
#[derive(Debug)]
pub struct FileMemo {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, MemoEntry>>,
}

impl FileMemo {
    /// Open the index at `path`. A missing index starts empty; an unreadable
    /// one is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "discarding unreadable memo index");
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn in_dir(working_dir: &Path) -> Self {
        Self::open(working_dir.join(MEMO_INDEX_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entry(&self, key: &str) -> Option<MemoEntry> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, MemoEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Memoize for FileMemo {
    fn is_fresh(&self, key: &str, input: &ContentHash, output: &Path) -> bool {
        let Some(entry) = self.entry(key) else {
            return false;
        };
        if &entry.input_digest != input {
            return false;
        }
        match std::fs::read(output) {
            Ok(bytes) => ContentHash::from_bytes(&bytes) == entry.output_digest,
            Err(_) => false,
        }
    }

    fn record(&self, key: &str, input: ContentHash, output_digest: ContentHash) {
        self.lock().insert(
            key.to_string(),
            MemoEntry {
                input_digest: input,
                output_digest,
            },
        );
    }

    fn finish(&self) -> Result<(), StoreError> {
        let entries = self.lock().clone();
        write_json_atomic(&self.path, &entries)
    }
}
