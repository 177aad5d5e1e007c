//! Durable content-addressed cache.
//!
//! One file per [`CacheKey`] under a root directory. Writes go to a
//! temporary file in the same directory and are promoted with an atomic
//! rename, so a concurrent reader either sees the previous complete entry
//! or the new complete entry, never a partial one. Anything that fails to
//! decode is treated as a miss and removed: corruption self-heals into a
//! re-fetch.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::cache::key::CacheKey;

const ENVELOPE_MAGIC: u32 = 0x4350_4F53; // "CPOS"
const ENVELOPE_VERSION: u16 = 1;

/// On-disk framing around a payload. A version bump invalidates every
/// existing entry (decode fails, entry becomes a miss).
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    magic: u32,
    version: u16,
    created_at_unix: u64,
    payload: Vec<u8>,
}

/// A cache hit: the stored payload plus its creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub payload: Vec<u8>,
    pub created_at_unix: u64,
}

/// Filesystem-backed store, safe for concurrent readers and for
/// concurrent writers on distinct keys; same-key writers race benignly
/// (last rename wins, both values complete).
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Opens (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.filename())
    }

    /// Looks up `key`. Missing, unreadable, or corrupt entries all come
    /// back as `None`; corrupt files are deleted so the next write starts
    /// clean.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.entry_path(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("cache read error for {}: {}", path.display(), e);
                return None;
            }
        };

        match bincode::deserialize::<Envelope>(&bytes) {
            Ok(env) if env.magic == ENVELOPE_MAGIC && env.version == ENVELOPE_VERSION => {
                log::debug!("cache hit: {}", key.filename());
                Some(CacheEntry {
                    payload: env.payload,
                    created_at_unix: env.created_at_unix,
                })
            }
            _ => {
                log::warn!("corrupt cache entry {}, treating as miss", path.display());
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Stores `payload` under `key`, replacing any previous entry.
    pub fn put(&self, key: &CacheKey, payload: &[u8]) -> std::io::Result<()> {
        let env = Envelope {
            magic: ENVELOPE_MAGIC,
            version: ENVELOPE_VERSION,
            created_at_unix: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            payload: payload.to_vec(),
        };
        let bytes = bincode::serialize(&env)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        // Temp file in the cache dir itself so the rename never crosses a
        // filesystem boundary.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.entry_path(key)).map_err(|e| e.error)?;
        log::debug!("cache store: {} ({} bytes)", key.filename(), payload.len());
        Ok(())
    }

    /// Explicit invalidation of a single entry. Absent entries are fine.
    pub fn purge(&self, key: &CacheKey) -> std::io::Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}
