//! Content-addressed derivative cache
//!
//! Cache files live at `<root>/<h>/<hash>.<ext>` where `hash` is the MD5 of
//! the source reference concatenated with the profile name and `h` is its
//! first hex digit, which caps fan-out at 16 shard directories.
//!
//! Entries are never deleted here. A stale entry is simply regenerated and
//! renamed over the old file.

use crate::models::CachePaths;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Extension forced on profiles marked `transparent`.
pub const TRANSPARENT_EXTENSION: &str = "png";

/// Hex MD5 of `reference || profile`.
pub fn cache_key(reference: &str, profile: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(reference.as_bytes());
    hasher.update(profile.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    system_root: PathBuf,
    public_root: String,
    cache_time: u64,
}

impl CacheStore {
    pub fn new(system_root: impl Into<PathBuf>, public_root: impl Into<String>, cache_time: u64) -> Self {
        Self {
            system_root: system_root.into(),
            public_root: public_root.into(),
            cache_time,
        }
    }

    pub fn cache_time(&self) -> u64 {
        self.cache_time
    }

    /// Compute where the derivative of (`reference`, `profile`) is stored.
    ///
    /// Pure: touches neither the filesystem nor the clock.
    pub fn locate(&self, reference: &str, profile: &str, transparent: bool) -> CachePaths {
        let hash = cache_key(reference, profile);
        let bucket = &hash[..1];
        let extension = if transparent {
            TRANSPARENT_EXTENSION.to_string()
        } else {
            source_extension(reference)
        };
        let file_name = format!("{}.{}", hash, extension);
        let shard_dir = self.system_root.join(bucket);

        CachePaths {
            system_path: shard_dir.join(&file_name),
            public_url: format!(
                "{}/{}/{}",
                self.public_root.trim_end_matches('/'),
                bucket,
                file_name
            ),
            shard_dir,
            extension,
            hash,
        }
    }

    pub fn is_fresh(&self, path: &Path) -> bool {
        self.is_fresh_at(path, Utc::now())
    }

    /// True iff `path` is a regular file modified less than `cache_time`
    /// whole seconds before `now`.
    pub fn is_fresh_at(&self, path: &Path, now: DateTime<Utc>) -> bool {
        let modified = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => match meta.modified() {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(_) => return false,
            },
            _ => return false,
        };

        let age = now.signed_duration_since(modified).num_seconds();
        age < i64::try_from(self.cache_time).unwrap_or(i64::MAX)
    }

    /// Create the shard directory and its parents. Succeeds if it exists.
    pub fn ensure_directory(&self, dir: &Path) -> Result<()> {
        match fs::create_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
            Err(e) => Err(Error::CacheWrite(e)),
        }
    }

    /// Write `bytes` to the cache location.
    ///
    /// The data goes to a temporary file in the shard directory first and is
    /// renamed into place, so concurrent readers never see a partial file and
    /// the last writer wins.
    pub fn persist(&self, paths: &CachePaths, bytes: &[u8]) -> Result<()> {
        self.ensure_directory(&paths.shard_dir)?;

        let mut tmp = NamedTempFile::new_in(&paths.shard_dir).map_err(Error::CacheWrite)?;
        tmp.write_all(bytes).map_err(Error::CacheWrite)?;
        tmp.persist(&paths.system_path)
            .map_err(|e| Error::CacheWrite(e.error))?;

        debug!(path = %paths.system_path.display(), bytes = bytes.len(), "Persisted derivative");
        Ok(())
    }
}

fn source_extension(reference: &str) -> String {
    Path::new(reference)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}
