//! On-disk cache for relayed assets, keyed by SHA-256 of the source URL.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

pub struct AssetCache {
    dir: PathBuf,
}

impl AssetCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key(url: &str) -> String {
        format!("{:x}", Sha256::digest(url.as_bytes()))
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.glb", Self::key(url)))
    }

    /// Cached bytes, or `None` on a miss or unreadable entry.
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.path_for(url);
        match std::fs::read(&path) {
            Ok(bytes) => {
                log::debug!("Asset cache hit {}", path.display());
                Some(bytes)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                log::warn!("Ignoring unreadable cache entry {}: {err}", path.display());
                None
            }
        }
    }

    pub fn put(&self, url: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(url);
        let tmp = path.with_extension("glb.part");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }
}
