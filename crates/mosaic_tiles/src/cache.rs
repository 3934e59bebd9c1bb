//! On-disk tile cache layout.

use std::fs;
use std::path::{Path, PathBuf};

use mosaic_asset::{CacheKey, SourcePath};

use crate::error::{Result, TileError};
use crate::TILE_EXTENSION;

/// Owns the tile cache directory and its naming scheme.
///
/// Tiles live at `<cache_dir>/<decimal crc32>.dds`. Writes replace the
/// file in place, so re-requesting an asset refreshes the same path the
/// browser is already watching.
#[derive(Clone, Debug)]
pub struct TileCache {
    cache_dir: PathBuf,
}

impl TileCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory if it is missing.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).map_err(|source| TileError::WriteFailed {
            path: self.cache_dir.clone(),
            source,
        })
    }

    /// Path of the tile file for `key`.
    pub fn tile_path(&self, key: CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{key}.{TILE_EXTENSION}"))
    }

    /// Path of the tile file for `path`'s cache key.
    pub fn tile_path_for(&self, path: &SourcePath) -> PathBuf {
        self.tile_path(path.cache_key())
    }

    /// True if a tile for `path` is present on disk.
    pub fn has_tile(&self, path: &SourcePath) -> bool {
        self.tile_path_for(path).is_file()
    }

    /// Write tile bytes for `key`, creating the directory on demand.
    pub fn write(&self, key: CacheKey, bytes: &[u8]) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.tile_path(key);
        fs::write(&path, bytes).map_err(|source| TileError::WriteFailed {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_path_uses_decimal_key() {
        let cache = TileCache::new("/tmp/tiles");
        let path = cache.tile_path(CacheKey(42));
        assert_eq!(path, PathBuf::from("/tmp/tiles/42.dds"));
    }

    #[test]
    fn write_creates_dir_and_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = TileCache::new(dir.path().join("nested/tiles"));
        let source = SourcePath::new("textures/wall.png");

        assert!(!cache.has_tile(&source));
        let written = cache.write(source.cache_key(), b"tile").expect("write");
        assert!(cache.has_tile(&source));
        assert_eq!(written, cache.tile_path_for(&source));
        assert_eq!(fs::read(written).expect("read back"), b"tile");
    }

    #[test]
    fn rewrite_replaces_in_place() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = TileCache::new(dir.path());
        let key = CacheKey(7);

        cache.write(key, b"first").expect("write");
        cache.write(key, b"second").expect("rewrite");
        assert_eq!(fs::read(cache.tile_path(key)).expect("read back"), b"second");
    }
}
