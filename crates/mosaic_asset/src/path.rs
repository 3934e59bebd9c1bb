//! Normalized source paths and the CRC32 cache keys derived from them.

use std::fmt;
use std::path::Path;

/// An asset path normalized for cache-key derivation.
///
/// Normalization converts backslashes to forward slashes and strips a
/// leading `./`, so the same asset hashes to the same key no matter which
/// separator convention the host used. Case is preserved; paths stay valid
/// on case-sensitive filesystems.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourcePath(String);

impl SourcePath {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        let trimmed = raw
            .strip_prefix("./")
            .or_else(|| raw.strip_prefix(".\\"))
            .unwrap_or(&raw);
        let mut normalized = String::with_capacity(trimmed.len());
        for ch in trimmed.chars() {
            match ch {
                '\\' => normalized.push('/'),
                c => normalized.push(c),
            }
        }
        SourcePath(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension without the dot, as spelled in the path.
    pub fn extension(&self) -> Option<&str> {
        let name = self.0.rsplit('/').next()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            None
        } else {
            Some(ext)
        }
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::of(self)
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for SourcePath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// 32-bit key identifying one tile file.
///
/// The key is the standard CRC32 of the normalized path bytes. Distinct
/// paths can collide; a collision makes two assets share a tile file, which
/// the cache tolerates (the later write wins).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(pub u32);

impl CacheKey {
    pub fn of(path: &SourcePath) -> Self {
        CacheKey(crc32fast::hash(path.as_str().as_bytes()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
