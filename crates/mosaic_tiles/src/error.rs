//! Error types for tile generation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, TileError>;

/// Failures while producing a single tile.
///
/// None of these are fatal to a pipeline: the image worker degrades to a
/// placeholder tile and the scene renderer skips the affected request.
#[derive(Error, Debug)]
pub enum TileError {
    #[error("cannot read source {path}: {source}")]
    SourceUnreadable { path: PathBuf, source: io::Error },

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("encode failed: {0}")]
    EncodeFailed(String),

    #[error("cannot write {path}: {source}")]
    WriteFailed { path: PathBuf, source: io::Error },

    #[error("asset failed to load: {0}")]
    AssetLoadFailed(String),

    #[error("cannot start tile worker: {0}")]
    WorkerSpawn(#[source] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_source() {
        let err = TileError::AssetLoadFailed("models/lamp.glb".to_string());
        assert_eq!(err.to_string(), "asset failed to load: models/lamp.glb");

        let err = TileError::DecodeFailed("bad magic".to_string());
        assert_eq!(err.to_string(), "decode failed: bad magic");
    }
}
