//! Tile subsystem configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Tunables for both tile pipelines.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileConfig {
    /// Directory tile files are written to, usually under the project root.
    pub cache_dir: PathBuf,
    /// Asset loads the scene pipeline keeps in flight at once; further
    /// requests park on an unbounded overflow list.
    pub scene_queue_capacity: usize,
    /// Frames to wait after queueing a readback before mapping its pixels.
    pub readback_delay_frames: u32,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache/asset_tiles"),
            scene_queue_capacity: 8,
            readback_delay_frames: 2,
        }
    }
}
