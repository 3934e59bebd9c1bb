//! wgpu backend for scene tile rendering.
//!
//! Implements the [`TileScene`](mosaic_tiles::TileScene) seam on top of a
//! tile-sized offscreen target:
//! - `mesh`: vertex format, procedural primitives, and GPU mesh upload
//! - `bank`: registered content the scene can instance (meshes, prefabs)
//! - `readback`: GPU-to-CPU pixel transfer with row-padding handling
//! - `scene`: the offscreen scene that renders one asset per tile

pub mod bank;
pub mod mesh;
pub mod readback;
pub mod scene;

pub use bank::{ContentBank, Resolution};
pub use mesh::{GpuMesh, MeshData, Vertex};
pub use readback::{align_copy_bytes_per_row, TileReadback};
pub use scene::{OffscreenTileScene, SceneInstance};
