//! # mosaic_tiles - Asset tile generation
//!
//! Turns editor assets into small square DDS preview tiles cached on disk.
//! Two pipelines share one cache:
//! - An image worker thread decodes, resizes and block-compresses image
//!   assets off the frame loop
//! - A scene tile renderer frames model and prefab assets in a reusable
//!   offscreen scene, a few cooperative steps per frame
//!
//! Hosts construct a [`TilePipeline`] with an offscreen [`TileScene`]
//! backend and an [`AssetSource`](mosaic_asset::AssetSource), call
//! [`create_tile`](TilePipeline::create_tile) when the asset browser wants
//! a tile, and [`update`](TilePipeline::update) once per frame.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod image_worker;
pub mod pipeline;
pub mod placeholder;
pub mod queue;
pub mod renderer;
pub mod scene;

pub use cache::TileCache;
pub use config::TileConfig;
pub use error::{Result, TileError};
pub use image_worker::ImageTileWorker;
pub use pipeline::TilePipeline;
pub use placeholder::Placeholders;
pub use queue::BoundedQueue;
pub use renderer::{SceneTileRenderer, TileRequest};
pub use scene::{InstanceState, TileCamera, TileScene};

/// Side length of generated tiles in pixels.
pub const TILE_SIZE: u32 = 64;

/// File extension of tile files.
pub const TILE_EXTENSION: &str = "dds";
