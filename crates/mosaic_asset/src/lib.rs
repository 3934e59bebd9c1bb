//! # mosaic_asset - Asset identity for tile generation
//!
//! Shared asset model for the Mosaic tile pipelines:
//! - Asset kinds mapped from file extensions
//! - Normalized source paths and the CRC32 cache keys derived from them
//! - Poll-based load-state handles
//! - The [`AssetSource`] seam to the host engine, with a table-driven
//!   [`AssetRegistry`] implementation for hosts and tests

pub mod bounds;
pub mod handle;
pub mod kind;
pub mod path;
pub mod source;

pub use bounds::Aabb;
pub use handle::{AssetHandle, LoadState};
pub use kind::AssetKind;
pub use path::{CacheKey, SourcePath};
pub use source::{AssetRegistry, AssetSource};
