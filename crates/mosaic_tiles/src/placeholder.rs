//! Canonical placeholder tiles.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use mosaic_asset::AssetKind;
use parking_lot::RwLock;

use crate::codec;
use crate::error::{Result, TileError};
use crate::TILE_SIZE;

/// Create a solid color tile image.
pub fn solid_color(r: u8, g: u8, b: u8) -> RgbaImage {
    RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba([r, g, b, 255]))
}

/// Create a checkerboard tile image.
pub fn checker_pattern(r1: u8, g1: u8, b1: u8, r2: u8, g2: u8, b2: u8) -> RgbaImage {
    let cell = 8;
    RgbaImage::from_fn(TILE_SIZE, TILE_SIZE, |x, y| {
        if ((x / cell) + (y / cell)) % 2 == 0 {
            Rgba([r1, g1, b1, 255])
        } else {
            Rgba([r2, g2, b2, 255])
        }
    })
}

/// Placeholder pixels for an asset kind.
pub fn placeholder_image(kind: AssetKind) -> RgbaImage {
    match kind {
        AssetKind::Texture => checker_pattern(180, 180, 200, 140, 140, 160),
        AssetKind::Model => solid_color(100, 150, 200),
        AssetKind::Prefab => solid_color(200, 150, 100),
        AssetKind::Material => solid_color(170, 120, 90),
        AssetKind::Shader => solid_color(150, 200, 100),
        AssetKind::Audio => solid_color(200, 100, 150),
        AssetKind::Script => solid_color(150, 100, 200),
        AssetKind::Unknown => solid_color(128, 128, 128),
    }
}

/// Pre-encoded placeholder tiles.
///
/// Encoded once at startup and reused for every degraded request, so two
/// placeholder writes for the same kind are bit-identical. A host can
/// override a kind with a hand-authored tile file; `write_for` then copies
/// that file instead. Shared as `Arc<Placeholders>` between the pipelines.
pub struct Placeholders {
    encoded: HashMap<AssetKind, Vec<u8>>,
    overrides: RwLock<HashMap<AssetKind, PathBuf>>,
}

impl Placeholders {
    const KINDS: [AssetKind; 5] = [
        AssetKind::Texture,
        AssetKind::Model,
        AssetKind::Prefab,
        AssetKind::Material,
        AssetKind::Shader,
    ];

    /// Encode the canonical placeholder for every supported kind.
    pub fn generate() -> Result<Self> {
        let mut encoded = HashMap::new();
        for kind in Self::KINDS {
            encoded.insert(kind, codec::encode_color_tile(&placeholder_image(kind))?);
        }
        Ok(Self {
            encoded,
            overrides: RwLock::new(HashMap::new()),
        })
    }

    /// Use a hand-authored tile file for `kind` instead of the generated
    /// pattern. Takes effect for all later writes, on both pipelines.
    pub fn set_override(&self, kind: AssetKind, file: PathBuf) {
        self.overrides.write().insert(kind, file);
    }

    /// Canonical generated tile bytes for `kind`.
    pub fn bytes_for(&self, kind: AssetKind) -> &[u8] {
        self.encoded
            .get(&kind)
            .or_else(|| self.encoded.get(&AssetKind::Texture))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Write the placeholder tile for `kind` to `dest`, creating parent
    /// directories on demand.
    pub fn write_for(&self, kind: AssetKind, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|source| TileError::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let override_file = self.overrides.read().get(&kind).cloned();
        if let Some(file) = override_file {
            fs::copy(file, dest).map_err(|source| TileError::WriteFailed {
                path: dest.to_path_buf(),
                source,
            })?;
            return Ok(());
        }
        fs::write(dest, self.bytes_for(kind)).map_err(|source| TileError::WriteFailed {
            path: dest.to_path_buf(),
            source,
        })
    }
}
