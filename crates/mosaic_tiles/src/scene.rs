//! The offscreen-scene seam the tile renderer drives.

use glam::Vec3;
use mosaic_asset::{Aabb, AssetHandle, AssetKind};

/// Camera placement for one tile render.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
}

impl TileCamera {
    /// Frame `bounds` the way asset tiles are framed: the eye sits on the
    /// (1,1,1) diagonal at a distance of the bounds diagonal over sqrt(2),
    /// looking at the center with a fixed tilted up vector.
    pub fn framing(bounds: &Aabb) -> Self {
        let center = bounds.center();
        let mut distance = bounds.diagonal() / std::f32::consts::SQRT_2;
        if !distance.is_finite() || distance < 1e-3 {
            // Degenerate bounds still get a usable view.
            distance = 1.0;
        }
        Self {
            eye: center + Vec3::ONE.normalize() * distance,
            target: center,
            up: Vec3::new(-1.0, 1.0, -1.0).normalize(),
        }
    }
}

/// Readiness of content instantiated into the offscreen scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InstanceState {
    /// Content still streaming in (prefabs wait for their nested assets).
    Pending,
    /// Renderable, with world bounds for framing.
    Ready { bounds: Aabb },
    /// Content cannot become renderable.
    Failed,
}

/// Offscreen scene backend that shows one asset at a time.
///
/// The tile renderer drives it through a fixed sequence per job:
/// [`instantiate`](Self::instantiate), poll
/// [`instance_state`](Self::instance_state), [`render`](Self::render),
/// [`begin_readback`](Self::begin_readback), [`destroy`](Self::destroy),
/// then after the configured frame delay [`take_pixels`](Self::take_pixels).
pub trait TileScene {
    /// Scene-side handle to instantiated content.
    type Instance;

    /// Put the loaded asset into the scene. `None` if it cannot be shown.
    fn instantiate(&mut self, handle: &AssetHandle, kind: AssetKind) -> Option<Self::Instance>;

    /// Poll readiness of an instance.
    fn instance_state(&mut self, instance: &Self::Instance) -> InstanceState;

    /// Render the instance from `camera` into the tile-sized target.
    fn render(&mut self, instance: &Self::Instance, camera: &TileCamera);

    /// Queue the copy of the last render into CPU-readable memory.
    fn begin_readback(&mut self);

    /// Remove content from the scene. Safe to call while a readback of its
    /// pixels is still in flight.
    fn destroy(&mut self, instance: Self::Instance);

    /// Pixels of the completed readback, tightly packed RGBA8 at tile size.
    /// Called once the frame countdown has elapsed.
    fn take_pixels(&mut self) -> Option<Vec<u8>>;
}
