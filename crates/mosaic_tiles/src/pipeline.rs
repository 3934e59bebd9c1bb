//! Tile pipeline facade: dispatch by asset kind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mosaic_asset::{AssetKind, AssetSource, SourcePath};

use crate::cache::TileCache;
use crate::config::TileConfig;
use crate::error::Result;
use crate::image_worker::ImageTileWorker;
use crate::placeholder::Placeholders;
use crate::renderer::{SceneTileRenderer, TileRequest};
use crate::scene::{TileCamera, TileScene};

/// Front door of the tile subsystem.
///
/// Owns both pipelines and the cache. Hosts call
/// [`create_tile`](Self::create_tile) when the asset browser wants a tile
/// and [`update`](Self::update) once per frame to drive the scene pipeline.
pub struct TilePipeline<S: TileScene> {
    cache: TileCache,
    placeholders: Arc<Placeholders>,
    worker: ImageTileWorker,
    renderer: SceneTileRenderer<S>,
}

impl<S: TileScene> TilePipeline<S> {
    pub fn new(config: &TileConfig, scene: S, source: Arc<dyn AssetSource>) -> Result<Self> {
        let cache = TileCache::new(config.cache_dir.clone());
        let placeholders = Arc::new(Placeholders::generate()?);
        let worker = ImageTileWorker::spawn(cache.clone(), placeholders.clone())?;
        let renderer = SceneTileRenderer::new(
            scene,
            source,
            cache.clone(),
            placeholders.clone(),
            config.scene_queue_capacity,
            config.readback_delay_frames,
        );
        Ok(Self {
            cache,
            placeholders,
            worker,
            renderer,
        })
    }

    /// Ask for a tile for `source_path`.
    ///
    /// Image tiles are queued on the worker thread and scene tiles on the
    /// render queue; both appear later at the cached tile path. Material
    /// and shader tiles are written synchronously to `dest`. Returns
    /// whether the request was accepted; acceptance does not mean the tile
    /// exists yet.
    pub fn create_tile(&mut self, source_path: &SourcePath, dest: &Path, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Texture => {
                self.worker.enqueue(source_path.clone());
                true
            }
            AssetKind::Material | AssetKind::Shader => {
                match self.placeholders.write_for(kind, dest) {
                    Ok(()) => true,
                    Err(err) => {
                        log::error!("tile for {source_path} failed: {err}");
                        false
                    }
                }
            }
            AssetKind::Model | AssetKind::Prefab => {
                self.renderer
                    .request(TileRequest::new(source_path.clone(), kind));
                true
            }
            _ => false,
        }
    }

    /// Request a scene tile rendered from an explicit camera instead of the
    /// computed framing. Used for preview captures.
    pub fn create_tile_with_camera(
        &mut self,
        source_path: &SourcePath,
        camera: TileCamera,
        kind: AssetKind,
    ) -> bool {
        if !kind.is_scene_rendered() {
            return false;
        }
        self.renderer
            .request(TileRequest::with_camera(source_path.clone(), kind, camera));
        true
    }

    /// Queue an image directly on the image worker.
    pub fn enqueue_image(&self, source_path: &SourcePath) {
        self.worker.enqueue(source_path.clone());
    }

    /// Drive the scene pipeline one frame.
    pub fn update(&mut self) {
        self.renderer.update();
    }

    /// True if a tile for `source_path` already exists on disk.
    pub fn has_tile(&self, source_path: &SourcePath) -> bool {
        self.cache.has_tile(source_path)
    }

    /// Path the tile for `source_path` is (or will be) written to.
    pub fn tile_path(&self, source_path: &SourcePath) -> PathBuf {
        self.cache.tile_path_for(source_path)
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn placeholders(&self) -> &Placeholders {
        &self.placeholders
    }

    /// Hand-authored tile file to copy for `kind` instead of the generated
    /// placeholder pattern.
    pub fn set_placeholder_override(&self, kind: AssetKind, file: PathBuf) {
        self.placeholders.set_override(kind, file);
    }

    /// Images queued on the worker and not yet picked up.
    pub fn image_backlog(&self) -> usize {
        self.worker.backlog()
    }

    pub fn renderer(&self) -> &SceneTileRenderer<S> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut SceneTileRenderer<S> {
        &mut self.renderer
    }
}
