//! Per-frame scene tile renderer for model and prefab assets.

use std::collections::VecDeque;
use std::sync::Arc;

use mosaic_asset::{AssetHandle, AssetKind, AssetSource, CacheKey, SourcePath};

use crate::cache::TileCache;
use crate::codec;
use crate::error::TileError;
use crate::placeholder::Placeholders;
use crate::queue::BoundedQueue;
use crate::scene::{InstanceState, TileCamera, TileScene};

/// One tile request for a scene-rendered asset.
#[derive(Clone, Debug)]
pub struct TileRequest {
    pub path: SourcePath,
    pub kind: AssetKind,
    /// Replaces the computed framing when set. Preview captures use this to
    /// render the tile from the camera the user was looking through.
    pub camera: Option<TileCamera>,
}

impl TileRequest {
    pub fn new(path: SourcePath, kind: AssetKind) -> Self {
        Self {
            path,
            kind,
            camera: None,
        }
    }

    pub fn with_camera(path: SourcePath, kind: AssetKind, camera: TileCamera) -> Self {
        Self {
            path,
            kind,
            camera: Some(camera),
        }
    }
}

struct PendingLoad {
    request: TileRequest,
    handle: AssetHandle,
}

enum JobPhase {
    /// Waiting for instantiated content to become renderable. Prefabs
    /// stream their nested assets here; models pass through immediately.
    AwaitingInstance,
    /// Pixels queued for copy; counts render frames until the copy is safe
    /// to map.
    ReadingBack { frames_left: i32 },
}

struct SceneJob<I> {
    path: SourcePath,
    kind: AssetKind,
    key: CacheKey,
    camera_override: Option<TileCamera>,
    instance: Option<I>,
    phase: JobPhase,
}

/// Cooperative tile renderer.
///
/// Owns a bounded queue of in-flight asset loads, an unbounded overflow
/// list, and at most one render job at a time (the `Option` job slot is the
/// single-job guarantee). All work happens inside [`update`](Self::update);
/// nothing here blocks the calling thread.
pub struct SceneTileRenderer<S: TileScene> {
    scene: S,
    source: Arc<dyn AssetSource>,
    cache: TileCache,
    placeholders: Arc<Placeholders>,
    queue: BoundedQueue<PendingLoad>,
    overflow: VecDeque<TileRequest>,
    job: Option<SceneJob<S::Instance>>,
    readback_delay: i32,
}

impl<S: TileScene> SceneTileRenderer<S> {
    pub fn new(
        scene: S,
        source: Arc<dyn AssetSource>,
        cache: TileCache,
        placeholders: Arc<Placeholders>,
        queue_capacity: usize,
        readback_delay_frames: u32,
    ) -> Self {
        Self {
            scene,
            source,
            cache,
            placeholders,
            queue: BoundedQueue::new(queue_capacity),
            overflow: VecDeque::new(),
            job: None,
            readback_delay: readback_delay_frames as i32,
        }
    }

    /// Accept a request. Issues the asset load immediately when the
    /// in-flight queue has room, otherwise parks the request on the
    /// overflow list. Requests are never refused.
    pub fn request(&mut self, request: TileRequest) {
        if self.queue.is_full() {
            self.overflow.push_back(request);
        } else {
            self.issue_load(request);
        }
    }

    /// Drive the renderer one frame.
    ///
    /// Call once per frame from the thread that owns the offscreen scene.
    pub fn update(&mut self) {
        if self.job.is_some() {
            self.advance_job();
        } else {
            self.dispatch_next();
        }
    }

    /// Loads currently held in the bounded queue.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Requests parked beyond the queue capacity.
    pub fn overflowed(&self) -> usize {
        self.overflow.len()
    }

    /// True while a render job is between instantiation and final encode.
    pub fn has_job(&self) -> bool {
        self.job.is_some()
    }

    /// True once every accepted request has been fully processed.
    pub fn idle(&self) -> bool {
        self.job.is_none() && self.queue.is_empty() && self.overflow.is_empty()
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    fn issue_load(&mut self, request: TileRequest) {
        let handle = self.source.request_load(&request.path, request.kind);
        if let Err(rejected) = self.queue.try_push(PendingLoad { request, handle }) {
            self.overflow.push_front(rejected.request);
        }
    }

    fn advance_job(&mut self) {
        let Some(job) = self.job.as_mut() else { return };
        match &mut job.phase {
            JobPhase::ReadingBack { frames_left } => {
                *frames_left -= 1;
                if *frames_left < 0 {
                    self.finish_job();
                }
            }
            JobPhase::AwaitingInstance => {
                self.poll_instance();
            }
        }
    }

    fn dispatch_next(&mut self) {
        let Some(front) = self.queue.front() else { return };
        if front.handle.is_failed() {
            let err = TileError::AssetLoadFailed(front.request.path.to_string());
            log::error!("skipping tile: {err}");
            self.advance_queue();
            return;
        }
        if !front.handle.is_ready() {
            return;
        }
        let Some(load) = self.queue.pop() else { return };
        if let Some(request) = self.overflow.pop_front() {
            self.issue_load(request);
        }
        self.begin_job(load);
    }

    fn advance_queue(&mut self) {
        self.queue.pop();
        if let Some(request) = self.overflow.pop_front() {
            self.issue_load(request);
        }
    }

    fn begin_job(&mut self, load: PendingLoad) {
        let PendingLoad { request, handle } = load;
        let Some(instance) = self.scene.instantiate(&handle, request.kind) else {
            log::error!("could not instance {} for tile render", request.path);
            return;
        };
        self.job = Some(SceneJob {
            key: request.path.cache_key(),
            kind: request.kind,
            camera_override: request.camera,
            path: request.path,
            instance: Some(instance),
            phase: JobPhase::AwaitingInstance,
        });
        // Models are renderable at once and finish the render this same
        // tick; prefabs usually park in AwaitingInstance.
        self.poll_instance();
    }

    fn poll_instance(&mut self) {
        let Some(job) = self.job.as_mut() else { return };
        let Some(instance) = job.instance.as_ref() else {
            self.job = None;
            return;
        };
        match self.scene.instance_state(instance) {
            InstanceState::Pending => {}
            InstanceState::Failed => {
                let err = TileError::AssetLoadFailed(job.path.to_string());
                log::error!("discarding tile job: {err}");
                if let Some(instance) = job.instance.take() {
                    self.scene.destroy(instance);
                }
                self.job = None;
            }
            InstanceState::Ready { bounds } => {
                let camera = job
                    .camera_override
                    .unwrap_or_else(|| TileCamera::framing(&bounds));
                self.scene.render(instance, &camera);
                self.scene.begin_readback();
                if let Some(instance) = job.instance.take() {
                    self.scene.destroy(instance);
                }
                job.phase = JobPhase::ReadingBack {
                    frames_left: self.readback_delay,
                };
            }
        }
    }

    fn finish_job(&mut self) {
        let Some(job) = self.job.take() else { return };
        let Some(pixels) = self.scene.take_pixels() else {
            log::error!("tile readback produced no pixels for {}", job.path);
            self.write_placeholder(&job);
            return;
        };
        match codec::encode_tile_pixels(pixels) {
            Ok(bytes) => {
                if let Err(err) = self.cache.write(job.key, &bytes) {
                    log::error!("tile write failed for {}: {err}", job.path);
                }
            }
            Err(err) => log::error!("tile encode failed for {}: {err}", job.path),
        }
    }

    fn write_placeholder(&self, job: &SceneJob<S::Instance>) {
        let dest = self.cache.tile_path(job.key);
        if let Err(err) = self.placeholders.write_for(job.kind, &dest) {
            log::error!("placeholder tile write failed for {}: {err}", job.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_asset::{Aabb, AssetRegistry};
    use glam::Vec3;
    use std::collections::HashMap;

    /// Scripted scene: per-path frames to stay pending, plus counters for
    /// the single-instance guarantee.
    #[derive(Default)]
    struct MockScene {
        pending_frames: HashMap<String, u32>,
        fail_paths: Vec<String>,
        fail_readback: bool,
        live: usize,
        max_live: usize,
        renders: usize,
        last_camera: Option<TileCamera>,
        readback_armed: bool,
        next_id: u32,
        paths_by_id: HashMap<u32, String>,
    }

    impl MockScene {
        fn pixels() -> Vec<u8> {
            vec![90; (crate::TILE_SIZE * crate::TILE_SIZE * 4) as usize]
        }
    }

    impl TileScene for MockScene {
        type Instance = u32;

        fn instantiate(&mut self, handle: &AssetHandle, _kind: AssetKind) -> Option<u32> {
            let id = self.next_id;
            self.next_id += 1;
            self.paths_by_id.insert(id, handle.path().as_str().to_string());
            self.live += 1;
            self.max_live = self.max_live.max(self.live);
            Some(id)
        }

        fn instance_state(&mut self, instance: &u32) -> InstanceState {
            let path = self.paths_by_id[instance].clone();
            if self.fail_paths.contains(&path) {
                return InstanceState::Failed;
            }
            if let Some(frames) = self.pending_frames.get_mut(&path) {
                if *frames > 0 {
                    *frames -= 1;
                    return InstanceState::Pending;
                }
            }
            InstanceState::Ready {
                bounds: Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
            }
        }

        fn render(&mut self, _instance: &u32, camera: &TileCamera) {
            self.renders += 1;
            self.last_camera = Some(*camera);
        }

        fn begin_readback(&mut self) {
            self.readback_armed = true;
        }

        fn destroy(&mut self, _instance: u32) {
            self.live -= 1;
        }

        fn take_pixels(&mut self) -> Option<Vec<u8>> {
            if self.fail_readback {
                return None;
            }
            if self.readback_armed {
                self.readback_armed = false;
                Some(Self::pixels())
            } else {
                None
            }
        }
    }

    struct Fixture {
        renderer: SceneTileRenderer<MockScene>,
        registry: Arc<AssetRegistry>,
        _dir: tempfile::TempDir,
    }

    fn fixture(capacity: usize) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = Arc::new(AssetRegistry::new());
        let renderer = SceneTileRenderer::new(
            MockScene::default(),
            registry.clone(),
            TileCache::new(dir.path()),
            Arc::new(Placeholders::generate().expect("placeholders")),
            capacity,
            2,
        );
        Fixture {
            renderer,
            registry,
            _dir: dir,
        }
    }

    fn model_path(i: usize) -> SourcePath {
        SourcePath::new(format!("models/asset_{i}.glb"))
    }

    #[test]
    fn overflow_splits_at_capacity() {
        let mut f = fixture(8);
        for i in 0..10 {
            f.renderer
                .request(TileRequest::new(model_path(i), AssetKind::Model));
        }
        assert_eq!(f.renderer.queued(), 8);
        assert_eq!(f.renderer.overflowed(), 2);
        // Only queued loads were issued against the source.
        assert_eq!(f.registry.pending(), 8);
    }

    #[test]
    fn waits_for_front_load() {
        let mut f = fixture(4);
        f.renderer
            .request(TileRequest::new(model_path(0), AssetKind::Model));
        for _ in 0..5 {
            f.renderer.update();
        }
        assert!(!f.renderer.has_job());
        assert_eq!(f.renderer.queued(), 1);
    }

    #[test]
    fn ready_model_renders_and_writes_tile() {
        let mut f = fixture(4);
        let path = model_path(0);
        f.renderer
            .request(TileRequest::new(path.clone(), AssetKind::Model));
        f.registry
            .resolve(&path, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));

        // Dispatch + render tick, then the readback countdown.
        f.renderer.update();
        assert!(f.renderer.has_job());
        assert_eq!(f.renderer.scene().renders, 1);
        f.renderer.update();
        f.renderer.update();
        f.renderer.update();

        assert!(f.renderer.idle());
        let tile = f.renderer.cache.tile_path_for(&path);
        assert!(tile.is_file());
        let decoded =
            codec::decode_tile_container(&std::fs::read(tile).expect("read tile")).expect("dds");
        assert_eq!(decoded.dimensions(), (crate::TILE_SIZE, crate::TILE_SIZE));

        // No override on the request: framing from the instance bounds.
        let expected = TileCamera::framing(&Aabb::new(Vec3::splat(-1.0), Vec3::ONE));
        assert_eq!(f.renderer.scene().last_camera, Some(expected));
    }

    #[test]
    fn failed_load_is_skipped_without_tile() {
        let mut f = fixture(4);
        let bad = model_path(0);
        let good = model_path(1);
        f.renderer
            .request(TileRequest::new(bad.clone(), AssetKind::Model));
        f.renderer
            .request(TileRequest::new(good.clone(), AssetKind::Model));
        f.registry.fail(&bad);
        f.registry
            .resolve(&good, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));

        for _ in 0..8 {
            f.renderer.update();
        }

        assert!(f.renderer.idle());
        assert!(!f.renderer.cache.has_tile(&bad));
        assert!(f.renderer.cache.has_tile(&good));
    }

    #[test]
    fn prefab_waits_for_nested_content() {
        let mut f = fixture(4);
        let path = SourcePath::new("prefabs/lamp.fab");
        f.renderer.scene_mut().pending_frames.insert(
            path.as_str().to_string(),
            3,
        );
        f.renderer
            .request(TileRequest::new(path.clone(), AssetKind::Prefab));
        f.registry
            .resolve(&path, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));

        // Instantiates, then stays pending for three polls.
        f.renderer.update();
        assert!(f.renderer.has_job());
        assert_eq!(f.renderer.scene().renders, 0);
        f.renderer.update();
        f.renderer.update();
        assert_eq!(f.renderer.scene().renders, 0);

        // Ready now: render, then countdown.
        f.renderer.update();
        assert_eq!(f.renderer.scene().renders, 1);
        f.renderer.update();
        f.renderer.update();
        f.renderer.update();
        assert!(f.renderer.idle());
        assert!(f.renderer.cache.has_tile(&path));
    }

    #[test]
    fn failed_nested_content_releases_the_job() {
        let mut f = fixture(4);
        let path = SourcePath::new("prefabs/broken.fab");
        f.renderer
            .scene_mut()
            .fail_paths
            .push(path.as_str().to_string());
        f.renderer
            .request(TileRequest::new(path.clone(), AssetKind::Prefab));
        f.registry
            .resolve(&path, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));

        f.renderer.update();
        assert!(!f.renderer.has_job());
        assert!(f.renderer.idle());
        assert_eq!(f.renderer.scene().live, 0);
    }

    #[test]
    fn readback_failure_degrades_to_placeholder() {
        let mut f = fixture(4);
        f.renderer.scene_mut().fail_readback = true;
        let path = model_path(0);
        f.renderer
            .request(TileRequest::new(path.clone(), AssetKind::Model));
        f.registry
            .resolve(&path, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));

        for _ in 0..6 {
            f.renderer.update();
        }

        assert!(f.renderer.idle());
        let written =
            std::fs::read(f.renderer.cache.tile_path_for(&path)).expect("read tile");
        assert_eq!(written, f.renderer.placeholders.bytes_for(AssetKind::Model));
    }

    #[test]
    fn at_most_one_instance_alive() {
        let mut f = fixture(8);
        for i in 0..10 {
            let path = model_path(i);
            f.renderer
                .request(TileRequest::new(path.clone(), AssetKind::Model));
            f.registry
                .resolve(&path, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));
        }
        for _ in 0..100 {
            f.renderer.update();
        }
        assert!(f.renderer.idle());
        assert_eq!(f.renderer.scene().max_live, 1);
        assert_eq!(f.renderer.scene().renders, 10);
        for i in 0..10 {
            assert!(f.renderer.cache.has_tile(&model_path(i)));
        }
    }

    #[test]
    fn overflow_refills_as_jobs_complete() {
        let mut f = fixture(2);
        for i in 0..5 {
            let path = model_path(i);
            f.renderer
                .request(TileRequest::new(path.clone(), AssetKind::Model));
            f.registry
                .resolve(&path, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));
        }
        assert_eq!(f.renderer.queued(), 2);
        assert_eq!(f.renderer.overflowed(), 3);

        for _ in 0..60 {
            f.renderer.update();
        }
        assert!(f.renderer.idle());
        for i in 0..5 {
            assert!(f.renderer.cache.has_tile(&model_path(i)));
        }
    }

    #[test]
    fn camera_override_replaces_framing() {
        let mut f = fixture(4);
        let path = model_path(0);
        let camera = TileCamera {
            eye: Vec3::new(5.0, 5.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
        };
        f.renderer
            .request(TileRequest::with_camera(path.clone(), AssetKind::Model, camera));
        f.registry
            .resolve(&path, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));
        for _ in 0..6 {
            f.renderer.update();
        }
        assert!(f.renderer.cache.has_tile(&path));
        // Rendered through the supplied camera, not the computed framing.
        assert_eq!(f.renderer.scene().last_camera, Some(camera));
    }

    #[test]
    fn repeat_requests_refresh_the_same_file() {
        let mut f = fixture(4);
        let path = model_path(0);
        f.registry
            .resolve(&path, Aabb::new(Vec3::splat(-1.0), Vec3::ONE));

        for _ in 0..2 {
            f.renderer
                .request(TileRequest::new(path.clone(), AssetKind::Model));
            for _ in 0..6 {
                f.renderer.update();
            }
        }
        assert!(f.renderer.idle());
        assert_eq!(f.renderer.scene().renders, 2);
        let dir_entries = std::fs::read_dir(f.renderer.cache.dir())
            .expect("read cache dir")
            .count();
        assert_eq!(dir_entries, 1);
    }
}
