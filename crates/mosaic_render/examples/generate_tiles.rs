//! Generate preview tiles for every supported asset in a directory.
//!
//! Usage: `cargo run --example generate_tiles -- <asset_dir> [cache_dir]`
//!
//! Images go through the worker thread; models and prefabs render in the
//! offscreen scene. A built-in cube stands in for real mesh data, where a
//! host editor would register the geometry its importer produced.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mosaic_asset::{AssetKind, AssetRegistry, SourcePath};
use mosaic_render::{MeshData, OffscreenTileScene};
use mosaic_tiles::{TileConfig, TilePipeline};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let asset_dir = PathBuf::from(args.next().unwrap_or_else(|| "assets".into()));
    let cache_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| TileConfig::default().cache_dir);

    let instance = wgpu::Instance::default();
    let adapter =
        pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .expect("no wgpu adapter available");
    let (device, queue) =
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None))
            .expect("failed to create wgpu device");
    let mut scene = OffscreenTileScene::new(device, queue);

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(&asset_dir).expect("cannot read asset directory") {
        let entry = entry.expect("directory entry");
        if !entry.file_type().expect("file type").is_file() {
            continue;
        }
        let source = SourcePath::new(entry.path());
        let kind = AssetKind::from_path(&source);
        if kind.has_tile_support() {
            sources.push((source, kind));
        }
    }

    let registry = Arc::new(AssetRegistry::new());
    let cube = MeshData::cube();
    let cube_path = SourcePath::new("builtin/cube");
    scene.register_mesh(&cube_path, &cube);
    for (source, kind) in &sources {
        match kind {
            AssetKind::Model => {
                scene.register_mesh(source, &cube);
                registry.resolve(source, cube.bounds());
            }
            AssetKind::Prefab => {
                scene.register_prefab(source, &cube_path);
                registry.resolve(source, cube.bounds());
            }
            _ => {}
        }
    }

    let config = TileConfig {
        cache_dir,
        ..TileConfig::default()
    };
    let mut pipeline =
        TilePipeline::new(&config, scene, registry.clone()).expect("tile pipeline setup");

    let mut requested = 0usize;
    for (source, kind) in &sources {
        let dest = pipeline.tile_path(source);
        if pipeline.create_tile(source, &dest, *kind) {
            requested += 1;
        }
    }

    // Drive the scene pipeline like a frame loop until it drains.
    while !pipeline.renderer().idle() {
        pipeline.update();
        std::thread::sleep(Duration::from_millis(16));
    }
    // Let the image worker pick up everything before dropping it; an
    // in-progress item finishes during the drop join.
    while pipeline.image_backlog() > 0 {
        std::thread::sleep(Duration::from_millis(20));
    }

    let cache = pipeline.cache().clone();
    drop(pipeline);

    let tiles = std::fs::read_dir(cache.dir())
        .map(|entries| entries.count())
        .unwrap_or(0);
    println!(
        "{requested} tile requests -> {tiles} tile files in {}",
        cache.dir().display()
    );
}
