//! Smoke tests that exercise the offscreen scene on a real device.
//!
//! These need a working wgpu adapter, so they are ignored by default; run
//! them with `cargo test -- --ignored` on a machine with a GPU.

use mosaic_asset::{AssetHandle, AssetKind, SourcePath};
use mosaic_render::{MeshData, OffscreenTileScene};
use mosaic_tiles::{InstanceState, TileCamera, TileScene, TILE_SIZE};

fn create_scene() -> Option<OffscreenTileScene> {
    let instance = wgpu::Instance::default();
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))?;
    let (device, queue) =
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()?;
    Some(OffscreenTileScene::new(device, queue))
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_cube_tile_renders_and_reads_back() {
    let Some(mut scene) = create_scene() else {
        panic!("no wgpu adapter available");
    };

    let path = SourcePath::new("meshes/cube.obj");
    scene.register_mesh(&path, &MeshData::cube().with_color([0.9, 0.4, 0.2, 1.0]));

    let handle = AssetHandle::new(path, AssetKind::Model);
    let instance = scene
        .instantiate(&handle, AssetKind::Model)
        .expect("registered mesh can be instanced");
    let bounds = match scene.instance_state(&instance) {
        InstanceState::Ready { bounds } => bounds,
        other => panic!("cube should be ready, got {other:?}"),
    };

    scene.render(&instance, &TileCamera::framing(&bounds));
    scene.begin_readback();
    scene.destroy(instance);

    let pixels = scene.take_pixels().expect("readback completes");
    assert_eq!(pixels.len(), (TILE_SIZE * TILE_SIZE * 4) as usize);

    // The clear color is dark but not black, and the cube is lit orange;
    // a fully zero image means nothing was rendered.
    assert!(pixels.iter().any(|&b| b != 0));

    // The framed cube covers the tile center.
    let center = ((TILE_SIZE / 2) * TILE_SIZE + TILE_SIZE / 2) as usize * 4;
    let red = pixels[center] as i32;
    let blue = pixels[center + 2] as i32;
    assert!(red > blue, "center pixel should show the orange cube");
}

#[test]
#[ignore = "requires a GPU adapter"]
fn test_take_pixels_without_readback_is_none() {
    let Some(mut scene) = create_scene() else {
        panic!("no wgpu adapter available");
    };
    assert_eq!(scene.take_pixels(), None);
}
