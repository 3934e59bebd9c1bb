//! Offscreen wgpu scene that renders one asset per tile.

use glam::Mat4;
use mosaic_asset::{AssetHandle, AssetKind, SourcePath};
use mosaic_tiles::{InstanceState, TileCamera, TileScene, TILE_SIZE};

use crate::bank::{ContentBank, Resolution};
use crate::mesh::{GpuMesh, MeshData, Vertex};
use crate::readback::TileReadback;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.13,
    g: 0.13,
    b: 0.15,
    a: 1.0,
};

/// Uniforms passed to the tile shader.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

/// Scene-side handle for one instanced asset.
///
/// Meshes stay owned by the scene's content bank, so an instance is only a
/// reference to the content it draws and can outlive nothing.
pub struct SceneInstance {
    content: SourcePath,
}

/// Tile-sized offscreen scene backing the scene tile renderer.
///
/// Hosts register drawable content up front with
/// [`register_mesh`](Self::register_mesh) and
/// [`register_prefab`](Self::register_prefab); the tile renderer then drives
/// the [`TileScene`] methods to produce pixels.
pub struct OffscreenTileScene {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,
    readback: TileReadback,
    bank: ContentBank<GpuMesh>,
}

impl OffscreenTileScene {
    /// Create the scene with its pipeline and tile-sized targets.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Tile Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let uniform_size = std::mem::size_of::<Uniforms>() as u64;
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tile Uniform Buffer"),
            size: uniform_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Tile Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(uniform_size),
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Tile Uniform Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Tile Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Tile Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            offset: 0,
                            shader_location: 0,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        wgpu::VertexAttribute {
                            offset: 12,
                            shader_location: 1,
                            format: wgpu::VertexFormat::Float32x3,
                        },
                        wgpu::VertexAttribute {
                            offset: 24,
                            shader_location: 2,
                            format: wgpu::VertexFormat::Float32x2,
                        },
                    ],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let extent = wgpu::Extent3d {
            width: TILE_SIZE,
            height: TILE_SIZE,
            depth_or_array_layers: 1,
        };
        let color = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tile Color Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tile Depth Target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        let readback = TileReadback::new(&device, TILE_SIZE, TILE_SIZE);

        Self {
            device,
            queue,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            color,
            color_view,
            depth_view,
            readback,
            bank: ContentBank::new(),
        }
    }

    /// Upload a mesh and register it as the drawable for `path`.
    pub fn register_mesh(&mut self, path: &SourcePath, data: &MeshData) {
        let mesh = GpuMesh::upload(&self.device, data);
        self.bank.insert_mesh(path.clone(), mesh, data.bounds());
    }

    /// Register a prefab whose tile shows the model at `content`.
    pub fn register_prefab(&mut self, path: &SourcePath, content: &SourcePath) {
        self.bank.insert_prefab(path.clone(), content.clone());
    }

    /// Mark `path` as content that will never become drawable.
    pub fn mark_failed(&mut self, path: &SourcePath) {
        self.bank.mark_failed(path.clone());
    }

    pub fn bank(&self) -> &ContentBank<GpuMesh> {
        &self.bank
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl TileScene for OffscreenTileScene {
    type Instance = SceneInstance;

    fn instantiate(&mut self, handle: &AssetHandle, kind: AssetKind) -> Option<SceneInstance> {
        let content = self.bank.content_for(handle.path(), kind)?;
        Some(SceneInstance { content })
    }

    fn instance_state(&mut self, instance: &SceneInstance) -> InstanceState {
        match self.bank.resolve(&instance.content) {
            Resolution::Absent => InstanceState::Pending,
            Resolution::Ready { bounds, .. } => InstanceState::Ready { bounds },
            Resolution::Failed => InstanceState::Failed,
        }
    }

    fn render(&mut self, instance: &SceneInstance, camera: &TileCamera) {
        let mesh = match self.bank.resolve(&instance.content) {
            Resolution::Ready { mesh, .. } => mesh,
            _ => {
                log::error!("no drawable content for '{}'", instance.content);
                return;
            }
        };

        let uniforms = Uniforms {
            view_proj: view_projection(camera).to_cols_array_2d(),
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: mesh.color,
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Tile Render Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tile Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn begin_readback(&mut self) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Tile Readback Encoder"),
            });
        self.readback.copy_from(&mut encoder, &self.color);
        self.queue.submit(Some(encoder.finish()));
        self.readback.begin_map();
    }

    fn destroy(&mut self, _instance: SceneInstance) {
        // Meshes are owned by the bank; the instance holds no GPU state.
    }

    fn take_pixels(&mut self) -> Option<Vec<u8>> {
        self.readback.take(&self.device)
    }
}

/// Combined view-projection for a tile camera. Near and far planes scale
/// with the framing distance so both tiny and huge assets stay in range.
fn view_projection(camera: &TileCamera) -> Mat4 {
    let view = Mat4::look_at_rh(camera.eye, camera.target, camera.up);
    let distance = (camera.eye - camera.target).length().max(1e-3);
    let near = (distance * 0.05).max(0.01);
    let far = distance * 4.0 + 10.0;
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 1.0, near, far);
    proj * view
}

const SHADER_SOURCE: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec4<f32>,
}

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = uniforms.view_proj * uniforms.model * vec4<f32>(in.position, 1.0);
    out.normal = (uniforms.model * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light_dir = normalize(vec3<f32>(0.5, 1.0, 0.3));
    let normal = normalize(in.normal);
    let diffuse = max(dot(normal, light_dir), 0.0);
    let ambient = 0.3;
    let lighting = ambient + diffuse * 0.7;
    return vec4<f32>(uniforms.color.rgb * lighting, uniforms.color.a);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};
    use mosaic_asset::Aabb;

    #[test]
    fn uniforms_match_shader_layout() {
        // Two mat4x4 plus one vec4.
        assert_eq!(std::mem::size_of::<Uniforms>(), 64 + 64 + 16);
    }

    #[test]
    fn framed_target_projects_to_screen_center() {
        let bounds = Aabb::new(Vec3::new(-3.0, 1.0, -2.0), Vec3::new(5.0, 4.0, 6.0));
        let camera = TileCamera::framing(&bounds);
        let vp = view_projection(&camera);

        let clip = vp * Vec4::new(camera.target.x, camera.target.y, camera.target.z, 1.0);
        assert!(clip.w > 0.0);
        assert!((clip.x / clip.w).abs() < 1e-4);
        assert!((clip.y / clip.w).abs() < 1e-4);
    }

    #[test]
    fn projection_stays_finite_for_huge_bounds() {
        let bounds = Aabb::new(Vec3::splat(-5_000.0), Vec3::splat(5_000.0));
        let camera = TileCamera::framing(&bounds);
        let vp = view_projection(&camera);

        let corner = bounds.max;
        let clip = vp * Vec4::new(corner.x, corner.y, corner.z, 1.0);
        assert!(clip.is_finite());
        assert!(clip.w > 0.0);
    }
}
