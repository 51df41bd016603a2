use crate::shaders;
use bytemuck::{Pod, Zeroable};
use lanescape_assets::{AssetStore, MeshData, MeshId};
use lanescape_common::Category;
use lanescape_render::RenderView;
use lanescape_world::{AtmosphereConfig, World};
use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::ops::Range;
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    camera_position: [f32; 4],
    fog: [f32; 4],
    sky: [f32; 4],
    ground: [f32; 4],
}

impl Uniforms {
    fn new(view: &RenderView, atmosphere: &AtmosphereConfig) -> Self {
        let rgb = |c: lanescape_common::Color, w: f32| {
            let [r, g, b, _] = c.to_linear();
            [r, g, b, w]
        };
        Self {
            view_proj: view.camera.view_projection().to_cols_array_2d(),
            camera_position: view.camera.position.extend(1.0).to_array(),
            fog: rgb(atmosphere.fog_color, atmosphere.fog_density),
            sky: rgb(atmosphere.sky_color, atmosphere.light_intensity),
            ground: rgb(atmosphere.ground_color, atmosphere.exposure),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Vertex {
    position: [f32; 3],
    normal: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
    color: [f32; 4],
    params: [f32; 4],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// A contiguous run of instances in the instance buffer sharing one mesh.
#[derive(Debug, Clone, PartialEq)]
struct Batch {
    mesh: MeshId,
    instances: Range<u32>,
}

/// Gather every world instance into mesh-sorted batches.
///
/// Categories that share a mesh land in the same batch. Categories with no
/// bound mesh are skipped.
fn build_instances(
    world: &World,
    bindings: &BTreeMap<Category, MeshId>,
) -> (Vec<InstanceData>, Vec<Batch>) {
    let mut by_mesh: BTreeMap<MeshId, Vec<InstanceData>> = BTreeMap::new();
    for (category, transform) in world.instances() {
        let Some(&mesh) = bindings.get(&category) else {
            continue;
        };
        let material = world.material(category);
        let cols = transform.matrix().to_cols_array_2d();
        by_mesh.entry(mesh).or_default().push(InstanceData {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color: material.color.to_linear(),
            params: [if material.lit { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        });
    }

    let mut instances = Vec::with_capacity(world.instance_count());
    let mut batches = Vec::with_capacity(by_mesh.len());
    for (mesh, group) in by_mesh {
        let start = instances.len() as u32;
        instances.extend(group);
        batches.push(Batch {
            mesh,
            instances: start..instances.len() as u32,
        });
    }
    (instances, batches)
}

fn upload_mesh(device: &wgpu::Device, mesh: &MeshData) -> GpuMesh {
    let vertices: Vec<Vertex> = mesh
        .positions
        .iter()
        .zip(&mesh.normals)
        .map(|(&position, &normal)| Vertex { position, normal })
        .collect();
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{}_vertex_buffer", mesh.name)),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{}_index_buffer", mesh.name)),
        contents: bytemuck::cast_slice(&mesh.indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
    }
}

/// wgpu renderer for the road scene.
///
/// Draws every viewport inside a single render pass. Each viewport reads its
/// own slot of the uniform buffer through a dynamic offset.
pub struct WgpuRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    meshes: BTreeMap<MeshId, GpuMesh>,
    bindings: BTreeMap<Category, MeshId>,
    instance_buffer: wgpu::Buffer,
    instance_capacity: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    size: (u32, u32),
    atmosphere: AtmosphereConfig,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        assets: &AssetStore,
        atmosphere: AtmosphereConfig,
    ) -> Self {
        let uniform_size = std::mem::size_of::<Uniforms>() as u64;
        let uniform_stride = wgpu::util::align_to(
            uniform_size,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform_buffer"),
            size: uniform_stride * 3,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(uniform_size),
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(uniform_size),
                }),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SCENE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![
                            0 => Float32x3,
                            1 => Float32x3,
                        ],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<InstanceData>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &wgpu::vertex_attr_array![
                            2 => Float32x4,
                            3 => Float32x4,
                            4 => Float32x4,
                            5 => Float32x4,
                            6 => Float32x4,
                            7 => Float32x4,
                        ],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                // Planes are seen from both sides and the left terrain is mirrored
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let meshes: BTreeMap<MeshId, GpuMesh> = assets
            .meshes()
            .map(|(id, mesh)| (id, upload_mesh(device, mesh)))
            .collect();
        tracing::info!(meshes = meshes.len(), "uploaded scene meshes");

        let instance_capacity = 4_096u32;
        let instance_buffer = Self::create_instance_buffer(device, instance_capacity);
        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            meshes,
            bindings: assets.bindings().clone(),
            instance_buffer,
            instance_capacity,
            depth_texture,
            surface_format,
            size: (width, height),
            atmosphere,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.size = (width, height);
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame: clear once, then draw the scene through each view.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        world: &World,
        views: &[RenderView],
    ) {
        let _span = tracing::debug_span!("render", views = views.len()).entered();

        for (slot, view) in views.iter().take(3).enumerate() {
            queue.write_buffer(
                &self.uniform_buffer,
                slot as u64 * self.uniform_stride,
                bytemuck::bytes_of(&Uniforms::new(view, &self.atmosphere)),
            );
        }

        let (instances, batches) = build_instances(world, &self.bindings);
        if instances.len() as u32 > self.instance_capacity {
            self.instance_capacity = (instances.len() as u32).next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.instance_capacity);
            tracing::debug!(capacity = self.instance_capacity, "grew instance buffer");
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let [r, g, b, _] = self.atmosphere.clear_color.to_linear_f64();
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            let (width, height) = self.size;
            for (slot, view) in views.iter().take(3).enumerate() {
                let Some((sx, sy, sw, sh)) = view.viewport.scissor(width, height) else {
                    continue;
                };
                let v = &view.viewport;
                pass.set_viewport(v.x, v.y, v.width, v.height, 0.0, 1.0);
                pass.set_scissor_rect(sx, sy, sw, sh);
                let offset = (slot as u64 * self.uniform_stride) as u32;
                pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);

                for batch in &batches {
                    let Some(mesh) = self.meshes.get(&batch.mesh) else {
                        continue;
                    };
                    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, batch.instances.clone());
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: capacity as u64 * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanescape_render::{CameraRig, frame_views};
    use lanescape_world::{SceneConfig, scene_meshes};
    use std::path::Path;

    fn scene() -> (World, AssetStore) {
        let config = SceneConfig::default();
        let assets = scene_meshes(&config, Path::new("/nonexistent/assets"));
        (World::build(config).unwrap(), assets)
    }

    #[test]
    fn gpu_structs_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<Uniforms>(), 128);
        assert_eq!(std::mem::size_of::<InstanceData>() % 16, 0);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn batches_cover_every_instance_once() {
        let (world, assets) = scene();
        let (instances, batches) = build_instances(&world, assets.bindings());
        assert_eq!(instances.len(), world.instance_count());
        assert_eq!(batches.len(), assets.len());

        let mut next = 0;
        for batch in &batches {
            assert_eq!(batch.instances.start, next);
            assert!(batch.instances.end > batch.instances.start);
            next = batch.instances.end;
        }
        assert_eq!(next as usize, instances.len());
    }

    #[test]
    fn shared_meshes_share_a_batch() {
        let (world, assets) = scene();
        let (_, batches) = build_instances(&world, assets.bindings());
        let lines = assets.mesh_for(Category::CenterLine).unwrap();
        let batch = batches.iter().find(|b| b.mesh == lines).unwrap();
        let centre = world.train(Category::CenterLine).unwrap().len();
        let barrier = world.train(Category::BarrierLine).unwrap().len();
        assert_eq!(batch.instances.len(), centre + barrier);
    }

    #[test]
    fn unbound_categories_are_skipped() {
        let (world, assets) = scene();
        let mut bindings = assets.bindings().clone();
        bindings.remove(&Category::Rider);
        let (instances, _) = build_instances(&world, &bindings);
        assert_eq!(instances.len(), world.instance_count() - 1);
    }

    #[test]
    fn unlit_lines_carry_flag() {
        let (world, assets) = scene();
        let (instances, batches) = build_instances(&world, assets.bindings());
        let lines = assets.mesh_for(Category::CenterLine).unwrap();
        let batch = batches.iter().find(|b| b.mesh == lines).unwrap();
        let first = &instances[batch.instances.start as usize];
        assert_eq!(first.params[0], 0.0);
        let road = assets.mesh_for(Category::RoadTile).unwrap();
        let batch = batches.iter().find(|b| b.mesh == road).unwrap();
        assert_eq!(instances[batch.instances.start as usize].params[0], 1.0);
    }

    #[test]
    fn uniforms_pack_atmosphere() {
        let rig = CameraRig::new();
        let views = frame_views(&rig, 1280, 720);
        let atmosphere = AtmosphereConfig::default();
        let u = Uniforms::new(&views[1], &atmosphere);
        assert_eq!(u.fog[3], 0.2);
        assert_eq!(u.sky[3], 5.0);
        assert_eq!(u.ground[3], 0.8);
        assert_eq!(&u.camera_position[..3], &views[1].camera.position.to_array());
    }
}
