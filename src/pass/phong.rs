use std::{
    collections::{HashMap, HashSet},
    iter, mem,
};

use cgmath::{Matrix, Matrix4, SquareMatrix};
use wgpu::{util::DeviceExt, BindGroupLayout, Device, Queue, Surface};

use crate::{
    camera::{Camera, CameraUniform},
    context::create_render_pipeline,
    model::{self, DrawMesh, GpuMesh, GpuPoints, Material, MeshId, Vertex},
    scene::{NodeKind, Scene},
    texture,
};

use super::{Pass, UniformPool};

// Global uniform data
// aka camera position and ambient light color
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
}

// Local uniform data
// aka the individual mesh's transform and material
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Locals {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
    // metalness, roughness, unused, unused
    pub material: [f32; 4],
}

impl Locals {
    pub fn new(world: Matrix4<f32>, color: [f32; 4], metalness: f32, roughness: f32) -> Self {
        // Normals go through the inverse transpose so non-uniform scales keep them perpendicular
        let normal = world
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(world);
        Self {
            model: world.into(),
            normal: normal.into(),
            color,
            material: [metalness, roughness, 0.0, 0.0],
        }
    }

    pub fn for_material(world: Matrix4<f32>, material: &Material) -> Self {
        Self::new(world, material.color, material.metalness, material.roughness)
    }
}

// Uniform for light data (position + color)
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    pub color: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding2: u32,
}

/// Scene lighting. Colours are linear and already multiplied by intensity.
pub struct PhongConfig {
    pub ambient: [f32; 3],
    /// The directional light shines from here towards the origin
    pub light_position: [f32; 3],
    pub light_color: [f32; 3],
    pub clear_color: wgpu::Color,
}

impl Default for PhongConfig {
    fn default() -> Self {
        let scaled = |rgb: [f32; 3], intensity: f32| rgb.map(|c| c * intensity);
        Self {
            ambient: scaled(model::hex_to_linear(0x404040), 2.0),
            light_position: [5.0, 10.0, 7.5],
            light_color: scaled(model::hex_to_linear(0xffffff), 1.5),
            clear_color: wgpu::Color::BLACK,
        }
    }
}

enum DrawCall {
    Mesh(MeshId),
    Points(MeshId),
}

pub struct PhongPass {
    // Uniforms
    global_uniform_buffer: wgpu::Buffer,
    global_bind_group: wgpu::BindGroup,
    local_bind_group_layout: BindGroupLayout,
    local_bind_groups: Vec<wgpu::BindGroup>,
    uniform_pool: UniformPool,
    globals: Globals,
    // Textures
    depth_texture: texture::Texture,
    // Render pipelines
    mesh_pipeline: wgpu::RenderPipeline,
    points_pipeline: wgpu::RenderPipeline,
    clear_color: wgpu::Color,
    // GPU copies of the scene's geometry
    meshes: HashMap<MeshId, GpuMesh>,
    points: HashMap<MeshId, GpuPoints>,
}

impl PhongPass {
    pub fn new(
        phong_config: &PhongConfig,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
        camera: &Camera,
    ) -> PhongPass {
        // Setup global uniforms
        // Global bind group layout
        let light_size = mem::size_of::<LightUniform>() as wgpu::BufferAddress;
        let global_size = mem::size_of::<Globals>() as wgpu::BufferAddress;
        let global_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("[Phong] Globals"),
                entries: &[
                    // Global uniforms
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(global_size),
                        },
                        count: None,
                    },
                    // Lights
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(light_size),
                        },
                        count: None,
                    },
                ],
            });

        // Global uniform buffer
        let global_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("[Phong] Globals"),
            size: global_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        // Create light uniforms and setup buffer for them
        let light_uniform = LightUniform {
            position: phong_config.light_position,
            _padding: 0,
            color: phong_config.light_color,
            _padding2: 0,
        };
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("[Phong] Lights"),
            contents: bytemuck::cast_slice(&[light_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        // Combine the global uniform and the lights into one bind group
        let global_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("[Phong] Globals"),
            layout: &global_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: global_uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        // Setup local uniforms
        // Local bind group layout
        let local_size = mem::size_of::<Locals>() as wgpu::BufferAddress;
        let local_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("[Phong] Locals"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(local_size),
                    },
                    count: None,
                }],
            });

        // Setup the render pipelines
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("[Phong] Pipeline"),
            bind_group_layouts: &[&global_bind_group_layout, &local_bind_group_layout],
            push_constant_ranges: &[],
        });

        let mesh_pipeline = create_render_pipeline(
            device,
            "[Phong] Mesh Pipeline",
            &pipeline_layout,
            config.format,
            Some(texture::Texture::DEPTH_FORMAT),
            &[model::MeshVertex::desc()],
            wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            wgpu::BlendState::REPLACE,
            true,
            wgpu::ShaderModuleDescriptor {
                label: Some("Mesh Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../shader.wgsl").into()),
            },
        );

        // Stars are translucent and don't hide each other
        let points_pipeline = create_render_pipeline(
            device,
            "[Phong] Points Pipeline",
            &pipeline_layout,
            config.format,
            Some(texture::Texture::DEPTH_FORMAT),
            &[model::PointVertex::desc()],
            wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::PointList,
                cull_mode: None,
                ..Default::default()
            },
            wgpu::BlendState::ALPHA_BLENDING,
            false,
            wgpu::ShaderModuleDescriptor {
                label: Some("Points Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("../points.wgsl").into()),
            },
        );

        // Create depth texture
        let depth_texture =
            texture::Texture::create_depth_texture(device, config, "depth_texture");

        let [r, g, b] = phong_config.ambient;
        let mut pass = PhongPass {
            global_uniform_buffer,
            global_bind_group,
            local_bind_group_layout,
            local_bind_groups: Vec::new(),
            uniform_pool: UniformPool::new("[Phong] Locals", local_size),
            globals: Globals {
                view_position: [0.0; 4],
                view_proj: Matrix4::identity().into(),
                ambient: [r, g, b, 1.0],
            },
            depth_texture,
            mesh_pipeline,
            points_pipeline,
            clear_color: phong_config.clear_color,
            meshes: HashMap::new(),
            points: HashMap::new(),
        };
        pass.update_camera(queue, camera);
        pass
    }

    /// Uploads the camera's current view projection
    pub fn update_camera(&mut self, queue: &Queue, camera: &Camera) {
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(camera);
        self.globals.view_position = camera_uniform.view_position;
        self.globals.view_proj = camera_uniform.view_proj;
        queue.write_buffer(
            &self.global_uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.globals]),
        );
    }

    pub fn resize(&mut self, device: &Device, config: &wgpu::SurfaceConfiguration) {
        self.depth_texture = texture::Texture::create_depth_texture(device, config, "depth_texture");
    }

    /// Uploads geometry new to the scene and drops buffers nothing draws anymore.
    /// Returns the draw calls with their local uniforms.
    fn prepare(&mut self, device: &Device, scene: &Scene) -> Vec<(DrawCall, Locals)> {
        let mut calls = Vec::new();
        let mut live = HashSet::new();

        for item in scene.draw_list() {
            match item.kind {
                NodeKind::Mesh(meshes) => {
                    for mesh in meshes {
                        live.insert(mesh.id);
                        self.meshes
                            .entry(mesh.id)
                            .or_insert_with(|| GpuMesh::new(device, mesh));
                        calls.push((
                            DrawCall::Mesh(mesh.id),
                            Locals::for_material(item.world, &mesh.material),
                        ));
                    }
                }
                NodeKind::Points(cloud) => {
                    live.insert(cloud.id);
                    self.points
                        .entry(cloud.id)
                        .or_insert_with(|| GpuPoints::new(device, cloud));
                    calls.push((
                        DrawCall::Points(cloud.id),
                        Locals::new(item.world, cloud.color, 0.0, 1.0),
                    ));
                }
                NodeKind::Group => {}
            }
        }

        self.meshes.retain(|id, _| live.contains(id));
        self.points.retain(|id, _| live.contains(id));
        calls
    }
}

impl Pass for PhongPass {
    fn draw(
        &mut self,
        surface: &Surface,
        device: &Device,
        queue: &Queue,
        scene: &Scene,
    ) -> Result<(), wgpu::SurfaceError> {
        let calls = self.prepare(device, scene);

        // Allocate buffers for local uniforms
        // and a bind group for each of them
        self.uniform_pool.alloc_buffers(calls.len(), device);
        while self.local_bind_groups.len() < self.uniform_pool.buffers.len() {
            let local_buffer = &self.uniform_pool.buffers[self.local_bind_groups.len()];
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("[Phong] Locals"),
                layout: &self.local_bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: local_buffer.as_entire_binding(),
                }],
            });
            self.local_bind_groups.push(bind_group);
        }
        for (index, (_, locals)) in calls.iter().enumerate() {
            self.uniform_pool.update_uniform(index, *locals, queue);
        }

        let output = surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: true,
                    },
                })],
                // Create a depth stencil buffer using the depth texture
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });
            render_pass.set_bind_group(0, &self.global_bind_group, &[]);

            // Opaque meshes first so the blended points land on top of them
            render_pass.set_pipeline(&self.mesh_pipeline);
            for (index, (call, _)) in calls.iter().enumerate() {
                if let DrawCall::Mesh(id) = call {
                    if let Some(mesh) = self.meshes.get(id) {
                        render_pass.draw_mesh(mesh, &self.local_bind_groups[index]);
                    }
                }
            }

            render_pass.set_pipeline(&self.points_pipeline);
            for (index, (call, _)) in calls.iter().enumerate() {
                if let DrawCall::Points(id) = call {
                    if let Some(points) = self.points.get(id) {
                        render_pass.draw_points(points, &self.local_bind_groups[index]);
                    }
                }
            }
        }

        queue.submit(iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Vector3, Vector4};

    use super::*;

    #[test]
    fn test_locals_layout_matches_shader() {
        // Two mat4x4 and two vec4 in the WGSL struct
        assert_eq!(mem::size_of::<Locals>(), 160);
        assert_eq!(mem::size_of::<Globals>(), 96);
        assert_eq!(mem::size_of::<LightUniform>(), 32);
    }

    #[test]
    fn test_normal_matrix_undoes_stretching() {
        let world = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let locals = Locals::new(world, [1.0; 4], 0.5, 0.5);
        let normal = Matrix4::from(locals.normal) * Vector4::new(1.0, 1.0, 0.0, 0.0);
        assert_eq!(normal, Vector4::new(0.5, 1.0, 0.0, 0.0));
        assert_eq!(locals.material, [0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_normal_matrix_ignores_translation() {
        let world = Matrix4::from_translation(Vector3::new(10.0, 0.0, 0.0));
        let locals = Locals::new(world, [1.0; 4], 0.0, 1.0);
        let normal = Matrix4::from(locals.normal) * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert_eq!(normal.truncate(), Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_default_lighting() {
        let config = PhongConfig::default();
        assert_eq!(config.light_position, [5.0, 10.0, 7.5]);
        assert_eq!(config.light_color, [1.5, 1.5, 1.5]);
        assert!(config.ambient.iter().all(|&c| c > 0.0 && c < 1.0));
        assert_eq!(config.clear_color, wgpu::Color::BLACK);
    }
}
