use std::sync::atomic::{AtomicU64, Ordering};

use cgmath::Vector3;
use wgpu::util::DeviceExt;

pub trait Vertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex for MeshVertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Vertex of the point cloud, the colour lives in the local uniforms
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
}

impl Vertex for PointVertex {
    fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Identifies CPU geometry so the renderer can cache its GPU buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        MeshId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Physically-lit surface parameters (base colour is linear RGBA)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
}

impl Material {
    /// Builds a material from an sRGB hex colour like `0x0000ff`
    pub fn standard(hex: u32, metalness: f32, roughness: f32) -> Self {
        let [r, g, b] = hex_to_linear(hex);
        Self {
            color: [r, g, b, 1.0],
            metalness,
            roughness,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0, 1.0],
            metalness: 1.0,
            roughness: 1.0,
        }
    }
}

/// sRGB hex colour like `0x404040` to linear RGB
pub fn hex_to_linear(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Indexed triangle geometry with its material
#[derive(Debug)]
pub struct Mesh {
    pub id: MeshId,
    pub name: String,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub material: Material,
}

impl Mesh {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<MeshVertex>,
        indices: Vec<u32>,
        material: Material,
    ) -> Self {
        Self {
            id: MeshId::next(),
            name: name.into(),
            vertices,
            indices,
            material,
        }
    }

    /// Local-space triangles, skipping any that reference missing vertices
    pub fn triangles(&self) -> impl Iterator<Item = [Vector3<f32>; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(move |tri| {
            let a = self.vertices.get(tri[0] as usize)?;
            let b = self.vertices.get(tri[1] as usize)?;
            let c = self.vertices.get(tri[2] as usize)?;
            Some([a.position.into(), b.position.into(), c.position.into()])
        })
    }
}

/// Unlit cloud of equally coloured points
#[derive(Debug)]
pub struct PointCloud {
    pub id: MeshId,
    pub points: Vec<PointVertex>,
    pub color: [f32; 4],
}

impl PointCloud {
    pub fn new(points: Vec<PointVertex>, color: [f32; 4]) -> Self {
        Self {
            id: MeshId::next(),
            points,
            color,
        }
    }
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    num_elements: u32,
}

impl GpuMesh {
    pub fn new(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            num_elements: mesh.indices.len() as u32,
        }
    }
}

pub struct GpuPoints {
    pub vertex_buffer: wgpu::Buffer,
    num_vertices: u32,
}

impl GpuPoints {
    pub fn new(device: &wgpu::Device, cloud: &PointCloud) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Cloud Vertex Buffer"),
            contents: bytemuck::cast_slice(&cloud.points),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            vertex_buffer,
            num_vertices: cloud.points.len() as u32,
        }
    }
}

pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a GpuMesh, locals: &'a wgpu::BindGroup);
    fn draw_points(&mut self, points: &'a GpuPoints, locals: &'a wgpu::BindGroup);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b GpuMesh, locals: &'b wgpu::BindGroup) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(1, locals, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_points(&mut self, points: &'b GpuPoints, locals: &'b wgpu::BindGroup) {
        self.set_vertex_buffer(0, points.vertex_buffer.slice(..));
        self.set_bind_group(1, locals, &[]);
        self.draw(0..points.num_vertices, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_material_pure_channels() {
        let blue = Material::standard(0x0000ff, 0.3, 0.7);
        assert_eq!(blue.color, [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(blue.metalness, 0.3);
        assert_eq!(blue.roughness, 0.7);
    }

    #[test]
    fn test_mesh_ids_are_unique() {
        let a = Mesh::new("a", Vec::new(), Vec::new(), Material::default());
        let b = Mesh::new("b", Vec::new(), Vec::new(), Material::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_triangles_skip_out_of_range_indices() {
        let v = |x: f32| MeshVertex {
            position: [x, 0.0, 0.0],
            normal: [0.0, 1.0, 0.0],
        };
        let mesh = Mesh::new(
            "tri",
            vec![v(0.0), v(1.0), v(2.0)],
            vec![0, 1, 2, 0, 1, 9],
            Material::default(),
        );
        assert_eq!(mesh.triangles().count(), 1);
    }
}
