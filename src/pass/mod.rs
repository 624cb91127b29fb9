use wgpu::{Device, Queue, Surface};

use crate::scene::Scene;

pub mod phong;

pub trait Pass {
    fn draw(
        &mut self,
        surface: &Surface,
        device: &Device,
        queue: &Queue,
        scene: &Scene,
    ) -> Result<(), wgpu::SurfaceError>;
}

/// Grow-only set of equally sized uniform buffers, one per draw call
pub struct UniformPool {
    label: &'static str,
    size: u64,
    pub buffers: Vec<wgpu::Buffer>,
}

impl UniformPool {
    pub fn new(label: &'static str, size: u64) -> Self {
        Self {
            label,
            size,
            buffers: Vec::new(),
        }
    }

    /// Makes sure there are at least `count` buffers
    pub fn alloc_buffers(&mut self, count: usize, device: &Device) {
        while self.buffers.len() < count {
            self.buffers.push(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(self.label),
                size: self.size,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
    }

    pub fn update_uniform<T: bytemuck::Pod>(&self, index: usize, data: T, queue: &Queue) {
        if let Some(buffer) = self.buffers.get(index) {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[data]));
        }
    }
}
