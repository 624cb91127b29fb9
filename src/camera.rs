use cgmath::{prelude::*, Point3, Vector2, Vector4};

use crate::{config::SceneConfig, ray::Ray};

// cgmath builds OpenGL style clip space (z in -1..1), wgpu expects 0..1
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

pub struct Camera {
    pub eye: cgmath::Point3<f32>,
    pub target: cgmath::Point3<f32>,
    pub up: cgmath::Vector3<f32>,
    pub aspect: f32,
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    /// Perspective camera at the configured eye, looking at `target`
    pub fn new(config: &SceneConfig, target: Point3<f32>, width: u32, height: u32) -> Self {
        let mut camera = Self {
            eye: config.eye,
            target,
            up: cgmath::Vector3::unit_y(),
            aspect: 1.0,
            fovy: config.fovy,
            znear: config.znear,
            zfar: config.zfar,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// Keeps the aspect ratio in sync with the output size, zero sizes are ignored
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// View projection in OpenGL clip space
    fn view_projection(&self) -> cgmath::Matrix4<f32> {
        let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
        let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
        proj * view
    }

    pub fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * self.view_projection()
    }

    /// Ray from the eye through a point given in normalized device coordinates
    pub fn ray_through(&self, ndc: Vector2<f32>) -> Ray {
        let direction = self
            .view_projection()
            .invert()
            .map(|inverse| {
                let p = inverse * Vector4::new(ndc.x, ndc.y, 0.5, 1.0);
                Point3::from_homogeneous(p) - self.eye
            })
            .unwrap_or_else(|| self.target - self.eye);
        Ray::new(self.eye, direction)
    }

    /// Normalized device coordinates of a world point (x, y only)
    pub fn project(&self, point: Point3<f32>) -> Vector2<f32> {
        let clip = self.view_projection() * point.to_homogeneous();
        Vector2::new(clip.x / clip.w, clip.y / clip.w)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        // We're using Vector4 because ofthe camera_uniform 16 byte spacing requirement
        self.view_position = camera.eye.to_homogeneous().into();
        self.view_proj = camera.build_view_projection_matrix().into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(&SceneConfig::default(), Point3::new(0.0, 0.0, 0.0), 800, 600)
    }

    #[test]
    fn test_aspect_follows_viewport() {
        let mut camera = camera();
        assert!((camera.aspect - 800.0 / 600.0).abs() < 1e-6);
        camera.set_viewport(1920, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
        camera.set_viewport(0, 1080);
        assert!((camera.aspect - 1920.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let camera = camera();
        let ray = camera.ray_through(Vector2::new(0.0, 0.0));
        let expected = (camera.target - camera.eye).normalize();
        assert!((ray.direction - expected).magnitude() < 1e-4);
        assert_eq!(ray.origin, camera.eye);
    }

    #[test]
    fn test_ray_through_projected_point() {
        let camera = camera();
        let point = Point3::new(10.0, 0.75, 0.0);
        let ray = camera.ray_through(camera.project(point));
        let expected = (point - camera.eye).normalize();
        assert!((ray.direction - expected).magnitude() < 1e-4);
    }
}
