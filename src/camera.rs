//! Fixed perspective camera looking at the blob.

use glam::{Mat4, Vec3};

use crate::params::RenderConfig;

/// Stationary camera on the +Z axis, aimed at the origin. Only the aspect
/// ratio changes at runtime, tracking the output surface.
pub struct ViewCamera {
    eye: Vec3,
    fov_degrees: f32,
    near_plane: f32,
    far_plane: f32,
    aspect: f32,
}

impl ViewCamera {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, config.camera_distance),
            fov_degrees: config.fov_degrees,
            near_plane: config.near_plane,
            far_plane: config.far_plane,
            aspect: config.aspect_ratio(),
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Keep the projection in step with the output surface. Must run before
    /// the next render after a resize so no frame sees a mismatched aspect.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, Vec3::ZERO, Vec3::Y)
    }

    pub fn proj_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near_plane,
            self.far_plane,
        )
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj_matrix() * self.view_matrix()
    }
}
