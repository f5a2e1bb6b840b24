//! Pointer-driven rotation of the blob, with ray-cast hit testing.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::blob::MeshOrientation;
use crate::params::InteractionParams;

/// Drag gesture state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// Maps pointer events onto the blob's orientation. Trackball-style:
/// horizontal motion spins about Y, vertical motion about X; no inertia.
pub struct InteractionController {
    state: DragState,
    params: InteractionParams,
}

impl InteractionController {
    pub fn new(params: InteractionParams) -> Self {
        Self {
            state: DragState::Idle,
            params,
        }
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.state == DragState::Dragging
    }

    /// Pointer press: enter Dragging only when the pointer ray hits the
    /// blob. Returns whether a drag is now active.
    pub fn pointer_down(&mut self, hit: bool) -> bool {
        if hit {
            self.state = DragState::Dragging;
        }
        self.is_dragging()
    }

    /// Pointer release always returns to Idle.
    pub fn pointer_up(&mut self) {
        self.state = DragState::Idle;
    }

    /// Pointer motion while dragging accumulates rotation, unbounded.
    pub fn pointer_move(&mut self, delta: Vec2, orientation: &mut MeshOrientation) {
        if !self.is_dragging() {
            return;
        }
        orientation.yaw += delta.x * self.params.drag_sensitivity;
        orientation.pitch += delta.y * self.params.drag_sensitivity;
    }
}

/// Map a pointer position in pixels to normalized device coordinates.
pub fn pointer_ndc(x: f32, y: f32, width: f32, height: f32) -> Vec2 {
    Vec2::new(x / width * 2.0 - 1.0, 1.0 - y / height * 2.0)
}

/// Cast a ray from the camera through a pointer position and test it
/// against the blob's undeformed bounding sphere at the origin.
pub fn pointer_hits_blob(ndc: Vec2, view_proj: Mat4, eye: Vec3, radius: f32) -> bool {
    let inverse = view_proj.inverse();
    let far = inverse * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
    if far.w.abs() < f32::EPSILON {
        return false;
    }

    let target = far.truncate() / far.w;
    let direction = (target - eye).normalize_or_zero();
    ray_hits_sphere(eye, direction, radius)
}

/// Ray/sphere intersection against a sphere centered at the origin. Only
/// hits in front of the ray origin count.
pub fn ray_hits_sphere(origin: Vec3, direction: Vec3, radius: f32) -> bool {
    if direction == Vec3::ZERO {
        return false;
    }

    let b = origin.dot(direction);
    let c = origin.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return false;
    }

    -b - discriminant.sqrt() > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ViewCamera;
    use crate::params::RenderConfig;

    fn test_camera() -> ViewCamera {
        ViewCamera::new(&RenderConfig::default())
    }

    #[test]
    fn test_center_ray_hits_blob() {
        let camera = test_camera();
        let ndc = pointer_ndc(640.0, 360.0, 1280.0, 720.0);

        assert!(ndc.length() < 1e-3);
        assert!(pointer_hits_blob(ndc, camera.view_proj(), camera.eye(), 1.0));
    }

    #[test]
    fn test_corner_ray_misses_blob() {
        let camera = test_camera();

        for corner in [(0.0, 0.0), (1279.0, 0.0), (0.0, 719.0), (1279.0, 719.0)] {
            let ndc = pointer_ndc(corner.0, corner.1, 1280.0, 720.0);
            assert!(!pointer_hits_blob(
                ndc,
                camera.view_proj(),
                camera.eye(),
                1.0
            ));
        }
    }

    #[test]
    fn test_ray_sphere_geometry() {
        let origin = Vec3::new(0.0, 0.0, 5.0);

        // Straight at the center
        assert!(ray_hits_sphere(origin, Vec3::NEG_Z, 1.0));

        // Pointing away
        assert!(!ray_hits_sphere(origin, Vec3::Z, 1.0));

        // Grazing offset
        assert!(!ray_hits_sphere(origin + Vec3::X * 2.0, Vec3::NEG_Z, 1.0));

        // Degenerate direction
        assert!(!ray_hits_sphere(origin, Vec3::ZERO, 1.0));
    }

    #[test]
    fn test_missed_press_never_starts_drag() {
        let mut controller = InteractionController::new(InteractionParams::default());

        assert!(!controller.pointer_down(false));
        assert_eq!(controller.state(), DragState::Idle);

        // Motion while idle leaves the orientation untouched
        let mut orientation = MeshOrientation::default();
        controller.pointer_move(Vec2::new(50.0, -30.0), &mut orientation);
        assert_eq!(orientation.yaw, 0.0);
        assert_eq!(orientation.pitch, 0.0);
    }

    #[test]
    fn test_drag_lifecycle_and_sensitivity() {
        let mut controller = InteractionController::new(InteractionParams::default());
        let mut orientation = MeshOrientation::default();

        assert!(controller.pointer_down(true));
        assert_eq!(controller.state(), DragState::Dragging);

        // X-motion drives yaw, Y-motion drives pitch, at 0.01 per pixel
        controller.pointer_move(Vec2::new(100.0, 0.0), &mut orientation);
        assert!((orientation.yaw - 1.0).abs() < 1e-6);
        assert_eq!(orientation.pitch, 0.0);

        controller.pointer_move(Vec2::new(0.0, -40.0), &mut orientation);
        assert!((orientation.pitch + 0.4).abs() < 1e-6);

        // Release is unconditional
        controller.pointer_up();
        assert_eq!(controller.state(), DragState::Idle);

        // Accumulation is unbounded across drags
        assert!(controller.pointer_down(true));
        for _ in 0..100 {
            controller.pointer_move(Vec2::new(100.0, 0.0), &mut orientation);
        }
        assert!(orientation.yaw > 100.0);
    }
}
