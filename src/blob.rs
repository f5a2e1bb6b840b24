//! Deformable blob surface: sphere mesh, orientation, and the CPU side of
//! the deformation model.
//!
//! The displacement itself runs per-vertex in `shader.wgsl`; this module
//! generates the base mesh, maps audio energy to the shader's amplitude
//! uniform, and mirrors the shader formulas for deterministic testing.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use noise::{NoiseFn, Perlin};
use std::f32::consts::{PI, TAU};

use crate::params::{BlobGeometry, DeformationParams};

/// Base surface color with zero audio energy (keep in sync with shader.wgsl)
pub const BASE_COLOR: [f32; 3] = [0.1, 0.4, 0.8];
/// Surface color blended in as energy rises (keep in sync with shader.wgsl)
pub const ACCENT_COLOR: [f32; 3] = [0.8, 0.1, 0.5];
/// Fraction of the rim term blended toward white (keep in sync with shader.wgsl)
pub const RIM_STRENGTH: f32 = 0.5;

/// Vertex data for the blob mesh (position + outward normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Unit-sphere mesh subdivided into rings and sectors
pub struct SphereMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn new(geometry: &BlobGeometry) -> Self {
        let segments = geometry.segments;
        let mut vertices = Vec::with_capacity((segments + 1) * (segments + 1));
        let mut indices = Vec::with_capacity(segments * segments * 6);

        for ring in 0..=segments {
            let theta = ring as f32 / segments as f32 * PI;
            for sector in 0..=segments {
                let phi = sector as f32 / segments as f32 * TAU;
                let direction = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                );

                vertices.push(Vertex {
                    position: (direction * geometry.radius).to_array(),
                    normal: direction.to_array(),
                });
            }
        }

        // Triangle indices (counter-clockwise winding, viewed from outside)
        let stride = (segments + 1) as u32;
        for ring in 0..segments as u32 {
            for sector in 0..segments as u32 {
                let a = ring * stride + sector;
                let b = a + 1;
                let c = a + stride;
                let d = c + 1;

                indices.extend_from_slice(&[a, b, c, b, d, c]);
            }
        }

        Self { vertices, indices }
    }
}

/// Orientation of the blob, driven only by pointer drags. Angles accumulate
/// without clamping; rendering wraps them naturally.
#[derive(Clone, Copy, Debug, Default)]
pub struct MeshOrientation {
    /// Rotation about the X axis (radians)
    pub pitch: f32,
    /// Rotation about the Y axis (radians)
    pub yaw: f32,
}

impl MeshOrientation {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.pitch) * Mat4::from_rotation_y(self.yaw)
    }
}

/// Blob surface system: owns the mesh and the deformation parameters, and
/// turns per-frame audio energy into shader uniform values.
pub struct BlobSystem {
    pub mesh: SphereMesh,
    pub orientation: MeshOrientation,
    params: DeformationParams,
    radius: f32,
    perlin: Perlin,
}

impl BlobSystem {
    pub fn new(geometry: &BlobGeometry, params: DeformationParams) -> Self {
        let mesh = SphereMesh::new(geometry);
        let perlin = Perlin::new(params.noise_seed);
        Self {
            mesh,
            orientation: MeshOrientation::default(),
            params,
            radius: geometry.radius,
            perlin,
        }
    }

    /// Undeformed sphere radius (hit testing targets this surface)
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Displacement amplitude for a given audio energy. Shipped to the GPU
    /// as a uniform each frame.
    pub fn amplitude_for(&self, energy: f32) -> f32 {
        self.params.base_amplitude + energy * self.params.energy_amplitude_scale
    }

    /// Vertical offset applied to the whole surface at a given time.
    pub fn bounce_offset(&self, time_s: f32) -> f32 {
        (time_s * self.params.bounce_rate).sin() * self.params.bounce_amplitude
    }

    /// CPU mirror of the shader displacement: deterministic gradient noise
    /// sampled at `position * frequency + time`, scaled by the amplitude.
    pub fn displacement_at(&self, position: Vec3, time_s: f32, energy: f32) -> f32 {
        let p = position * self.params.noise_frequency + Vec3::splat(time_s);
        let noise_value = self.perlin.get([f64::from(p.x), f64::from(p.y), f64::from(p.z)]) as f32;
        noise_value * self.amplitude_for(energy)
    }

    /// CPU mirror of the fragment shading: energy-keyed blend between the
    /// two base colors plus a view-axis rim term toward white.
    pub fn surface_color(&self, normal: Vec3, energy: f32) -> Vec3 {
        let base = Vec3::from_array(BASE_COLOR);
        let accent = Vec3::from_array(ACCENT_COLOR);
        let color = base.lerp(accent, energy);

        let rim = (1.0 - normal.dot(Vec3::Z)).max(0.0).powi(2);
        color.lerp(Vec3::ONE, rim * RIM_STRENGTH)
    }
}
