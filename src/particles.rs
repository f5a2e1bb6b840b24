//! Static particle cloud surrounding the blob.
//!
//! Positions are generated once at startup; per frame only the cloud's spin
//! angle and color change.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::overlay::hsl_to_rgb;
use crate::params::ParticleParams;

/// Per-instance data for the particle pipeline
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
}

/// Fixed-count cloud of points scattered uniformly in a bounded cube
pub struct ParticleCloud {
    pub instances: Vec<ParticleInstance>,
    params: ParticleParams,
}

impl ParticleCloud {
    pub fn new(params: ParticleParams) -> Self {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let half = params.spread / 2.0;

        let instances = (0..params.count)
            .map(|_| ParticleInstance {
                position: [
                    rng.random_range(-half..half),
                    rng.random_range(-half..half),
                    rng.random_range(-half..half),
                ],
            })
            .collect();

        Self { instances, params }
    }

    pub fn count(&self) -> usize {
        self.instances.len()
    }

    pub fn size(&self) -> f32 {
        self.params.size
    }

    /// Rotation of the whole cloud about the Y axis at a given time.
    pub fn spin_angle(&self, time_s: f32) -> f32 {
        time_s * self.params.spin_rate
    }

    pub fn model_matrix(&self, time_s: f32) -> Mat4 {
        Mat4::from_rotation_y(self.spin_angle(time_s))
    }

    /// Cloud color for the current audio energy: a full-saturation,
    /// half-lightness hue sweep across one turn.
    pub fn color(&self, energy: f32) -> [f32; 3] {
        hsl_to_rgb(energy * 360.0, 1.0, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloud_count_and_bounds() {
        let params = ParticleParams::default();
        let cloud = ParticleCloud::new(params.clone());

        assert_eq!(cloud.count(), params.count);

        let half = params.spread / 2.0;
        for instance in &cloud.instances {
            for component in instance.position {
                assert!(component >= -half && component < half);
            }
        }
    }

    #[test]
    fn test_cloud_is_deterministic_per_seed() {
        let params = ParticleParams::default();
        let first = ParticleCloud::new(params.clone());
        let second = ParticleCloud::new(params.clone());

        for (a, b) in first.instances.iter().zip(&second.instances) {
            assert_eq!(a.position, b.position);
        }

        let reseeded = ParticleCloud::new(ParticleParams {
            seed: params.seed + 1,
            ..params
        });
        assert!(first
            .instances
            .iter()
            .zip(&reseeded.instances)
            .any(|(a, b)| a.position != b.position));
    }

    #[test]
    fn test_spin_angle_is_linear_in_time() {
        let cloud = ParticleCloud::new(ParticleParams::default());

        assert_eq!(cloud.spin_angle(0.0), 0.0);
        assert!((cloud.spin_angle(10.0) - 1.0).abs() < 1e-6);
        assert!((cloud.spin_angle(20.0) - 2.0 * cloud.spin_angle(10.0)).abs() < 1e-6);
    }

    #[test]
    fn test_color_sweeps_hue_with_energy() {
        let cloud = ParticleCloud::new(ParticleParams::default());

        // Zero energy = hue 0 = pure red at half lightness
        let red = cloud.color(0.0);
        assert!((red[0] - 1.0).abs() < 1e-5);
        assert!(red[1].abs() < 1e-5);
        assert!(red[2].abs() < 1e-5);

        // A third of a turn lands on green
        let green = cloud.color(1.0 / 3.0);
        assert!((green[1] - 1.0).abs() < 1e-5);
        assert!(green[0].abs() < 1e-4);
    }
}
