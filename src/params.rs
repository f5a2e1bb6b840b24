//! Parameter definitions with documented semantics.
//!
//! All magic numbers live here with:
//! - Units (seconds, Hz, dB, radians, world units)
//! - Documented ranges and meanings
//! - Defaults carrying the canonical values

/// Blob mesh geometry parameters
#[derive(Debug, Clone)]
pub struct BlobGeometry {
    /// Sphere radius in world units
    pub radius: f32,

    /// Subdivision count, used for both rings and sectors
    /// (64 = 4,225 vertices)
    pub segments: usize,
}

impl Default for BlobGeometry {
    fn default() -> Self {
        Self {
            radius: 1.0,
            segments: 64,
        }
    }
}

/// Surface deformation parameters
///
/// The displacement formula is `noise(position * frequency + time) * amplitude`
/// with `amplitude = base_amplitude + energy * energy_amplitude_scale`.
#[derive(Debug, Clone)]
pub struct DeformationParams {
    /// Spatial noise frequency (cycles per world unit)
    pub noise_frequency: f32,

    /// Displacement amplitude with zero audio energy (world units)
    pub base_amplitude: f32,

    /// Extra displacement per unit of audio energy (world units)
    pub energy_amplitude_scale: f32,

    /// Vertical bounce angular rate (radians per second)
    pub bounce_rate: f32,

    /// Vertical bounce amplitude (world units)
    pub bounce_amplitude: f32,

    /// Seed for the CPU-side noise generator
    pub noise_seed: u32,
}

impl Default for DeformationParams {
    fn default() -> Self {
        Self {
            noise_frequency: 2.0,
            base_amplitude: 0.2,
            energy_amplitude_scale: 0.3,
            bounce_rate: 3.0,
            bounce_amplitude: 0.1,
            noise_seed: 42,
        }
    }
}

/// Background particle cloud parameters
#[derive(Debug, Clone)]
pub struct ParticleParams {
    /// Number of particles
    pub count: usize,

    /// Edge length of the cube the particles are scattered in (world units)
    pub spread: f32,

    /// Billboard size of one particle (world units)
    pub size: f32,

    /// Cloud rotation rate about the Y axis (radians per second)
    pub spin_rate: f32,

    /// Scatter RNG seed
    pub seed: u64,
}

impl Default for ParticleParams {
    fn default() -> Self {
        Self {
            count: 1000,
            spread: 10.0,
            size: 0.05,
            spin_rate: 0.1,
            seed: 7,
        }
    }
}

/// Frequency analysis configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// FFT window size in samples (must be a power of 2)
    pub fft_size: usize,

    /// Analysis thread wake interval (milliseconds)
    pub update_interval_ms: u64,

    /// Exponential smoothing factor applied to linear magnitudes, in [0, 1).
    /// 0 = no smoothing, values near 1 = slow decay.
    pub smoothing_time_constant: f32,

    /// Magnitude mapped to byte 0 (decibels)
    pub min_db: f32,

    /// Magnitude mapped to byte 255 (decibels)
    pub max_db: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            update_interval_ms: 16,
            smoothing_time_constant: 0.8,
            min_db: -100.0,
            max_db: -30.0,
        }
    }
}

impl AnalysisConfig {
    /// Number of usable frequency bins (half the FFT window)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() {
            return Err(format!(
                "FFT size must be power of 2, got {}",
                self.fft_size
            ));
        }
        if self.fft_size < 2 {
            return Err("FFT size must be >= 2".to_string());
        }
        if !(0.0..1.0).contains(&self.smoothing_time_constant) {
            return Err(format!(
                "Smoothing time constant must be in [0, 1), got {}",
                self.smoothing_time_constant
            ));
        }
        if self.min_db >= self.max_db {
            return Err(format!(
                "dB range must be increasing, got [{}, {}]",
                self.min_db, self.max_db
            ));
        }
        Ok(())
    }
}

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Camera distance from the origin along +Z (world units)
    pub camera_distance: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 75.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            camera_distance: 5.0,
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height as f32
    }
}

/// Pointer interaction parameters
#[derive(Debug, Clone)]
pub struct InteractionParams {
    /// Rotation per pixel of pointer motion (radians per pixel)
    pub drag_sensitivity: f32,
}

impl Default for InteractionParams {
    fn default() -> Self {
        Self {
            drag_sensitivity: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_config_bin_count() {
        let config = AnalysisConfig::default();
        assert_eq!(config.bin_count(), 128);

        let config = AnalysisConfig {
            fft_size: 1024,
            ..AnalysisConfig::default()
        };
        assert_eq!(config.bin_count(), 512);
    }

    #[test]
    fn test_analysis_config_validation() {
        assert!(AnalysisConfig::default().validate().is_ok());

        let bad_size = AnalysisConfig {
            fft_size: 300,
            ..AnalysisConfig::default()
        };
        assert!(bad_size.validate().is_err());

        let bad_smoothing = AnalysisConfig {
            smoothing_time_constant: 1.0,
            ..AnalysisConfig::default()
        };
        assert!(bad_smoothing.validate().is_err());

        let bad_range = AnalysisConfig {
            min_db: -30.0,
            max_db: -100.0,
            ..AnalysisConfig::default()
        };
        assert!(bad_range.validate().is_err());
    }

    #[test]
    fn test_render_config_aspect_ratio() {
        let config = RenderConfig::default();
        assert!((config.aspect_ratio() - 1280.0 / 720.0).abs() < 1e-6);
    }
}
