//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::params::{AnalysisConfig, ParticleParams};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Pulseblob")]
#[command(about = "Audio-reactive blob visualizer", long_about = None)]
pub struct Args {
    /// WAV file to decode at startup (can also be picked from the UI)
    pub audio: Option<PathBuf>,

    /// FFT window size in samples (power of two)
    #[arg(long, value_name = "SAMPLES", default_value = "256")]
    pub fft_size: usize,

    /// Number of background particles
    #[arg(long, value_name = "COUNT", default_value = "1000")]
    pub particles: usize,
}

impl Args {
    /// Analysis configuration from command-line arguments
    pub fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            fft_size: self.fft_size,
            ..AnalysisConfig::default()
        }
    }

    /// Particle cloud parameters from command-line arguments
    pub fn particle_params(&self) -> ParticleParams {
        ParticleParams {
            count: self.particles,
            ..ParticleParams::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_arguments() {
        let args = Args::try_parse_from(["pulseblob"]).unwrap();
        assert!(args.audio.is_none());
        assert_eq!(args.analysis_config().fft_size, 256);
        assert_eq!(args.particle_params().count, 1000);
    }

    #[test]
    fn test_argument_overrides() {
        let args = Args::try_parse_from([
            "pulseblob",
            "track.wav",
            "--fft-size",
            "512",
            "--particles",
            "200",
        ])
        .unwrap();

        assert_eq!(
            args.audio.as_deref(),
            Some(std::path::Path::new("track.wav"))
        );
        assert_eq!(args.analysis_config().fft_size, 512);
        assert_eq!(args.analysis_config().bin_count(), 256);
        assert_eq!(args.particle_params().count, 200);
    }
}
