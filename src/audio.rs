//! Audio decode, playback and FFT analysis.
//!
//! A WAV file is decoded on a background thread, played through cpal, and
//! fed to a real-time FFT that publishes byte-magnitude frequency snapshots
//! for the render loop.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::params::AnalysisConfig;

/// One frame's worth of frequency-domain magnitudes, one unsigned byte per
/// bin. Allocated when a session starts and overwritten in place by the
/// analysis thread.
#[derive(Clone, Debug)]
pub struct FrequencySnapshot {
    pub bins: Vec<u8>,
}

impl FrequencySnapshot {
    pub fn new(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    /// Mean magnitude across all bins scaled by the maximum byte range,
    /// giving a value in [0, 1).
    pub fn normalized_energy(&self) -> f32 {
        if self.bins.is_empty() {
            return 0.0;
        }
        let sum: u32 = self.bins.iter().map(|&b| u32::from(b)).sum();
        sum as f32 / self.bins.len() as f32 / 256.0
    }
}

/// A fully decoded audio file, shareable with the playback callback.
#[derive(Clone)]
pub struct DecodedTrack {
    /// Interleaved samples in [-1, 1]
    pub samples: Arc<Vec<f32>>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl DecodedTrack {
    pub fn frame_count(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_secs(&self) -> f32 {
        self.frame_count() as f32 / self.sample_rate.max(1) as f32
    }
}

/// Decode a WAV file into normalized f32 samples.
pub fn decode_wav(path: &Path) -> Result<DecodedTrack, String> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| format!("Failed to read samples: {}", e))?,
        hound::SampleFormat::Int => {
            let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect::<Result<_, _>>()
                .map_err(|e| format!("Failed to read samples: {}", e))?
        }
    };

    if samples.is_empty() {
        return Err(format!("{} contains no samples", path.display()));
    }

    Ok(DecodedTrack {
        samples: Arc::new(samples),
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    })
}

/// Decode a file on a background thread; the result arrives on the returned
/// channel. There is no cancellation for an in-flight decode.
pub fn spawn_decode_thread(path: PathBuf) -> Receiver<Result<DecodedTrack, String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(decode_wav(&path));
    });
    rx
}

/// Hann window function for FFT analysis
fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

/// Convert a smoothed linear magnitude to an unsigned byte through the
/// configured decibel range.
fn magnitude_to_byte(magnitude: f32, config: &AnalysisConfig) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }
    let db = 20.0 * magnitude.log10();
    let t = (db - config.min_db) / (config.max_db - config.min_db);
    (t.clamp(0.0, 1.0) * 255.0) as u8
}

/// Windowed FFT with per-bin exponential smoothing, producing byte
/// magnitudes. Smoothing state persists across blocks so magnitudes decay
/// instead of flickering when the input falls silent.
pub struct FrequencyAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    config: AnalysisConfig,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl FrequencyAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); config.fft_size];
        let smoothed = vec![0.0; config.bin_count()];
        Self {
            fft,
            config,
            scratch,
            smoothed,
        }
    }

    /// Analyze one block of mono samples; `block` must hold at least
    /// `fft_size` samples.
    pub fn process(&mut self, block: &[f32]) -> Vec<u8> {
        let size = self.config.fft_size;
        for i in 0..size {
            self.scratch[i] = Complex::new(block[i] * hann_window(i, size), 0.0);
        }

        self.fft.process(&mut self.scratch);

        let tau = self.config.smoothing_time_constant;
        (0..self.config.bin_count())
            .map(|k| {
                let magnitude = self.scratch[k].norm() / size as f32;
                self.smoothed[k] = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
                magnitude_to_byte(self.smoothed[k], &self.config)
            })
            .collect()
    }
}

/// Spawn the FFT analysis thread feeding `snapshot` from `sample_buffer`.
fn spawn_fft_thread(
    config: AnalysisConfig,
    sample_buffer: Arc<Mutex<Vec<f32>>>,
    snapshot: Arc<Mutex<FrequencySnapshot>>,
    shutdown: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let fft_size = config.fft_size;
        let interval = Duration::from_millis(config.update_interval_ms);
        let mut analyzer = FrequencyAnalyzer::new(config);

        loop {
            thread::sleep(interval);
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let mut samples = sample_buffer.lock().unwrap();
            if samples.len() >= fft_size {
                let bins = analyzer.process(&samples[..fft_size]);

                // 50% overlap (drain half the buffer)
                samples.drain(0..fft_size / 2);
                drop(samples);

                snapshot.lock().unwrap().bins = bins;
            }
        }
    })
}

/// A single playback-plus-analysis session. Dropping the session stops the
/// output stream and shuts down the analysis thread, so replacing the value
/// enforces the one-active-session rule.
pub struct AudioSession {
    snapshot: Arc<Mutex<FrequencySnapshot>>,
    playing: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    _stream: cpal::Stream,
    fft_thread: Option<thread::JoinHandle<()>>,
}

impl AudioSession {
    /// Start playing `track` from the beginning and analyzing it.
    pub fn start(track: &DecodedTrack, config: AnalysisConfig) -> Result<Self, String> {
        config
            .validate()
            .map_err(|e| format!("Invalid analysis config: {}", e))?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or("No audio output device found")?;

        let stream_config: cpal::StreamConfig = device
            .default_output_config()
            .map_err(|e| format!("Failed to get audio config: {}", e))?
            .into();

        println!(
            "Audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            stream_config.sample_rate.0
        );

        let out_channels = usize::from(stream_config.channels.max(1));
        let track_channels = usize::from(track.channels.max(1));
        let samples = Arc::clone(&track.samples);
        let total_frames = samples.len() / track_channels;
        let step = f64::from(track.sample_rate) / f64::from(stream_config.sample_rate.0.max(1));

        let sample_buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
        let sample_buffer_cb = Arc::clone(&sample_buffer);
        let playing = Arc::new(AtomicBool::new(true));
        let playing_cb = Arc::clone(&playing);
        let mut cursor = 0.0f64;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut analysis = sample_buffer_cb.lock().unwrap();

                    for frame in data.chunks_mut(out_channels) {
                        let index = cursor as usize;
                        if index >= total_frames {
                            // Track exhausted: emit silence but keep the
                            // session alive so magnitudes decay to zero.
                            for sample in frame.iter_mut() {
                                *sample = 0.0;
                            }
                            analysis.push(0.0);
                            playing_cb.store(false, Ordering::Relaxed);
                            continue;
                        }

                        let base = index * track_channels;
                        for (channel, sample) in frame.iter_mut().enumerate() {
                            *sample = samples[base + channel.min(track_channels - 1)];
                        }

                        // Mono downmix feeds the analyzer.
                        let mut mono = 0.0;
                        for channel in 0..track_channels {
                            mono += samples[base + channel];
                        }
                        analysis.push(mono / track_channels as f32);

                        cursor += step;
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| format!("Failed to build audio stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        let snapshot = Arc::new(Mutex::new(FrequencySnapshot::new(config.bin_count())));
        let shutdown = Arc::new(AtomicBool::new(false));
        let fft_thread = spawn_fft_thread(
            config,
            sample_buffer,
            Arc::clone(&snapshot),
            Arc::clone(&shutdown),
        );

        Ok(Self {
            snapshot,
            playing,
            shutdown,
            _stream: stream,
            fft_thread: Some(fft_thread),
        })
    }

    /// Latest frequency snapshot. Non-blocking: returns whatever the
    /// analysis thread last published, with no guarantee of new data.
    pub fn sample(&self) -> FrequencySnapshot {
        self.snapshot.lock().unwrap().clone()
    }

    /// True until the playback cursor passes the last frame.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

impl Drop for AudioSession {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.fft_thread.take() {
            let _ = handle.join();
        }
    }
}

/// Application-side audio state: the decode in flight, the decoded track,
/// and the active session.
#[derive(Default)]
pub struct AudioState {
    decode_rx: Option<Receiver<Result<DecodedTrack, String>>>,
    track: Option<DecodedTrack>,
    session: Option<AudioSession>,
}

impl AudioState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kick off a background decode. A decode already in flight is simply
    /// superseded; its result will be ignored.
    pub fn begin_decode(&mut self, path: PathBuf) {
        println!("Decoding {} ...", path.display());
        self.decode_rx = Some(spawn_decode_thread(path));
    }

    /// Poll the in-flight decode, if any. A failure is logged and leaves
    /// the previous track (and the play control) untouched.
    pub fn poll_decode(&mut self) {
        let Some(rx) = &self.decode_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(track)) => {
                println!(
                    "Decoded {:.1}s of audio ({} ch @ {} Hz)",
                    track.duration_secs(),
                    track.channels,
                    track.sample_rate
                );
                self.track = Some(track);
                self.decode_rx = None;
            }
            Ok(Err(e)) => {
                eprintln!("Error decoding audio: {}", e);
                self.decode_rx = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.decode_rx = None;
            }
        }
    }

    pub fn decoding(&self) -> bool {
        self.decode_rx.is_some()
    }

    /// True once a track has been decoded; gates the play control.
    pub fn ready(&self) -> bool {
        self.track.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(AudioSession::is_playing)
    }

    /// (Re)start playback of the decoded track. The active session is
    /// dropped before the replacement is created, so exactly one session
    /// ever feeds the frame loop.
    pub fn start_playback(&mut self, config: &AnalysisConfig) {
        let Some(track) = self.track.clone() else {
            return;
        };

        self.session = None;

        match AudioSession::start(&track, config.clone()) {
            Ok(session) => self.session = Some(session),
            Err(e) => eprintln!("Failed to start playback: {}", e),
        }
    }

    /// Current snapshot, or `None` when no session is active (callers treat
    /// that as zero energy).
    pub fn sample(&self) -> Option<FrequencySnapshot> {
        self.session.as_ref().map(AudioSession::sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_energy_range() {
        let silent = FrequencySnapshot::new(128);
        assert_eq!(silent.normalized_energy(), 0.0);

        let loud = FrequencySnapshot {
            bins: vec![255; 128],
        };
        assert!((loud.normalized_energy() - 255.0 / 256.0).abs() < 1e-6);

        let empty = FrequencySnapshot::new(0);
        assert_eq!(empty.normalized_energy(), 0.0);
    }

    #[test]
    fn test_hann_window() {
        let size = 256;

        // Hann window is 0 at the edges, 1 at the center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_magnitude_to_byte_mapping() {
        let config = AnalysisConfig::default();

        assert_eq!(magnitude_to_byte(0.0, &config), 0);

        // Below the floor clamps to 0, above the ceiling clamps to 255
        assert_eq!(magnitude_to_byte(1e-7, &config), 0);
        assert_eq!(magnitude_to_byte(1.0, &config), 255);

        // Monotone in between
        let quiet = magnitude_to_byte(1e-4, &config);
        let loud = magnitude_to_byte(1e-3, &config);
        assert!(quiet < loud);
    }

    #[test]
    fn test_analyzer_silence_stays_zero() {
        let config = AnalysisConfig::default();
        let block = vec![0.0; config.fft_size];
        let mut analyzer = FrequencyAnalyzer::new(config);

        for _ in 0..5 {
            let bins = analyzer.process(&block);
            assert!(bins.iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_analyzer_sine_reaches_stable_plateau() {
        let config = AnalysisConfig::default();
        let size = config.fft_size;
        let mut analyzer = FrequencyAnalyzer::new(config.clone());

        // Full-scale sine centered on bin 32
        let block: Vec<f32> = (0..size)
            .map(|i| (2.0 * PI * 32.0 * i as f32 / size as f32).sin())
            .collect();

        let mut energies = Vec::new();
        for _ in 0..20 {
            let snapshot = FrequencySnapshot {
                bins: analyzer.process(&block),
            };
            energies.push(snapshot.normalized_energy());
        }

        // Non-zero plateau within a few windows, stable at the end
        assert!(energies[5] > 0.005);
        let last = energies[energies.len() - 1];
        let prev = energies[energies.len() - 2];
        assert!((last - prev).abs() < 1e-3);
        assert!(last > 0.005);
    }

    #[test]
    fn test_analyzer_bins_decay_after_silence() {
        let config = AnalysisConfig::default();
        let size = config.fft_size;
        let mut analyzer = FrequencyAnalyzer::new(config.clone());

        let tone: Vec<f32> = (0..size)
            .map(|i| (2.0 * PI * 16.0 * i as f32 / size as f32).sin())
            .collect();
        let silence = vec![0.0; size];

        for _ in 0..10 {
            analyzer.process(&tone);
        }
        let during: u32 = analyzer.process(&tone).iter().map(|&b| u32::from(b)).sum();

        for _ in 0..40 {
            analyzer.process(&silence);
        }
        let after: u32 = analyzer
            .process(&silence)
            .iter()
            .map(|&b| u32::from(b))
            .sum();

        assert!(during > 0);
        assert!(after < during / 4);
    }

    #[test]
    fn test_decode_wav_roundtrip() {
        let path = std::env::temp_dir().join("pulseblob_decode_test.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..44100u32 {
            let value = (2.0 * PI * 440.0 * i as f32 / 44100.0).sin();
            let sample = (value * i16::MAX as f32) as i16;
            writer.write_sample(sample).unwrap();
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();

        let track = decode_wav(&path).unwrap();
        assert_eq!(track.channels, 2);
        assert_eq!(track.sample_rate, 44100);
        assert_eq!(track.frame_count(), 44100);
        assert!((track.duration_secs() - 1.0).abs() < 1e-3);
        assert!(track.samples.iter().all(|s| s.abs() <= 1.0));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_decode_missing_file_is_error() {
        let result = decode_wav(Path::new("/nonexistent/pulseblob.wav"));
        assert!(result.is_err());
    }
}
