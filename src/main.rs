//! Pulseblob - an audio-reactive blob visualizer
//!
//! A deformable sphere pulses and shifts color with the music, a particle
//! cloud drifts around it, and a 2D overlay draws the live spectrum.

mod audio;
mod blob;
mod camera;
mod cli;
mod interaction;
mod overlay;
mod params;
mod particles;
mod rendering;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use glam::Vec2;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalPosition,
    event::*,
    event_loop::EventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorIcon, Window, WindowId},
};

use audio::{AudioState, FrequencySnapshot};
use blob::BlobSystem;
use camera::ViewCamera;
use cli::Args;
use interaction::InteractionController;
use overlay::ControlsAction;
use params::*;
use particles::ParticleCloud;
use rendering::{BlobUniforms, ParticleUniforms, RenderSystem};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,
    egui_ctx: egui::Context,
    egui_state: Option<egui_winit::State>,

    // Scene systems
    blob: BlobSystem,
    particles: ParticleCloud,
    camera: ViewCamera,
    interaction: InteractionController,
    audio: AudioState,

    // Configuration
    render_config: RenderConfig,
    analysis_config: AnalysisConfig,
    pending_audio: Option<PathBuf>,

    // Pointer and time tracking
    last_cursor: Option<PhysicalPosition<f64>>,
    start_time: Instant,
}

impl App {
    fn new(args: Args) -> Self {
        let render_config = RenderConfig::default();
        let analysis_config = args.analysis_config();

        let blob = BlobSystem::new(&BlobGeometry::default(), DeformationParams::default());
        let particles = ParticleCloud::new(args.particle_params());
        let camera = ViewCamera::new(&render_config);
        let interaction = InteractionController::new(InteractionParams::default());

        Self {
            window: None,
            render_system: None,
            egui_ctx: egui::Context::default(),
            egui_state: None,
            blob,
            particles,
            camera,
            interaction,
            audio: AudioState::new(),
            render_config,
            analysis_config,
            pending_audio: args.audio,
            last_cursor: None,
            start_time: Instant::now(),
        }
    }
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Pulseblob - Audio-Reactive Blob")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = Arc::new(event_loop.create_window(window_attributes).unwrap());

        // Initialize rendering system
        let render_system = pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            &self.blob.mesh,
            &self.particles,
        ))
        .unwrap();

        // Initialize overlay state
        let egui_state = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            window.theme(),
            None,
        );

        // The surface tracks physical pixels; so must the camera
        let size = window.inner_size();
        self.camera.set_viewport(size.width, size.height);

        println!("\nPulseblob is running!");
        println!("Press ESC to quit\n");

        if let Some(path) = self.pending_audio.take() {
            self.audio.begin_decode(path);
        }

        self.window = Some(window);
        self.render_system = Some(render_system);
        self.egui_state = Some(egui_state);
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // The overlay gets first look at every event
        if let Some(egui_state) = self.egui_state.as_mut() {
            let response = egui_state.on_window_event(&window, &event);
            if response.repaint {
                window.request_redraw();
            }
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),
            WindowEvent::Resized(size) => {
                // Surface and camera must both follow the window before the
                // next frame renders
                if let Some(render_system) = self.render_system.as_mut() {
                    render_system.resize(size.width, size.height);
                }
                self.camera.set_viewport(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let delta = match self.last_cursor {
                    Some(last) => {
                        Vec2::new((position.x - last.x) as f32, (position.y - last.y) as f32)
                    }
                    None => Vec2::ZERO,
                };
                self.last_cursor = Some(position);
                self.interaction.pointer_move(delta, &mut self.blob.orientation);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(position) = self.last_cursor {
                    let size = window.inner_size();
                    let ndc = interaction::pointer_ndc(
                        position.x as f32,
                        position.y as f32,
                        size.width as f32,
                        size.height as f32,
                    );
                    let hit = interaction::pointer_hits_blob(
                        ndc,
                        self.camera.view_proj(),
                        self.camera.eye(),
                        self.blob.radius(),
                    );
                    if self.interaction.pointer_down(hit) {
                        window.set_cursor(CursorIcon::Grabbing);
                    }
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                self.interaction.pointer_up();
                window.set_cursor(CursorIcon::Default);
            }
            WindowEvent::RedrawRequested => {
                self.render_frame();
            }
            _ => {}
        }
    }
}

impl App {
    /// Render a single frame
    fn render_frame(&mut self) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if self.render_system.is_none() || self.egui_state.is_none() {
            return;
        }

        // Get current time
        let time_s = self.start_time.elapsed().as_secs_f32();

        // Finish any in-flight decode before building the frame
        self.audio.poll_decode();

        // One snapshot feeds both the shader uniforms and the 2D overlay
        let snapshot = self.audio.sample();
        let energy = snapshot
            .as_ref()
            .map(FrequencySnapshot::normalized_energy)
            .unwrap_or(0.0);

        let mvp = self.camera.view_proj() * self.blob.orientation.model_matrix();
        let blob_uniforms = BlobUniforms {
            mvp: mvp.to_cols_array_2d(),
            time: time_s,
            audio_energy: energy,
            amplitude: self.blob.amplitude_for(energy),
            _padding: 0.0,
        };

        let color = self.particles.color(energy);
        let view_model = self.camera.view_matrix() * self.particles.model_matrix(time_s);
        let particle_uniforms = ParticleUniforms {
            proj: self.camera.proj_matrix().to_cols_array_2d(),
            view_model: view_model.to_cols_array_2d(),
            color: [color[0], color[1], color[2], 1.0],
            size: self.particles.size(),
            _padding: [0.0; 3],
        };

        // Build the overlay from the same snapshot
        let decoding = self.audio.decoding();
        let ready = self.audio.ready();
        let playing = self.audio.is_playing();
        let snapshot_ref = snapshot.as_ref();

        let egui_state = self.egui_state.as_mut().unwrap();
        let raw_input = egui_state.take_egui_input(&window);
        let mut action = ControlsAction::None;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            overlay::draw(ctx, snapshot_ref);
            action = overlay::controls(ctx, decoding, ready, playing);
        });
        egui_state.handle_platform_output(&window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        match action {
            ControlsAction::PickFile => self.pick_audio_file(),
            ControlsAction::Play => self.audio.start_playback(&self.analysis_config),
            ControlsAction::None => {}
        }

        // Update uniforms and render
        let render_system = self.render_system.as_mut().unwrap();
        render_system.update_blob_uniforms(&blob_uniforms);
        render_system.update_particle_uniforms(&particle_uniforms);

        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [render_system.width(), render_system.height()],
            pixels_per_point: full_output.pixels_per_point,
        };

        match render_system.render(&paint_jobs, &full_output.textures_delta, &screen) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = window.inner_size();
                render_system.resize(size.width, size.height);
            }
            Err(e) => eprintln!("Render error: {:?}", e),
        }
    }

    /// Open the native file dialog and start decoding the chosen file.
    fn pick_audio_file(&mut self) {
        let file = rfd::FileDialog::new()
            .add_filter("WAV audio", &["wav"])
            .pick_file();

        if let Some(path) = file {
            self.audio.begin_decode(path);
        }
    }
}

fn main() {
    let args = Args::parse();

    println!("Pulseblob - audio-reactive blob visualizer");

    if let Err(e) = args.analysis_config().validate() {
        eprintln!("Invalid analysis configuration: {}", e);
        std::process::exit(1);
    }

    let mut app = App::new(args);
    let event_loop = EventLoop::new().unwrap();
    let _ = event_loop.run_app(&mut app);
}
