//! 2D overlay: circular energy gauge, per-bin frequency bars, numeric
//! readout, and the playback controls panel.
//!
//! Everything is drawn through egui on top of the 3D frame. The geometry
//! and color helpers are plain functions so the drawing rules stay
//! testable without a GPU.

use egui::epaint::{Mesh, Shape};
use egui::{pos2, vec2, Align2, Color32, FontId, Pos2, Rect};

use crate::audio::FrequencySnapshot;

/// Stroke width of the energy ring (logical pixels)
pub const RING_STROKE_WIDTH: f32 = 10.0;
/// Segments used to tessellate the ring
const RING_SEGMENTS: usize = 96;
/// Readout font size (logical pixels)
const READOUT_FONT_SIZE: f32 = 24.0;

/// Largest gauge radius for a given surface size.
pub fn max_ring_radius(width: f32, height: f32) -> f32 {
    width.min(height) / 4.0
}

/// Gauge radius for the current energy.
pub fn ring_radius(max_radius: f32, energy: f32) -> f32 {
    max_radius * energy
}

/// The three gradient hues: a color triad rotated by the current energy.
pub fn triad_hues(energy: f32) -> [f32; 3] {
    let base = energy * 360.0;
    [base % 360.0, (base + 120.0) % 360.0, (base + 240.0) % 360.0]
}

/// HSL to RGB, hue in degrees, saturation/lightness in [0, 1].
pub fn hsl_to_rgb(hue_deg: f32, saturation: f32, lightness: f32) -> [f32; 3] {
    let hue = hue_deg.rem_euclid(360.0) / 60.0;
    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let x = chroma * (1.0 - (hue % 2.0 - 1.0).abs());

    let (r, g, b) = match hue as u32 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    [r + m, g + m, b + m]
}

fn rgb_to_color32(rgb: [f32; 3]) -> Color32 {
    Color32::from_rgb(
        (rgb[0].clamp(0.0, 1.0) * 255.0) as u8,
        (rgb[1].clamp(0.0, 1.0) * 255.0) as u8,
        (rgb[2].clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Color of the ring's radial gradient at distance fraction `t` from the
/// center: piecewise RGB blend through the three triad stops at 0, 0.5, 1.
pub fn gradient_color(energy: f32, t: f32) -> Color32 {
    let stops = triad_hues(energy).map(|hue| hsl_to_rgb(hue, 1.0, 0.5));
    let t = t.clamp(0.0, 1.0);

    let (from, to, local) = if t < 0.5 {
        (stops[0], stops[1], t * 2.0)
    } else {
        (stops[1], stops[2], (t - 0.5) * 2.0)
    };

    rgb_to_color32([
        from[0] + (to[0] - from[0]) * local,
        from[1] + (to[1] - from[1]) * local,
        from[2] + (to[2] - from[2]) * local,
    ])
}

/// Rounded readout value displayed as the "frequency" label.
pub fn frequency_readout(energy: f32) -> i32 {
    (energy * 1000.0).round() as i32
}

/// Screen rectangle of the frequency bar for `index`.
pub fn bar_rect(index: usize, bin_count: usize, magnitude: u8, width: f32, height: f32) -> Rect {
    let bar_width = width / bin_count as f32;
    let bar_height = f32::from(magnitude) / 256.0 * height / 2.0;
    let left = index as f32 * bar_width;

    Rect::from_min_max(
        pos2(left, height - bar_height),
        pos2(left + bar_width - 1.0, height),
    )
}

/// Bar color: hue follows the bin index, lightness is boosted by the bin's
/// magnitude.
pub fn bar_color(index: usize, bin_count: usize, magnitude: u8) -> Color32 {
    let hue = index as f32 / bin_count as f32 * 360.0;
    let lightness = 0.5 + f32::from(magnitude) / 256.0 * 0.5;
    rgb_to_color32(hsl_to_rgb(hue, 1.0, lightness))
}

/// Draw the overlay for this frame's snapshot. With no active audio session
/// the surface stays clear.
pub fn draw(ctx: &egui::Context, snapshot: Option<&FrequencySnapshot>) {
    let Some(snapshot) = snapshot else {
        return;
    };

    let screen = ctx.screen_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Background,
        egui::Id::new("spectrum-overlay"),
    ));

    let energy = snapshot.normalized_energy();
    let (width, height) = (screen.width(), screen.height());
    let center = screen.center();
    let max_radius = max_ring_radius(width, height);

    draw_ring(&painter, center, max_radius, energy);

    let bin_count = snapshot.bins.len();
    for (index, &magnitude) in snapshot.bins.iter().enumerate() {
        painter.rect_filled(
            bar_rect(index, bin_count, magnitude, width, height),
            0.0,
            bar_color(index, bin_count, magnitude),
        );
    }

    painter.text(
        pos2(center.x, 30.0),
        Align2::CENTER_CENTER,
        format!("Frequency: {} Hz", frequency_readout(energy)),
        FontId::proportional(READOUT_FONT_SIZE),
        Color32::WHITE,
    );
}

/// Stroke the energy ring as a triangle strip with per-vertex gradient
/// colors sampled across the stroke width.
fn draw_ring(painter: &egui::Painter, center: Pos2, max_radius: f32, energy: f32) {
    let radius = ring_radius(max_radius, energy);
    if radius <= 0.0 {
        return;
    }

    let half = RING_STROKE_WIDTH / 2.0;
    let inner = (radius - half).max(0.0);
    let outer = radius + half;
    let inner_color = gradient_color(energy, inner / max_radius);
    let outer_color = gradient_color(energy, outer / max_radius);

    let mut mesh = Mesh::default();
    for segment in 0..=RING_SEGMENTS {
        let angle = segment as f32 / RING_SEGMENTS as f32 * std::f32::consts::TAU;
        let direction = vec2(angle.cos(), angle.sin());
        mesh.colored_vertex(center + direction * inner, inner_color);
        mesh.colored_vertex(center + direction * outer, outer_color);
    }
    for segment in 0..RING_SEGMENTS {
        let base = (segment * 2) as u32;
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base + 1, base + 3, base + 2);
    }

    painter.add(Shape::mesh(mesh));
}

/// Actions requested through the controls panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlsAction {
    None,
    PickFile,
    Play,
}

/// Status line shown next to the controls.
pub fn status_line(decoding: bool, ready: bool, playing: bool) -> &'static str {
    if playing {
        "Playing"
    } else if decoding {
        "Decoding..."
    } else if ready {
        "Ready"
    } else {
        "No audio loaded"
    }
}

/// Playback controls panel. The play button stays disabled until a track
/// has been decoded.
pub fn controls(ctx: &egui::Context, decoding: bool, ready: bool, playing: bool) -> ControlsAction {
    let mut action = ControlsAction::None;

    egui::Area::new(egui::Id::new("playback-controls"))
        .anchor(Align2::LEFT_TOP, vec2(12.0, 12.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("Open audio file").clicked() {
                        action = ControlsAction::PickFile;
                    }
                    if ui.add_enabled(ready, egui::Button::new("Play")).clicked() {
                        action = ControlsAction::Play;
                    }
                    ui.label(status_line(decoding, ready, playing));
                });
            });
        });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_radius_scales_exactly_with_energy() {
        let max_radius = max_ring_radius(1280.0, 720.0);
        assert_eq!(max_radius, 180.0);

        assert_eq!(ring_radius(max_radius, 0.0), 0.0);
        assert_eq!(ring_radius(max_radius, 0.5), 90.0);
        assert_eq!(ring_radius(max_radius, 1.0), max_radius);
    }

    #[test]
    fn test_triad_hues_rotate_and_wrap() {
        let quiet = triad_hues(0.0);
        assert_eq!(quiet, [0.0, 120.0, 240.0]);

        // All three stops stay 120 degrees apart modulo a full turn
        let hues = triad_hues(0.8);
        assert!((hues[0] - 288.0).abs() < 1e-3);
        assert!((hues[1] - 48.0).abs() < 1e-3);
        assert!((hues[2] - 168.0).abs() < 1e-3);
        for hue in hues {
            assert!((0.0..360.0).contains(&hue));
        }
    }

    #[test]
    fn test_hsl_primaries() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-5 && red[1] < 1e-5 && red[2] < 1e-5);

        let green = hsl_to_rgb(120.0, 1.0, 0.5);
        assert!((green[1] - 1.0).abs() < 1e-5 && green[0] < 1e-4);

        let blue = hsl_to_rgb(240.0, 1.0, 0.5);
        assert!((blue[2] - 1.0).abs() < 1e-5 && blue[1] < 1e-4);

        // Full lightness washes out to white regardless of hue
        let white = hsl_to_rgb(200.0, 1.0, 1.0);
        for component in white {
            assert!((component - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_gradient_endpoints_match_stops() {
        let energy = 0.3;
        let stops = triad_hues(energy).map(|hue| rgb_to_color32(hsl_to_rgb(hue, 1.0, 0.5)));

        assert_eq!(gradient_color(energy, 0.0), stops[0]);
        assert_eq!(gradient_color(energy, 0.5), stops[1]);
        assert_eq!(gradient_color(energy, 1.0), stops[2]);
    }

    #[test]
    fn test_frequency_readout_rounds() {
        assert_eq!(frequency_readout(0.0), 0);
        assert_eq!(frequency_readout(0.1234), 123);
        assert_eq!(frequency_readout(0.9996), 1000);
    }

    #[test]
    fn test_bar_rect_layout() {
        let rect = bar_rect(0, 128, 255, 1280.0, 720.0);
        assert_eq!(rect.min.x, 0.0);
        assert!((rect.width() - 9.0).abs() < 1e-4);
        // Full magnitude reaches half the surface height
        assert!((rect.height() - 255.0 / 256.0 * 360.0).abs() < 1e-3);
        assert_eq!(rect.max.y, 720.0);

        let last = bar_rect(127, 128, 0, 1280.0, 720.0);
        assert!((last.min.x - 1270.0).abs() < 1e-3);
        assert_eq!(last.height(), 0.0);
    }

    #[test]
    fn test_bar_color_lightness_boost() {
        // Zero magnitude sits at half lightness, full magnitude near white
        let dim = bar_color(0, 128, 0);
        let bright = bar_color(0, 128, 255);
        assert_eq!(dim, Color32::from_rgb(255, 0, 0));
        assert!(bright.g() > 200 && bright.b() > 200);
    }

    #[test]
    fn test_status_line_states() {
        assert_eq!(status_line(false, false, false), "No audio loaded");
        assert_eq!(status_line(true, false, false), "Decoding...");
        assert_eq!(status_line(false, true, false), "Ready");
        assert_eq!(status_line(false, true, true), "Playing");
    }
}
