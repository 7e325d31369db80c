#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Gridshade.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in containerised CI environments. To keep
//! `cargo test` usable everywhere we depend on macroquad without its default
//! `audio` feature; consumers that need sound playback can opt back in by
//! enabling `macroquad/audio` in their own `Cargo.toml`.

use std::time::Duration;

use anyhow::Result;
use glam::Vec2;
use macroquad::{
    color::WHITE,
    input::{is_key_pressed, is_mouse_button_released, mouse_position, KeyCode, MouseButton},
    math::Vec2 as MacroquadVec2,
};
use gridshade_rendering::{
    ActorPresentation, ActorShape, BannerPresentation, CellHighlight, Color, ControlGlyph,
    FrameInput, GridPresentation, PanelPresentation, Presentation, RenderingBackend, Scene,
    TrailPresentation,
};

const PANEL_SEPARATOR_COLOR: Color = Color::new(0.25, 0.25, 0.25, 1.0);
const PANEL_SEPARATOR_THICKNESS: f32 = 2.0;

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug)]
pub struct MacroquadBackend {
    window_width: i32,
    window_height: i32,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Creates a backend with the default window size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            window_width: 1000,
            window_height: 700,
            show_fps: false,
        }
    }

    /// Overrides the initial window size.
    #[must_use]
    pub const fn with_window_size(mut self, width: i32, height: i32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Prints a frame-rate summary to stdout once per second.
    #[must_use]
    pub const fn with_fps_counter(mut self) -> Self {
        self.show_fps = true;
        self
    }
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            window_width,
            window_height,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let config = macroquad::window::Conf {
            window_title,
            window_width,
            window_height,
            ..macroquad::window::Conf::default()
        };

        macroquad::Window::from_config(config, async move {
            let background = to_macroquad_color(clear_color);
            let mut scene = scene;
            let mut fps_counter = FpsCounter::default();

            loop {
                if is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q) {
                    break;
                }

                macroquad::window::clear_background(background);

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let frame_input = gather_frame_input();

                update_scene(frame_dt, frame_input, &mut scene);

                draw_grid(&scene.grid);
                for highlight in &scene.highlights {
                    draw_highlight(highlight);
                }
                for actor in &scene.actors {
                    draw_actor(actor);
                }
                draw_panel(&scene.panel);
                if let Some(banner) = &scene.banner {
                    draw_banner(banner, scene.panel.origin_x, scene.panel.height);
                }

                if show_fps {
                    if let Some(rate) = fps_counter.record_frame(frame_dt) {
                        println!("FPS: {rate:.2}");
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

/// Captures the pointer and surface state for the current frame.
fn gather_frame_input() -> FrameInput {
    let pointer_up = if is_mouse_button_released(MouseButton::Left) {
        let (x, y) = mouse_position();
        Some(Vec2::new(x, y))
    } else {
        None
    };
    FrameInput {
        pointer_up,
        screen: Vec2::new(
            macroquad::window::screen_width(),
            macroquad::window::screen_height(),
        ),
    }
}

fn draw_grid(grid: &GridPresentation) {
    let color = to_macroquad_color(grid.line_color);
    let width = grid.width();
    let height = grid.height();
    for column in 0..=grid.columns {
        let x = column as f32 * grid.cell_size;
        macroquad::shapes::draw_line(x, 0.0, x, height, grid.line_thickness, color);
    }
    for row in 0..=grid.rows {
        let y = row as f32 * grid.cell_size;
        macroquad::shapes::draw_line(0.0, y, width, y, grid.line_thickness, color);
    }
}

fn draw_highlight(highlight: &CellHighlight) {
    macroquad::shapes::draw_rectangle(
        highlight.origin.x,
        highlight.origin.y,
        highlight.size,
        highlight.size,
        to_macroquad_color(highlight.color),
    );
}

fn draw_actor(actor: &ActorPresentation) {
    if let Some(trail) = &actor.trail {
        draw_trail(trail);
    }
    if let Some(cone) = &actor.cone {
        macroquad::shapes::draw_triangle(
            to_macroquad_vec(cone.apex),
            to_macroquad_vec(cone.base_a),
            to_macroquad_vec(cone.base_b),
            to_macroquad_color(cone.color),
        );
    }

    let color = to_macroquad_color(actor.color);
    match actor.shape {
        ActorShape::Circle { radius } => {
            macroquad::shapes::draw_circle(actor.center.x, actor.center.y, radius, color);
        }
        ActorShape::Square { half_extent } => {
            macroquad::shapes::draw_rectangle(
                actor.center.x - half_extent,
                actor.center.y - half_extent,
                half_extent * 2.0,
                half_extent * 2.0,
                color,
            );
        }
    }

    if let Some(badge) = &actor.badge {
        macroquad::shapes::draw_circle(
            actor.center.x,
            actor.center.y,
            badge.radius,
            to_macroquad_color(badge.color),
        );
    }
    if let Some(ring) = &actor.ring {
        macroquad::shapes::draw_circle_lines(
            actor.center.x,
            actor.center.y,
            ring.radius,
            ring.thickness,
            to_macroquad_color(ring.color),
        );
    }
}

fn draw_trail(trail: &TrailPresentation) {
    let color = to_macroquad_color(trail.color);
    for segment in trail.points.windows(2) {
        macroquad::shapes::draw_line(
            segment[0].x,
            segment[0].y,
            segment[1].x,
            segment[1].y,
            trail.thickness,
            color,
        );
    }
}

fn draw_panel(panel: &PanelPresentation) {
    macroquad::shapes::draw_rectangle(
        panel.origin_x,
        0.0,
        panel.width,
        panel.height,
        to_macroquad_color(panel.background),
    );

    let glyph_size = (panel.height / 8.0).min(panel.width / 2.0);
    let center_x = panel.origin_x + panel.width / 2.0;
    let center_y = panel.height / 8.0;

    match panel.control {
        Some(ControlGlyph::Play) => {
            macroquad::shapes::draw_triangle(
                MacroquadVec2::new(center_x - glyph_size / 2.0, center_y + glyph_size / 2.0),
                MacroquadVec2::new(center_x + glyph_size / 2.0, center_y),
                MacroquadVec2::new(center_x - glyph_size / 2.0, center_y - glyph_size / 2.0),
                WHITE,
            );
        }
        Some(ControlGlyph::Pause) => {
            macroquad::shapes::draw_rectangle(
                center_x - glyph_size / 2.0,
                center_y - glyph_size / 2.0,
                glyph_size / 4.0,
                glyph_size,
                WHITE,
            );
            macroquad::shapes::draw_rectangle(
                center_x + glyph_size / 4.0,
                center_y - glyph_size / 2.0,
                glyph_size / 4.0,
                glyph_size,
                WHITE,
            );
        }
        None => {}
    }

    let separator = to_macroquad_color(PANEL_SEPARATOR_COLOR);
    let row_height = panel.height / 8.0;
    let mut position = 0;
    for row in &panel.rows {
        let top = (2 + position) as f32 * row_height;
        macroquad::shapes::draw_line(
            panel.origin_x,
            top,
            panel.origin_x + panel.width,
            top,
            PANEL_SEPARATOR_THICKNESS,
            separator,
        );

        let row_center_y = (5 + position * 2) as f32 * panel.height / 16.0;
        macroquad::shapes::draw_circle(
            panel.origin_x + glyph_size * 2.0 / 3.0,
            row_center_y,
            glyph_size / 3.0,
            to_macroquad_color(row.color),
        );

        let text_size = glyph_size * 2.0 / 3.0;
        macroquad::text::draw_text(
            &row.remaining.to_string(),
            panel.origin_x + glyph_size * 4.0 / 3.0,
            row_center_y + text_size / 2.0,
            text_size,
            WHITE,
        );

        position += 1;
    }
    let bottom = (2 + position) as f32 * row_height;
    macroquad::shapes::draw_line(
        panel.origin_x,
        bottom,
        panel.origin_x + panel.width,
        bottom,
        PANEL_SEPARATOR_THICKNESS,
        separator,
    );
}

fn draw_banner(banner: &BannerPresentation, viewport_width: f32, height: f32) {
    let dimensions =
        macroquad::text::measure_text(&banner.text, None, banner.size as u16, 1.0);
    macroquad::text::draw_text(
        &banner.text,
        viewport_width / 2.0 - dimensions.width / 2.0,
        height / 2.0 + banner.size / 4.0,
        banner.size,
        to_macroquad_color(banner.color),
    );
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

fn to_macroquad_vec(v: Vec2) -> MacroquadVec2 {
    MacroquadVec2::new(v.x, v.y)
}

/// Counts rendered frames and reports the rate once per second.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    fn record_frame(&mut self, frame: Duration) -> Option<f32> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        if self.elapsed < Duration::from_secs(1) {
            return None;
        }
        let seconds = self.elapsed.as_secs_f32();
        if seconds <= f32::EPSILON {
            self.elapsed = Duration::ZERO;
            self.frames = 0;
            return None;
        }
        let rate = self.frames as f32 / seconds;
        self.elapsed = Duration::ZERO;
        self.frames = 0;
        Some(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::{to_macroquad_color, FpsCounter};
    use gridshade_rendering::Color;
    use std::time::Duration;

    #[test]
    fn fps_counter_reports_once_per_second() {
        let mut counter = FpsCounter::default();
        for _ in 0..59 {
            assert_eq!(counter.record_frame(Duration::from_millis(16)), None);
        }
        let rate = counter
            .record_frame(Duration::from_millis(64))
            .expect("one second elapsed");
        assert!(rate > 55.0 && rate < 65.0);

        // The counter resets after reporting.
        assert_eq!(counter.record_frame(Duration::from_millis(16)), None);
    }

    #[test]
    fn color_conversion_preserves_channels() {
        let converted = to_macroquad_color(Color::new(0.25, 0.5, 0.75, 1.0));
        assert!((converted.r - 0.25).abs() < f32::EPSILON);
        assert!((converted.g - 0.5).abs() < f32::EPSILON);
        assert!((converted.b - 0.75).abs() < f32::EPSILON);
        assert!((converted.a - 1.0).abs() < f32::EPSILON);
    }
}
