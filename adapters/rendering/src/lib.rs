#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Gridshade adapters.
//!
//! The simulation core never touches pixels; hosts translate world queries
//! into the declarative [`Scene`] described here and hand it to a
//! [`RenderingBackend`]. The scene vocabulary mirrors the draw pass of the
//! game: grid lines, placement highlights, then each actor's path trail,
//! vision cone, body, badge and selection ring in draw order, then the side
//! panel and the terminal banner.

use anyhow::Result as AnyResult;
use glam::Vec2;
use gridshade_core::Rgba;
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }
}

impl From<Rgba> for Color {
    fn from(value: Rgba) -> Self {
        Self {
            red: f32::from(value.red()) / 255.0,
            green: f32::from(value.green()) / 255.0,
            blue: f32::from(value.blue()) / 255.0,
            alpha: f32::from(value.alpha()) / 255.0,
        }
    }
}

/// Input snapshot gathered by backends before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Device-pixel location of a primary pointer-up event, if one occurred
    /// during this frame.
    pub pointer_up: Option<Vec2>,
    /// Current backend surface size in device pixels.
    pub screen: Vec2,
}

/// Viewport partition derived from a backend surface size.
///
/// The side panel claims at least a tenth of the width; the grid cell size is
/// the largest that fits both the remaining width and the full height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewportLayout {
    /// Width of the simulation viewport in device pixels.
    pub viewport_width: i32,
    /// Width of the side panel in device pixels.
    pub panel_width: i32,
    /// Height shared by the viewport and the panel.
    pub height: i32,
    /// Derived pixel size of a single grid cell.
    pub cell_size: i32,
}

/// Computes the viewport partition for a surface and level size.
///
/// Returns an error when the surface or the grid has no usable area.
pub fn compute_layout(
    screen_width: i32,
    screen_height: i32,
    columns: i32,
    rows: i32,
) -> Result<ViewportLayout, RenderingError> {
    if columns <= 0 || rows <= 0 {
        return Err(RenderingError::DegenerateGrid { columns, rows });
    }
    let panel_width = (screen_width + 9) / 10;
    let viewport_width = screen_width - panel_width;
    let cell_size = (viewport_width / columns).min(screen_height / rows);
    if cell_size <= 0 {
        return Err(RenderingError::SurfaceTooSmall {
            width: screen_width,
            height: screen_height,
        });
    }
    Ok(ViewportLayout {
        viewport_width,
        panel_width,
        height: screen_height,
        cell_size,
    })
}

/// Describes the level grid lines.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns drawn.
    pub columns: u32,
    /// Number of rows drawn.
    pub rows: u32,
    /// Side length of a single cell in device pixels.
    pub cell_size: f32,
    /// Color used when drawing grid lines.
    pub line_color: Color,
    /// Stroke width of the grid lines.
    pub line_thickness: f32,
}

impl GridPresentation {
    /// Creates a new grid descriptor.
    ///
    /// Returns an error when the cell size is not positive.
    pub fn new(
        columns: u32,
        rows: u32,
        cell_size: f32,
        line_color: Color,
        line_thickness: f32,
    ) -> Result<Self, RenderingError> {
        if cell_size <= 0.0 {
            return Err(RenderingError::InvalidCellSize { cell_size });
        }
        Ok(Self {
            columns,
            rows,
            cell_size,
            line_color,
            line_thickness,
        })
    }

    /// Total width of the grid in device pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.cell_size
    }

    /// Total height of the grid in device pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }
}

/// Filled square highlighting one grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellHighlight {
    /// Top-left corner of the highlighted cell in device pixels.
    pub origin: Vec2,
    /// Side length of the highlighted square.
    pub size: f32,
    /// Fill color of the highlight.
    pub color: Color,
}

/// Polyline trail from an actor's current position through its remaining
/// waypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailPresentation {
    /// Polyline points in device pixels, at least two entries.
    pub points: Vec<Vec2>,
    /// Stroke color of the trail.
    pub color: Color,
    /// Stroke width of the trail.
    pub thickness: f32,
}

/// Filled triangle describing a guard's vision cone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConePresentation {
    /// Cone apex: the guard's interpolated position.
    pub apex: Vec2,
    /// One corner of the cone base.
    pub base_a: Vec2,
    /// The other corner of the cone base.
    pub base_b: Vec2,
    /// Fill color of the cone.
    pub color: Color,
}

/// Body shape of an actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActorShape {
    /// Filled circle with the provided radius.
    Circle {
        /// Radius in device pixels.
        radius: f32,
    },
    /// Filled axis-aligned square centered on the actor.
    Square {
        /// Half of the square's side length in device pixels.
        half_extent: f32,
    },
}

/// Stroked circle drawn around a selected actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingPresentation {
    /// Stroke color of the ring.
    pub color: Color,
    /// Radius of the ring in device pixels.
    pub radius: f32,
    /// Stroke width of the ring.
    pub thickness: f32,
}

/// Small filled circle drawn on top of an actor body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BadgePresentation {
    /// Fill color of the badge.
    pub color: Color,
    /// Radius of the badge in device pixels.
    pub radius: f32,
}

/// Drawable description of one actor, emitted in draw order.
#[derive(Clone, Debug, PartialEq)]
pub struct ActorPresentation {
    /// Center of the actor body in device pixels.
    pub center: Vec2,
    /// Body shape.
    pub shape: ActorShape,
    /// Body fill color.
    pub color: Color,
    /// Remaining path trail, drawn beneath the body.
    pub trail: Option<TrailPresentation>,
    /// Vision cone, drawn beneath the body.
    pub cone: Option<ConePresentation>,
    /// Badge drawn on top of the body.
    pub badge: Option<BadgePresentation>,
    /// Selection ring drawn around the body.
    pub ring: Option<RingPresentation>,
}

/// Play/pause glyph shown in the side panel's control region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlGlyph {
    /// Triangle pointing right: clicking it starts execution.
    Play,
    /// Two vertical bars: clicking it pauses execution.
    Pause,
}

/// Side-panel row advertising a placeable clone type.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloneRowPresentation {
    /// Display color of the clone type.
    pub color: Color,
    /// Remaining inventory of the clone type.
    pub remaining: u32,
}

/// Declarative description of the side panel.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelPresentation {
    /// Left edge of the panel in device pixels.
    pub origin_x: f32,
    /// Width of the panel in device pixels.
    pub width: f32,
    /// Height of the panel in device pixels.
    pub height: f32,
    /// Background fill of the panel.
    pub background: Color,
    /// Control glyph shown in the top quarter, absent in terminal states.
    pub control: Option<ControlGlyph>,
    /// Clone inventory rows, top to bottom.
    pub rows: Vec<CloneRowPresentation>,
}

/// Centered text overlay announcing the end of an attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct BannerPresentation {
    /// Text to display.
    pub text: String,
    /// Fill color of the text.
    pub color: Color,
    /// Font size in device pixels.
    pub size: f32,
}

/// Scene description combining the grid, its inhabitants and the UI chrome.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// The level grid.
    pub grid: GridPresentation,
    /// Placement highlights drawn above the grid, beneath the actors.
    pub highlights: Vec<CellHighlight>,
    /// Actors in draw order.
    pub actors: Vec<ActorPresentation>,
    /// The side panel.
    pub panel: PanelPresentation,
    /// Terminal banner, if the attempt has ended.
    pub banner: Option<BannerPresentation>,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        grid: GridPresentation,
        highlights: Vec<CellHighlight>,
        actors: Vec<ActorPresentation>,
        panel: PanelPresentation,
        banner: Option<BannerPresentation>,
    ) -> Self {
        Self {
            grid,
            highlights,
            actors,
            panel,
            banner,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Gridshade scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the backend, and may replace the scene before it is
    /// rendered.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cell sizes must be positive to avoid a zero-area grid.
    InvalidCellSize {
        /// Provided cell size that failed validation.
        cell_size: f32,
    },
    /// Levels must have at least one column and one row.
    DegenerateGrid {
        /// Provided column count.
        columns: i32,
        /// Provided row count.
        rows: i32,
    },
    /// The surface is too small to fit a single grid cell.
    SurfaceTooSmall {
        /// Surface width in device pixels.
        width: i32,
        /// Surface height in device pixels.
        height: i32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellSize { cell_size } => {
                write!(f, "cell_size must be positive (received {cell_size})")
            }
            Self::DegenerateGrid { columns, rows } => {
                write!(
                    f,
                    "grid must have positive dimensions (received {columns}x{rows})"
                )
            }
            Self::SurfaceTooSmall { width, height } => {
                write!(f, "surface {width}x{height} cannot fit a single grid cell")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::{compute_layout, Color, GridPresentation, RenderingError};
    use gridshade_core::Rgba;

    #[test]
    fn layout_reserves_at_least_a_tenth_for_the_panel() {
        let layout = compute_layout(1000, 600, 9, 6).expect("valid layout");
        assert!(layout.panel_width * 10 >= 1000);
        assert_eq!(layout.viewport_width + layout.panel_width, 1000);
    }

    #[test]
    fn layout_picks_the_largest_cell_fitting_both_axes() {
        let layout = compute_layout(1000, 600, 9, 6).expect("valid layout");
        // 900 / 9 = 100 wide, 600 / 6 = 100 tall.
        assert_eq!(layout.cell_size, 100);

        let wide = compute_layout(2000, 600, 9, 6).expect("valid layout");
        // Height is the binding constraint on a wide surface.
        assert_eq!(wide.cell_size, 100);
    }

    #[test]
    fn layout_rejects_degenerate_grids_and_tiny_surfaces() {
        assert_eq!(
            compute_layout(1000, 600, 0, 6),
            Err(RenderingError::DegenerateGrid {
                columns: 0,
                rows: 6
            })
        );
        assert_eq!(
            compute_layout(10, 2, 9, 6),
            Err(RenderingError::SurfaceTooSmall {
                width: 10,
                height: 2
            })
        );
    }

    #[test]
    fn grid_presentation_rejects_non_positive_cell_sizes() {
        let error = GridPresentation::new(9, 6, 0.0, Color::from_rgb_u8(0, 0, 0), 3.0)
            .expect_err("zero cell size must be rejected");
        assert_eq!(error, RenderingError::InvalidCellSize { cell_size: 0.0 });
    }

    #[test]
    fn grid_presentation_reports_its_pixel_extent() {
        let grid = GridPresentation::new(9, 6, 100.0, Color::from_rgb_u8(0, 0, 0), 3.0)
            .expect("valid grid");
        assert!((grid.width() - 900.0).abs() < f32::EPSILON);
        assert!((grid.height() - 600.0).abs() < f32::EPSILON);
    }

    #[test]
    fn core_colors_convert_to_unit_channels() {
        let color = Color::from(Rgba::new(255, 0, 160, 160));
        assert!((color.red - 1.0).abs() < f32::EPSILON);
        assert!(color.green.abs() < f32::EPSILON);
        assert!((color.blue - 160.0 / 255.0).abs() < f32::EPSILON);
        assert!((color.alpha - 160.0 / 255.0).abs() < f32::EPSILON);
    }
}
