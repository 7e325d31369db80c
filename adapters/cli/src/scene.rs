//! Builds declarative scenes from world queries.
//!
//! This is the draw pass of the game expressed as data: grid lines,
//! placement highlights, then every actor in draw order with its trail,
//! vision cone, body, badge and selection ring, then the side panel and the
//! terminal banner. The backend turns the result into pixels.

use glam::Vec2;
use gridshade_core::{GameMode, Rgba, ScreenPoint};
use gridshade_rendering::{
    ActorPresentation, ActorShape, BadgePresentation, BannerPresentation, CellHighlight, Color,
    ConePresentation, ControlGlyph, GridPresentation, PanelPresentation, RingPresentation, Scene,
    TrailPresentation,
};
use gridshade_world::{query, World};

const GRID_LINE_COLOR: Color = Color::new(0.0, 0.0, 0.0, 1.0);
const GRID_LINE_THICKNESS: f32 = 3.0;
const TRAIL_THICKNESS: f32 = 5.0;
const RING_THICKNESS: f32 = 10.0;
const PANEL_BACKGROUND: Color = Color::new(0.0, 0.0, 0.0, 1.0);
const BANNER_SIZE: f32 = 150.0;

const GUARD_BADGE: Rgba = Rgba::from_rgb(255, 0xd7, 0);
const CONE_ALERT: Rgba = Rgba::new(255, 50, 50, 160);
const CONE_CELEBRATING: Rgba = Rgba::new(50, 255, 50, 160);

/// Translates the world's drawable state into a scene description.
pub(crate) fn build_scene(world: &World) -> Scene {
    let grid = query::grid(world);
    let cell = grid.cell_size as f32;

    let (viewport_width, panel_width, height) = match query::layout(world) {
        Some(layout) => (
            layout.viewport_width(),
            layout.panel_width(),
            layout.height(),
        ),
        // Before the first layout event, partition along the grid's edge.
        None => (
            grid.columns * grid.cell_size,
            (grid.columns * grid.cell_size) / 9,
            grid.rows * grid.cell_size,
        ),
    };

    let grid_presentation = GridPresentation::new(
        grid.columns.max(0) as u32,
        grid.rows.max(0) as u32,
        cell.max(1.0),
        GRID_LINE_COLOR,
        GRID_LINE_THICKNESS,
    )
    .unwrap_or(GridPresentation {
        columns: 0,
        rows: 0,
        cell_size: 1.0,
        line_color: GRID_LINE_COLOR,
        line_thickness: GRID_LINE_THICKNESS,
    });

    let highlights = query::placement_preview(world)
        .map(|preview| {
            preview
                .cells
                .iter()
                .map(|target| CellHighlight {
                    origin: Vec2::new(target.x() as f32 * cell, target.y() as f32 * cell),
                    size: cell,
                    color: Color::from(preview.color),
                })
                .collect()
        })
        .unwrap_or_default();

    let actors = query::actor_view(world)
        .into_iter()
        .map(|snapshot| {
            let center = to_vec(snapshot.screen);
            let body = snapshot.color;
            let (shape, badge) = match snapshot.kind {
                query::ActorKind::Wall | query::ActorKind::EndMarker => (
                    ActorShape::Square {
                        half_extent: cell / 2.0,
                    },
                    None,
                ),
                query::ActorKind::Player | query::ActorKind::Clone { .. } => (
                    ActorShape::Circle {
                        radius: cell / 4.0,
                    },
                    None,
                ),
                query::ActorKind::Guard => (
                    ActorShape::Circle {
                        radius: cell / 4.0,
                    },
                    Some(BadgePresentation {
                        color: Color::from(GUARD_BADGE),
                        radius: cell / 12.0,
                    }),
                ),
            };

            let trail = (snapshot.trail.len() >= 2).then(|| TrailPresentation {
                points: snapshot.trail.iter().map(|point| to_vec(*point)).collect(),
                color: Color::from(body.path_tint()),
                thickness: TRAIL_THICKNESS,
            });

            let cone = snapshot.vision.as_ref().and_then(|vision| {
                if vision.reach == 0 || vision.cells.len() < 2 {
                    return None;
                }
                let origin = vision.cells[0];
                let next = vision.cells[1];
                let step = Vec2::new(
                    (next.x() - origin.x()) as f32 * cell,
                    (next.y() - origin.y()) as f32 * cell,
                );
                let tip = center + step * vision.reach as f32;
                let spread = Vec2::new(step.y.abs() / 4.0, step.x.abs() / 4.0);
                Some(ConePresentation {
                    apex: center,
                    base_a: tip - spread,
                    base_b: tip + spread,
                    color: Color::from(if vision.celebrating {
                        CONE_CELEBRATING
                    } else {
                        CONE_ALERT
                    }),
                })
            });

            let ring = snapshot.selected.then(|| RingPresentation {
                color: Color::from(body.inverted()),
                radius: cell / 4.0,
                thickness: RING_THICKNESS,
            });

            ActorPresentation {
                center,
                shape,
                color: Color::from(body),
                trail,
                cone,
                badge,
                ring,
            }
        })
        .collect();

    let mode = query::mode(world);
    let panel = PanelPresentation {
        origin_x: viewport_width as f32,
        width: panel_width as f32,
        height: height as f32,
        background: PANEL_BACKGROUND,
        control: match mode {
            GameMode::Plan => Some(ControlGlyph::Play),
            GameMode::Execute => Some(ControlGlyph::Pause),
            GameMode::Success | GameMode::Failure => None,
        },
        rows: query::clone_rows(world)
            .into_iter()
            .map(|row| gridshade_rendering::CloneRowPresentation {
                color: Color::from(row.color),
                remaining: row.remaining,
            })
            .collect(),
    };

    let banner = match mode {
        GameMode::Success => Some(BannerPresentation {
            text: "Level Complete!".to_owned(),
            color: Color::from_rgb_u8(0, 255, 0),
            size: BANNER_SIZE,
        }),
        GameMode::Failure => Some(BannerPresentation {
            text: "Level Failed!".to_owned(),
            color: Color::from_rgb_u8(255, 0, 0),
            size: BANNER_SIZE,
        }),
        GameMode::Plan | GameMode::Execute => None,
    };

    Scene::new(grid_presentation, highlights, actors, panel, banner)
}

fn to_vec(point: ScreenPoint) -> Vec2 {
    Vec2::new(point.x() as f32, point.y() as f32)
}

#[cfg(test)]
mod tests {
    use super::build_scene;
    use gridshade_core::{
        Cell, CloneProfile, Command, DirectionIndex, GuardSpec, LevelSpec, Rgba, ScreenPoint,
        SpaceKind,
    };
    use gridshade_rendering::{ActorShape, ControlGlyph};
    use gridshade_world::{apply, World};
    use std::time::Duration;

    fn world_with_guard() -> World {
        let level = LevelSpec {
            name: "scene".to_owned(),
            space: SpaceKind::Grid,
            layout: vec!["S.E".to_owned(), "...".to_owned()],
            clones: vec![1],
            guards: vec![GuardSpec::Stationary {
                cell: Cell::new(1, 1),
                range: 1,
                facing: DirectionIndex::new(0),
            }],
        };
        let mut world = World::from_level(
            &level,
            &[CloneProfile::new(1.0, Rgba::from_rgb(255, 160, 0))],
            100,
        )
        .expect("valid level");
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::ConfigureLayout {
                viewport_width: 300,
                panel_width: 60,
                height: 200,
                cell_size: 100,
            },
            &mut events,
        );
        world
    }

    #[test]
    fn scenes_carry_the_grid_and_panel_partition() {
        let world = world_with_guard();
        let scene = build_scene(&world);
        assert_eq!(scene.grid.columns, 3);
        assert_eq!(scene.grid.rows, 2);
        assert!((scene.panel.origin_x - 300.0).abs() < f32::EPSILON);
        assert!((scene.panel.width - 60.0).abs() < f32::EPSILON);
        assert_eq!(scene.panel.control, Some(ControlGlyph::Play));
        assert_eq!(scene.panel.rows.len(), 1);
    }

    #[test]
    fn guards_get_badges_and_alert_cones() {
        let world = world_with_guard();
        let scene = build_scene(&world);
        let guard = scene
            .actors
            .iter()
            .find(|actor| actor.badge.is_some())
            .expect("guard presentation");
        let cone = guard.cone.expect("vision cone");
        // Facing right with one visible cell: the cone tip sits one cell out.
        assert!((cone.apex.x - 150.0).abs() < f32::EPSILON);
        assert!((cone.base_a.x - 250.0).abs() < f32::EPSILON);
        // Red while not celebrating.
        assert!(cone.color.red > cone.color.green);
    }

    #[test]
    fn walls_and_markers_are_squares_and_units_are_circles() {
        let world = world_with_guard();
        let scene = build_scene(&world);
        let squares = scene
            .actors
            .iter()
            .filter(|actor| matches!(actor.shape, ActorShape::Square { .. }))
            .count();
        let circles = scene
            .actors
            .iter()
            .filter(|actor| matches!(actor.shape, ActorShape::Circle { .. }))
            .count();
        // One end marker; one guard plus the player.
        assert_eq!(squares, 1);
        assert_eq!(circles, 2);
    }

    #[test]
    fn the_selected_player_wears_an_inverted_ring() {
        let world = world_with_guard();
        let scene = build_scene(&world);
        let ringed = scene
            .actors
            .iter()
            .filter(|actor| actor.ring.is_some())
            .count();
        assert_eq!(ringed, 1);
    }

    #[test]
    fn terminal_worlds_show_a_banner_and_no_control() {
        let mut world = world_with_guard();
        // Plan to the end and execute until success.
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Click {
                at: ScreenPoint::new(150, 50),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Click {
                at: ScreenPoint::new(250, 50),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Click {
                at: ScreenPoint::new(310, 10),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(2000),
            },
            &mut events,
        );

        let scene = build_scene(&world);
        let banner = scene.banner.expect("terminal banner");
        assert_eq!(banner.text, "Level Complete!");
        assert_eq!(scene.panel.control, None);
    }

    #[test]
    fn arming_a_clone_highlights_the_players_neighbors() {
        let mut world = world_with_guard();
        let mut events = Vec::new();
        // Panel row 0: x past the viewport, y in the row band.
        apply(
            &mut world,
            Command::Click {
                at: ScreenPoint::new(310, 55),
            },
            &mut events,
        );
        let scene = build_scene(&world);
        // The player at (0, 0) has two in-bounds neighbors.
        assert_eq!(scene.highlights.len(), 2);
        assert!((scene.highlights[0].size - 100.0).abs() < f32::EPSILON);
    }
}
