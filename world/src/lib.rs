#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative level state management for Gridshade.
//!
//! One [`World`] is one level attempt. Adapters and systems mutate it
//! exclusively through [`apply`], which executes a [`Command`] and broadcasts
//! the resulting [`Event`] values; reads go through the [`query`] module.
//! The world owns the terrain, the coordinate space, the insertion-ordered
//! actor collection (draw order is insertion order), the game-mode state
//! machine, the clone inventory, and all click-routing business logic.

mod actor;
mod terrain;

use gridshade_core::{
    ActorId, Cell, CloneProfile, Command, CoordinateSpace, Event, GameMode, GuardSpec, LevelError,
    LevelSpec, LoopPolicy, Rgba, ScreenPoint, SpaceKind,
};

use crate::{
    actor::{Actor, Role},
    terrain::TerrainGrid,
};

const PLAYER_SPEED: f64 = 1.0;
const PLAYER_COLOR: Rgba = Rgba::from_rgb(0, 255, 0);
const GUARD_COLOR: Rgba = Rgba::from_rgb(100, 100, 100);
const WALL_COLOR: Rgba = Rgba::from_rgb(50, 50, 50);
const END_COLOR: Rgba = Rgba::from_rgb(255, 255, 0);

/// Viewport partition shared by click routing and the side panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelLayout {
    viewport_width: i32,
    panel_width: i32,
    height: i32,
}

impl PanelLayout {
    /// Width of the simulation viewport in device pixels.
    #[must_use]
    pub const fn viewport_width(&self) -> i32 {
        self.viewport_width
    }

    /// Width of the side panel in device pixels.
    #[must_use]
    pub const fn panel_width(&self) -> i32 {
        self.panel_width
    }

    /// Height shared by the viewport and the side panel.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }
}

/// Represents one authoritative Gridshade level attempt.
#[derive(Debug)]
pub struct World {
    space: CoordinateSpace,
    terrain: TerrainGrid,
    mode: GameMode,
    actors: Vec<Actor>,
    selected: Option<ActorId>,
    player: ActorId,
    end_cell: Cell,
    clone_profiles: Vec<CloneProfile>,
    clones_left: Vec<u32>,
    armed_clone: Option<usize>,
    layout: Option<PanelLayout>,
    tick_index: u64,
    next_actor_id: u32,
}

impl World {
    /// Builds a level attempt from a blueprint and the clone profile table.
    ///
    /// `cell_size` is the initial cell pixel size; a later
    /// [`Command::ConfigureLayout`] replaces it once the host has measured
    /// its surface.
    pub fn from_level(
        spec: &LevelSpec,
        profiles: &[CloneProfile],
        cell_size: i32,
    ) -> Result<Self, LevelError> {
        if spec.space != SpaceKind::Grid {
            return Err(LevelError::UnsupportedSpace { kind: spec.space });
        }

        let parsed = terrain::parse_layout(&spec.layout)?;
        let space = CoordinateSpace::grid(
            ScreenPoint::new(0, 0),
            cell_size,
            parsed.terrain.columns(),
            parsed.terrain.rows(),
        );

        if spec.clones.len() > profiles.len() {
            return Err(LevelError::TooManyCloneKinds {
                requested: spec.clones.len(),
                known: profiles.len(),
            });
        }

        let mut next_actor_id = 0;
        let mut actors = Vec::new();
        for wall in &parsed.walls {
            actors.push(Actor::wall(
                allocate_id(&mut next_actor_id),
                *wall,
                WALL_COLOR,
            ));
        }
        actors.push(Actor::end_marker(
            allocate_id(&mut next_actor_id),
            parsed.end,
            END_COLOR,
        ));
        for guard in &spec.guards {
            actors.push(build_guard(allocate_id(&mut next_actor_id), guard, &space)?);
        }
        let player = allocate_id(&mut next_actor_id);
        actors.push(Actor::unit(
            player,
            Role::Player,
            parsed.start,
            PLAYER_SPEED,
            PLAYER_COLOR,
        ));

        let mut world = Self {
            space,
            terrain: parsed.terrain,
            mode: GameMode::Plan,
            actors,
            selected: Some(player),
            player,
            end_cell: parsed.end,
            clone_profiles: profiles.to_vec(),
            clones_left: spec.clones.clone(),
            armed_clone: None,
            layout: None,
            tick_index: 0,
            next_actor_id,
        };
        world.refresh_actors();
        Ok(world)
    }

    fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.iter().find(|actor| actor.id() == id)
    }

    fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|actor| actor.id() == id)
    }

    fn refresh_actors(&mut self) {
        let Self {
            actors,
            space,
            terrain,
            tick_index,
            ..
        } = self;
        for actor in actors.iter_mut() {
            actor.refresh(*tick_index, space);
            actor.refresh_vision(space, terrain);
        }
    }

    fn player_cell(&self) -> Cell {
        self.actor(self.player)
            .map(|actor| actor.cell(&self.space))
            .unwrap_or(self.end_cell)
    }

    fn set_mode(&mut self, mode: GameMode, out_events: &mut Vec<Event>) {
        if self.mode != mode {
            self.mode = mode;
            out_events.push(Event::ModeChanged { mode });
        }
    }

    fn select(&mut self, selection: Option<ActorId>, out_events: &mut Vec<Event>) {
        if self.selected != selection {
            self.selected = selection;
            out_events.push(Event::SelectionChanged {
                selected: selection,
            });
        }
    }

    fn handle_click(&mut self, at: ScreenPoint, out_events: &mut Vec<Event>) {
        if self.mode.is_terminal() {
            return;
        }
        let Some(layout) = self.layout else {
            return;
        };
        if at.x() < layout.viewport_width {
            self.handle_viewport_click(at, out_events);
        } else {
            let local = ScreenPoint::new(at.x() - layout.viewport_width, at.y());
            self.handle_panel_click(local, layout, out_events);
        }
    }

    fn handle_viewport_click(&mut self, at: ScreenPoint, out_events: &mut Vec<Event>) {
        if self.mode == GameMode::Execute {
            // Clicks never alter plans mid-execution; they pause instead.
            self.set_mode(GameMode::Plan, out_events);
            return;
        }

        let click_cell = self.space.screen_to_pos(at);

        if let Some(profile) = self.armed_clone {
            let distance = self.space.distance(click_cell, self.player_cell());
            if distance == 1 && self.terrain.is_passable(click_cell) {
                self.spawn_clone(profile, click_cell, out_events);
            } else {
                self.disarm(out_events);
            }
            return;
        }

        if let Some(selected) = self.selected {
            let terminus = self
                .actor(selected)
                .map(Actor::last_path_cell)
                .unwrap_or(click_cell);
            let distance = self.space.distance(click_cell, terminus);
            if distance == 1 && self.terrain.is_passable(click_cell) {
                if let Some(actor) = self.actor_mut(selected) {
                    actor.append_waypoint(click_cell);
                    out_events.push(Event::PathExtended {
                        actor: selected,
                        cell: click_cell,
                    });
                }
            } else if distance >= 2 {
                let hit = self.hit_test(at);
                self.select(hit, out_events);
            }
            // A distance-0 click on the plan terminus is a no-op.
        } else {
            let hit = self.hit_test(at);
            self.select(hit, out_events);
        }
    }

    fn handle_panel_click(
        &mut self,
        local: ScreenPoint,
        layout: PanelLayout,
        out_events: &mut Vec<Event>,
    ) {
        if local.y() < layout.height / 4 {
            match self.mode {
                GameMode::Execute => self.set_mode(GameMode::Plan, out_events),
                GameMode::Plan => {
                    self.select(None, out_events);
                    self.set_mode(GameMode::Execute, out_events);
                }
                GameMode::Success | GameMode::Failure => {}
            }
            return;
        }

        if self.mode == GameMode::Execute {
            self.set_mode(GameMode::Plan, out_events);
        }

        let row_height = layout.height / 8;
        if row_height <= 0 {
            return;
        }
        let row = local.y() / row_height - 2;
        if row < 0 {
            return;
        }

        // Find the row'th clone profile that still has inventory.
        let mut position = 0;
        for (profile, count) in self.clones_left.iter().enumerate() {
            if *count > 0 {
                if position == row as usize {
                    self.arm_clone(profile, out_events);
                    return;
                }
                position += 1;
            }
        }
    }

    fn arm_clone(&mut self, profile: usize, out_events: &mut Vec<Event>) {
        self.armed_clone = Some(profile);
        self.select(None, out_events);
        out_events.push(Event::CloneArmed { profile });
    }

    fn disarm(&mut self, out_events: &mut Vec<Event>) {
        if self.armed_clone.take().is_some() {
            out_events.push(Event::CloneDisarmed);
        }
    }

    fn spawn_clone(&mut self, profile: usize, cell: Cell, out_events: &mut Vec<Event>) {
        self.armed_clone = None;
        let definition = self.clone_profiles[profile];
        let id = allocate_id(&mut self.next_actor_id);
        let mut clone = Actor::unit(
            id,
            Role::Clone { profile },
            cell,
            definition.speed,
            definition.color,
        );
        clone.refresh(self.tick_index, &self.space);
        self.actors.push(clone);
        self.clones_left[profile] -= 1;
        out_events.push(Event::CloneSpawned {
            actor: id,
            profile,
            cell,
        });
    }

    /// Finds the selectable actor closest to the click, if any qualifies.
    ///
    /// An actor qualifies when its interpolated screen position lies within
    /// half a grid cell of the click on both axes; the smallest squared pixel
    /// distance wins and exact ties keep the first-inserted actor.
    fn hit_test(&self, at: ScreenPoint) -> Option<ActorId> {
        let half = i64::from(self.space.cell_size() / 2);
        let mut best: Option<(ActorId, i64)> = None;
        for actor in &self.actors {
            if !actor.role().is_selectable() {
                continue;
            }
            let position = actor.screen_position();
            let dx = i64::from(position.x() - at.x());
            let dy = i64::from(position.y() - at.y());
            if dx.abs() <= half && dy.abs() <= half {
                let squared = dx * dx + dy * dy;
                if best.map_or(true, |(_, smallest)| squared < smallest) {
                    best = Some((actor.id(), squared));
                }
            }
        }
        best.map(|(id, _)| id)
    }
}

fn allocate_id(counter: &mut u32) -> ActorId {
    let id = ActorId::new(*counter);
    *counter += 1;
    id
}

fn build_guard(id: ActorId, spec: &GuardSpec, space: &CoordinateSpace) -> Result<Actor, LevelError> {
    match spec {
        GuardSpec::Stationary {
            cell,
            range,
            facing,
        } => Ok(Actor::stationary_guard(
            id,
            *cell,
            *range,
            *facing,
            GUARD_COLOR,
        )),
        GuardSpec::Rotating {
            cell,
            range,
            facings,
            policy,
        } => {
            if facings.len() < 2 {
                return Err(LevelError::ShortRotation {
                    len: facings.len(),
                });
            }
            Ok(Actor::rotating_guard(
                id,
                *cell,
                *range,
                facings.clone(),
                *policy,
                GUARD_COLOR,
            ))
        }
        GuardSpec::Patrolling {
            waypoints,
            range,
            policy,
        } => {
            if waypoints.len() < 2 {
                return Err(LevelError::ShortPatrol {
                    len: waypoints.len(),
                });
            }
            for step in waypoints.windows(2) {
                let _ = space
                    .direction_between(step[0], step[1])
                    .map_err(|_| LevelError::BrokenPatrol {
                        from: step[0],
                        to: step[1],
                    })?;
            }
            let first = waypoints[0];
            let last = waypoints[waypoints.len() - 1];
            if *policy == LoopPolicy::Restart && first != last {
                return Err(LevelError::OpenPatrolLoop { first, last });
            }
            Ok(Actor::patrolling_guard(
                id,
                waypoints.clone(),
                *range,
                *policy,
                GUARD_COLOR,
            ))
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureLayout {
            viewport_width,
            panel_width,
            height,
            cell_size,
        } => {
            world.space.set_cell_size(cell_size);
            world.layout = Some(PanelLayout {
                viewport_width,
                panel_width,
                height,
            });
            world.refresh_actors();
        }
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            if world.mode == GameMode::Execute {
                for index in 0..world.actors.len() {
                    let crossed = world.actors[index].advance(dt);
                    if crossed {
                        out_events.push(Event::PathEnded {
                            actor: world.actors[index].id(),
                        });
                    }
                }
            }

            world.refresh_actors();

            if world.mode == GameMode::Execute && world.player_cell() == world.end_cell {
                world.set_mode(GameMode::Success, out_events);
            }
        }
        Command::Click { at } => world.handle_click(at, out_events),
        Command::ReportSighting { guard, target } => {
            if world.mode != GameMode::Execute {
                return;
            }
            let Some(actor) = world.actor_mut(guard) else {
                return;
            };
            let Some(state) = actor.guard_mut() else {
                return;
            };
            state.start_celebrating();
            out_events.push(Event::IntruderSighted { guard, target });
            world.set_mode(GameMode::Failure, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{actor::Role, World};
    use gridshade_core::{ActorId, Cell, DirectionIndex, GameMode, Rgba, ScreenPoint};

    /// Retrieves the active game mode.
    #[must_use]
    pub fn mode(world: &World) -> GameMode {
        world.mode
    }

    /// Identifier of the player unit.
    #[must_use]
    pub fn player(world: &World) -> ActorId {
        world.player
    }

    /// Currently selected unit, if any.
    #[must_use]
    pub fn selected(world: &World) -> Option<ActorId> {
        world.selected
    }

    /// The level's goal cell.
    #[must_use]
    pub fn end_cell(world: &World) -> Cell {
        world.end_cell
    }

    /// Remaining inventory per clone profile.
    #[must_use]
    pub fn clones_remaining(world: &World) -> &[u32] {
        &world.clones_left
    }

    /// Index of the armed clone profile, if placement is active.
    #[must_use]
    pub fn armed_clone(world: &World) -> Option<usize> {
        world.armed_clone
    }

    /// Viewport partition, once a layout event configured it.
    #[must_use]
    pub fn layout(world: &World) -> Option<super::PanelLayout> {
        world.layout
    }

    /// Grid dimensions and current cell pixel size.
    #[must_use]
    pub fn grid(world: &World) -> GridView {
        GridView {
            columns: world.space.columns(),
            rows: world.space.rows(),
            cell_size: world.space.cell_size(),
        }
    }

    /// Captures the drawable state of every actor in draw order.
    ///
    /// The order is the world's insertion order, not id order: hosts draw
    /// snapshots exactly in the order returned here.
    #[must_use]
    pub fn actor_view(world: &World) -> Vec<ActorSnapshot> {
        world
            .actors
            .iter()
            .map(|actor| {
                debug_assert_eq!(actor.cache_stamp(), world.tick_index);
                ActorSnapshot {
                    id: actor.id(),
                    kind: match actor.role() {
                        Role::Wall => ActorKind::Wall,
                        Role::EndMarker => ActorKind::EndMarker,
                        Role::Player => ActorKind::Player,
                        Role::Clone { profile } => ActorKind::Clone { profile: *profile },
                        Role::Guard(_) => ActorKind::Guard,
                    },
                    color: actor.color(),
                    screen: actor.screen_position(),
                    cell: actor.cell(&world.space),
                    selected: world.selected == Some(actor.id()),
                    trail: actor.remaining_trail(&world.space),
                    vision: actor.guard().map(|guard| VisionSnapshot {
                        cells: actor.vision_cells(&world.space),
                        facing: guard.facing(),
                        reach: guard.visible(),
                        celebrating: guard.is_celebrating(),
                    }),
                }
            })
            .collect()
    }

    /// Captures each guard's visible cells for the detection system.
    #[must_use]
    pub fn guard_vision(world: &World) -> Vec<GuardVision> {
        world
            .actors
            .iter()
            .filter(|actor| actor.guard().is_some())
            .map(|actor| GuardVision {
                guard: actor.id(),
                cells: actor.vision_cells(&world.space),
            })
            .collect()
    }

    /// Captures the cell of every unit a guard could sight.
    #[must_use]
    pub fn intruders(world: &World) -> Vec<Intruder> {
        world
            .actors
            .iter()
            .filter(|actor| actor.role().is_selectable())
            .map(|actor| Intruder {
                id: actor.id(),
                cell: actor.cell(&world.space),
                is_player: actor.id() == world.player,
            })
            .collect()
    }

    /// Side-panel rows: one per clone profile with remaining inventory,
    /// in profile order.
    #[must_use]
    pub fn clone_rows(world: &World) -> Vec<CloneRow> {
        world
            .clones_left
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(profile, count)| CloneRow {
                profile,
                color: world.clone_profiles[profile].color,
                remaining: *count,
            })
            .collect()
    }

    /// Cells to highlight while a clone type is armed for placement.
    #[must_use]
    pub fn placement_preview(world: &World) -> Option<PlacementPreview> {
        let profile = world.armed_clone?;
        Some(PlacementPreview {
            color: world.clone_profiles[profile].color,
            cells: world.space.neighbors(world.player_cell()),
        })
    }

    /// Grid dimensions and projection state.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct GridView {
        /// Number of columns in the level grid.
        pub columns: i32,
        /// Number of rows in the level grid.
        pub rows: i32,
        /// Current pixel size of a single cell.
        pub cell_size: i32,
    }

    /// Immutable representation of a single actor's drawable state.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct ActorSnapshot {
        /// Identifier assigned to the actor.
        pub id: ActorId,
        /// Behavior classification of the actor.
        pub kind: ActorKind,
        /// Body color.
        pub color: Rgba,
        /// Interpolated screen position.
        pub screen: ScreenPoint,
        /// Grid cell occupied by the interpolated position.
        pub cell: Cell,
        /// Whether this actor is the current selection.
        pub selected: bool,
        /// Unfinished path: current position followed by remaining waypoints.
        pub trail: Vec<ScreenPoint>,
        /// Guard vision state, present for guards only.
        pub vision: Option<VisionSnapshot>,
    }

    /// Behavior classification carried by actor snapshots.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum ActorKind {
        /// Impassable terrain block.
        Wall,
        /// Marker drawn on the goal tile.
        EndMarker,
        /// The player unit.
        Player,
        /// A placed clone unit.
        Clone {
            /// Index of the profile that spawned the clone.
            profile: usize,
        },
        /// A guard of any behavior variant.
        Guard,
    }

    /// Guard vision state captured for drawing and detection.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct VisionSnapshot {
        /// Covered cells, starting at the guard's own cell.
        pub cells: Vec<Cell>,
        /// Current facing direction.
        pub facing: DirectionIndex,
        /// Number of visible cells along the facing direction.
        pub reach: u32,
        /// Whether the guard is celebrating a sighting.
        pub celebrating: bool,
    }

    /// A guard's visible cells, for the detection system.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct GuardVision {
        /// Guard identifier.
        pub guard: ActorId,
        /// Covered cells, starting at the guard's own cell.
        pub cells: Vec<Cell>,
    }

    /// A unit the guards could sight.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Intruder {
        /// Unit identifier.
        pub id: ActorId,
        /// Cell the unit currently occupies.
        pub cell: Cell,
        /// Whether the unit is the player rather than a clone.
        pub is_player: bool,
    }

    /// Side-panel row describing an available clone type.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CloneRow {
        /// Index of the clone profile.
        pub profile: usize,
        /// Display color of the clone type.
        pub color: Rgba,
        /// Remaining inventory of the clone type.
        pub remaining: u32,
    }

    /// Placement highlight: the armed type's color over the player's
    /// neighbor cells.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct PlacementPreview {
        /// Color of the armed clone type.
        pub color: Rgba,
        /// In-bounds neighbor cells of the player unit.
        pub cells: Vec<Cell>,
    }
}
