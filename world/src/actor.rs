//! Actors inhabiting a level: walls, markers, player units, clones, guards.
//!
//! An actor owns an ordered waypoint path and a fractional progress along it,
//! measured in path segments. Guards additionally carry a behavior state
//! machine and a terrain-clipped line of sight.

use std::time::Duration;

use gridshade_core::{ActorId, Cell, CoordinateSpace, DirectionIndex, LoopPolicy, Rgba, ScreenPoint};

use crate::terrain::TerrainGrid;

/// Shared cadence of guard state machines: how long a guard celebrates a
/// sighting, and how long a rotating guard holds each facing.
pub(crate) const SHIFT_PERIOD: Duration = Duration::from_millis(2500);

/// Patrolling guards walk at half the player's pace.
pub(crate) const PATROL_SPEED: f64 = 0.5;

/// Screen-position cache stamped with the tick that computed it.
#[derive(Clone, Copy, Debug)]
struct CachedPoint {
    stamp: u64,
    point: ScreenPoint,
}

/// One object inside a level, drawn in insertion order.
#[derive(Clone, Debug)]
pub(crate) struct Actor {
    id: ActorId,
    role: Role,
    color: Rgba,
    path: Vec<Cell>,
    progress: f64,
    speed: f64,
    at_path_end: bool,
    cache: CachedPoint,
}

/// Behavior classification of an actor.
#[derive(Clone, Debug)]
pub(crate) enum Role {
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
    /// A guard with its behavior state machine.
    Guard(GuardState),
}

impl Role {
    /// Reports whether the actor participates in selection and hit-testing.
    pub(crate) fn is_selectable(&self) -> bool {
        matches!(self, Self::Player | Self::Clone { .. })
    }
}

/// Dynamic state shared by every guard variant.
#[derive(Clone, Debug)]
pub(crate) struct GuardState {
    range: u32,
    visible: u32,
    facing: DirectionIndex,
    celebrated: Duration,
    behavior: GuardBehavior,
}

/// Variant-specific guard behavior state.
#[derive(Clone, Debug)]
pub(crate) enum GuardBehavior {
    /// Facing fixed at construction.
    Stationary,
    /// Cycles through an ordered facing list on the shared cadence.
    Rotating {
        /// Ordered facing sequence, at least two entries.
        facings: Vec<DirectionIndex>,
        /// Policy applied at the end of the sequence.
        policy: LoopPolicy,
        /// Signed cursor; negative values walk the sequence backwards
        /// without repeating the endpoints.
        cursor: i32,
        /// Time accumulated toward the next rotation step.
        accumulator: Duration,
    },
    /// Walks the actor's own path as a patrol loop.
    Patrolling {
        /// Policy applied when the patrol reaches its final waypoint.
        policy: LoopPolicy,
    },
}

impl GuardState {
    /// Reports whether the guard is still celebrating a sighting.
    pub(crate) fn is_celebrating(&self) -> bool {
        self.celebrated < SHIFT_PERIOD
    }

    /// Restarts the celebration timer after a sighting.
    pub(crate) fn start_celebrating(&mut self) {
        self.celebrated = Duration::ZERO;
    }

    /// Current facing direction.
    pub(crate) fn facing(&self) -> DirectionIndex {
        self.facing
    }

    /// Number of cells currently visible along the facing direction.
    pub(crate) fn visible(&self) -> u32 {
        self.visible
    }

    fn advance_timers(&mut self, dt: Duration) {
        if self.is_celebrating() {
            self.celebrated = self.celebrated.saturating_add(dt);
        }
        if let GuardBehavior::Rotating {
            facings,
            policy,
            cursor,
            accumulator,
        } = &mut self.behavior
        {
            *accumulator = accumulator.saturating_add(dt);
            while *accumulator >= SHIFT_PERIOD {
                *accumulator -= SHIFT_PERIOD;
                *cursor = rotate_cursor(*cursor, facings.len(), *policy);
                self.facing = facings[cursor.unsigned_abs() as usize];
            }
        }
    }
}

/// Steps a rotation cursor, bouncing without repeating the endpoints.
///
/// The cursor is signed: negative values index the sequence by absolute
/// value while walking it backwards, so a four-entry bounce visits
/// `0 1 2 3 2 1 0 1 …`.
fn rotate_cursor(cursor: i32, len: usize, policy: LoopPolicy) -> i32 {
    if cursor == len as i32 - 1 {
        match policy {
            LoopPolicy::Restart => 0,
            LoopPolicy::Bounce => -(len as i32 - 2),
        }
    } else {
        cursor + 1
    }
}

impl Actor {
    /// Creates a stationary terrain block.
    pub(crate) fn wall(id: ActorId, cell: Cell, color: Rgba) -> Self {
        Self::with_role(id, Role::Wall, cell, 0.0, color)
    }

    /// Creates the goal-tile marker.
    pub(crate) fn end_marker(id: ActorId, cell: Cell, color: Rgba) -> Self {
        Self::with_role(id, Role::EndMarker, cell, 0.0, color)
    }

    /// Creates a selectable unit (the player or a clone).
    pub(crate) fn unit(id: ActorId, role: Role, cell: Cell, speed: f64, color: Rgba) -> Self {
        Self::with_role(id, role, cell, speed, color)
    }

    /// Creates a guard that never turns.
    pub(crate) fn stationary_guard(
        id: ActorId,
        cell: Cell,
        range: u32,
        facing: DirectionIndex,
        color: Rgba,
    ) -> Self {
        let role = Role::Guard(GuardState {
            range,
            visible: range,
            facing,
            celebrated: SHIFT_PERIOD,
            behavior: GuardBehavior::Stationary,
        });
        Self::with_role(id, role, cell, 0.0, color)
    }

    /// Creates a guard that cycles through the provided facing sequence.
    ///
    /// The sequence length is validated during level construction.
    pub(crate) fn rotating_guard(
        id: ActorId,
        cell: Cell,
        range: u32,
        facings: Vec<DirectionIndex>,
        policy: LoopPolicy,
        color: Rgba,
    ) -> Self {
        let facing = facings[0];
        let role = Role::Guard(GuardState {
            range,
            visible: range,
            facing,
            celebrated: SHIFT_PERIOD,
            behavior: GuardBehavior::Rotating {
                facings,
                policy,
                cursor: 0,
                accumulator: Duration::ZERO,
            },
        });
        Self::with_role(id, role, cell, 0.0, color)
    }

    /// Creates a guard walking the provided waypoint loop.
    ///
    /// Waypoint count, adjacency and restart endpoints are validated during
    /// level construction.
    pub(crate) fn patrolling_guard(
        id: ActorId,
        waypoints: Vec<Cell>,
        range: u32,
        policy: LoopPolicy,
        color: Rgba,
    ) -> Self {
        let start = waypoints[0];
        let role = Role::Guard(GuardState {
            range,
            visible: range,
            facing: DirectionIndex::new(0),
            celebrated: SHIFT_PERIOD,
            behavior: GuardBehavior::Patrolling { policy },
        });
        let mut actor = Self::with_role(id, role, start, PATROL_SPEED, color);
        actor.path = waypoints;
        actor.at_path_end = actor.path.len() < 2;
        actor
    }

    fn with_role(id: ActorId, role: Role, cell: Cell, speed: f64, color: Rgba) -> Self {
        Self {
            id,
            role,
            color,
            path: vec![cell],
            progress: 0.0,
            speed,
            at_path_end: true,
            cache: CachedPoint {
                stamp: 0,
                point: ScreenPoint::new(0, 0),
            },
        }
    }

    /// Identifier assigned by the world.
    pub(crate) fn id(&self) -> ActorId {
        self.id
    }

    /// Behavior classification.
    pub(crate) fn role(&self) -> &Role {
        &self.role
    }

    /// Body color.
    pub(crate) fn color(&self) -> Rgba {
        self.color
    }

    /// Guard state, when the actor is a guard.
    pub(crate) fn guard(&self) -> Option<&GuardState> {
        match &self.role {
            Role::Guard(state) => Some(state),
            _ => None,
        }
    }

    /// Mutable guard state, when the actor is a guard.
    pub(crate) fn guard_mut(&mut self) -> Option<&mut GuardState> {
        match &mut self.role {
            Role::Guard(state) => Some(state),
            _ => None,
        }
    }

    /// Final waypoint of the planned path.
    pub(crate) fn last_path_cell(&self) -> Cell {
        self.path[self.path.len() - 1]
    }

    /// Appends a waypoint to the planned path.
    ///
    /// Adjacency is the caller's responsibility; the world validates clicks
    /// before extending plans.
    pub(crate) fn append_waypoint(&mut self, cell: Cell) {
        self.path.push(cell);
        self.at_path_end = false;
    }

    /// Advances motion and behavior timers.
    ///
    /// Returns `true` when the path end was crossed during this tick; the
    /// crossing fires at most once until the path changes again.
    pub(crate) fn advance(&mut self, dt: Duration) -> bool {
        let crossed = self.advance_motion(dt);
        if crossed {
            self.on_path_end();
        }
        if let Role::Guard(guard) = &mut self.role {
            guard.advance_timers(dt);
        }
        crossed
    }

    fn advance_motion(&mut self, dt: Duration) -> bool {
        self.progress += dt.as_secs_f64() * self.speed;
        let last = (self.path.len() - 1) as f64;
        if self.progress >= last {
            self.progress = last;
            if !self.at_path_end {
                self.at_path_end = true;
                return true;
            }
        }
        false
    }

    fn on_path_end(&mut self) {
        if let Role::Guard(GuardState {
            behavior: GuardBehavior::Patrolling { policy },
            ..
        }) = &self.role
        {
            if *policy == LoopPolicy::Bounce {
                self.path.reverse();
            }
            self.progress = 0.0;
            self.at_path_end = self.path.len() < 2;
        }
    }

    /// Recomputes the cached screen position and, for patrolling guards, the
    /// facing derived from the current path segment.
    pub(crate) fn refresh(&mut self, tick: u64, space: &CoordinateSpace) {
        self.cache = CachedPoint {
            stamp: tick,
            point: interpolate_along(&self.path, self.progress, space),
        };
        if let Role::Guard(guard) = &mut self.role {
            if matches!(guard.behavior, GuardBehavior::Patrolling { .. }) {
                if let Some(facing) = heading_along(&self.path, self.progress, space) {
                    guard.facing = facing;
                }
            }
        }
    }

    /// Recomputes the terrain-clipped line of sight of a guard.
    ///
    /// Must run after [`Self::refresh`] so the walk starts from the cell the
    /// interpolated position occupies.
    pub(crate) fn refresh_vision(&mut self, space: &CoordinateSpace, terrain: &TerrainGrid) {
        let origin = space.screen_to_pos(self.cache.point);
        if let Role::Guard(guard) = &mut self.role {
            let mut reach = 0;
            let mut cursor = origin;
            while reach < guard.range {
                let next = space.neighbor_in_direction(cursor, guard.facing);
                if !terrain.is_passable(next) {
                    break;
                }
                reach += 1;
                cursor = next;
            }
            guard.visible = reach;
        }
    }

    /// Interpolated screen position computed by the most recent refresh.
    pub(crate) fn screen_position(&self) -> ScreenPoint {
        self.cache.point
    }

    /// Tick stamp of the cached screen position.
    pub(crate) fn cache_stamp(&self) -> u64 {
        self.cache.stamp
    }

    /// Grid cell occupied by the interpolated position.
    pub(crate) fn cell(&self, space: &CoordinateSpace) -> Cell {
        space.screen_to_pos(self.cache.point)
    }

    /// Cells covered by a guard's current line of sight, starting at the
    /// guard's own cell.
    pub(crate) fn vision_cells(&self, space: &CoordinateSpace) -> Vec<Cell> {
        let Some(guard) = self.guard() else {
            return Vec::new();
        };
        let mut cells = Vec::with_capacity(guard.visible as usize + 1);
        let mut cursor = self.cell(space);
        cells.push(cursor);
        for _ in 0..guard.visible {
            cursor = space.neighbor_in_direction(cursor, guard.facing);
            cells.push(cursor);
        }
        cells
    }

    /// Screen positions of the unfinished part of the path: the interpolated
    /// current position followed by every remaining waypoint.
    ///
    /// Empty when the actor has nothing left to traverse.
    pub(crate) fn remaining_trail(&self, space: &CoordinateSpace) -> Vec<ScreenPoint> {
        let index = self.progress as usize;
        if index >= self.path.len() - 1 {
            return Vec::new();
        }
        let mut trail = Vec::with_capacity(self.path.len() - index);
        trail.push(self.cache.point);
        for waypoint in &self.path[index + 1..] {
            trail.push(space.pos_to_screen(*waypoint));
        }
        trail
    }
}

/// Linear interpolation along a waypoint path, truncated to integer pixels.
fn interpolate_along(path: &[Cell], progress: f64, space: &CoordinateSpace) -> ScreenPoint {
    let index = progress as usize;
    if index >= path.len() - 1 {
        return space.pos_to_screen(path[path.len() - 1]);
    }
    let blend = progress - index as f64;
    let a = space.pos_to_screen(path[index]);
    let b = space.pos_to_screen(path[index + 1]);
    ScreenPoint::new(lerp(a.x(), b.x(), blend), lerp(a.y(), b.y(), blend))
}

fn lerp(a: i32, b: i32, t: f64) -> i32 {
    (a as f64 * (1.0 - t) + b as f64 * t) as i32
}

/// Facing along the path segment the progress currently occupies.
///
/// At the final waypoint the heading looks backward along the last segment
/// instead of forward past the end.
fn heading_along(path: &[Cell], progress: f64, space: &CoordinateSpace) -> Option<DirectionIndex> {
    if path.len() < 2 {
        return None;
    }
    let index = progress as usize;
    let (a, b) = if index >= path.len() - 1 {
        (path[path.len() - 2], path[path.len() - 1])
    } else {
        (path[index], path[index + 1])
    };
    space.direction_between(a, b).ok()
}

#[cfg(test)]
mod tests {
    use super::{Actor, Role, PATROL_SPEED, SHIFT_PERIOD};
    use crate::terrain::parse_layout;
    use gridshade_core::{
        ActorId, Cell, CoordinateSpace, DirectionIndex, LoopPolicy, Rgba, ScreenPoint,
    };
    use std::time::Duration;

    const BODY: Rgba = Rgba::from_rgb(0, 255, 0);

    fn space() -> CoordinateSpace {
        CoordinateSpace::grid(ScreenPoint::new(0, 0), 100, 9, 6)
    }

    fn unit_with_path(cells: &[Cell], speed: f64) -> Actor {
        let mut actor = Actor::unit(ActorId::new(1), Role::Player, cells[0], speed, BODY);
        for cell in &cells[1..] {
            actor.append_waypoint(*cell);
        }
        actor
    }

    #[test]
    fn interpolates_the_midpoint_after_half_a_second() {
        let space = space();
        let mut actor = unit_with_path(&[Cell::new(0, 0), Cell::new(2, 0)], 1.0);
        let crossed = actor.advance(Duration::from_millis(500));
        actor.refresh(1, &space);
        assert!(!crossed);
        // Waypoint centers are (50, 50) and (250, 50); halfway is x = 150.
        assert_eq!(actor.screen_position(), ScreenPoint::new(150, 50));
    }

    #[test]
    fn clamps_progress_and_crosses_the_end_exactly_once() {
        let space = space();
        let mut actor = unit_with_path(&[Cell::new(0, 0), Cell::new(2, 0)], 1.0);
        let crossed = actor.advance(Duration::from_millis(2000));
        actor.refresh(1, &space);
        assert!(crossed);
        assert_eq!(actor.screen_position(), space.pos_to_screen(Cell::new(2, 0)));

        let crossed_again = actor.advance(Duration::from_millis(16));
        assert!(!crossed_again);
    }

    #[test]
    fn appending_a_waypoint_rearms_the_end_crossing() {
        let mut actor = unit_with_path(&[Cell::new(0, 0), Cell::new(1, 0)], 1.0);
        assert!(actor.advance(Duration::from_millis(1000)));
        actor.append_waypoint(Cell::new(2, 0));
        assert!(actor.advance(Duration::from_millis(1000)));
    }

    #[test]
    fn stationary_actors_never_cross() {
        let mut wall = Actor::wall(ActorId::new(2), Cell::new(3, 0), BODY);
        assert!(!wall.advance(Duration::from_millis(5000)));
    }

    #[test]
    fn rotating_guard_restart_wraps_to_the_first_facing() {
        let facings: Vec<DirectionIndex> = (0..4).map(DirectionIndex::new).collect();
        let mut guard = Actor::rotating_guard(
            ActorId::new(3),
            Cell::new(4, 4),
            3,
            facings,
            LoopPolicy::Restart,
            BODY,
        );

        let _ = guard.advance(SHIFT_PERIOD);
        assert_eq!(guard.guard().expect("guard").facing(), DirectionIndex::new(1));

        let _ = guard.advance(SHIFT_PERIOD * 3);
        assert_eq!(guard.guard().expect("guard").facing(), DirectionIndex::new(0));
    }

    #[test]
    fn rotating_guard_bounce_skips_the_endpoints() {
        let facings: Vec<DirectionIndex> = (0..4).map(DirectionIndex::new).collect();
        let mut guard = Actor::rotating_guard(
            ActorId::new(3),
            Cell::new(4, 4),
            3,
            facings,
            LoopPolicy::Bounce,
            BODY,
        );

        let mut seen = Vec::new();
        for _ in 0..8 {
            let _ = guard.advance(SHIFT_PERIOD);
            seen.push(guard.guard().expect("guard").facing().get());
        }
        assert_eq!(seen, vec![1, 2, 3, 2, 1, 0, 1, 2]);
    }

    #[test]
    fn rotation_catches_up_when_a_tick_spans_multiple_periods() {
        let facings: Vec<DirectionIndex> = (0..4).map(DirectionIndex::new).collect();
        let mut guard = Actor::rotating_guard(
            ActorId::new(3),
            Cell::new(4, 4),
            3,
            facings,
            LoopPolicy::Restart,
            BODY,
        );

        let _ = guard.advance(SHIFT_PERIOD * 2 + Duration::from_millis(100));
        assert_eq!(guard.guard().expect("guard").facing(), DirectionIndex::new(2));
    }

    #[test]
    fn patrol_bounce_reverses_the_route_in_place() {
        let space = space();
        let route = vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)];
        let mut guard =
            Actor::patrolling_guard(ActorId::new(4), route, 2, LoopPolicy::Bounce, BODY);
        guard.refresh(0, &space);

        // Two segments at half speed take four seconds.
        assert!(guard.advance(Duration::from_millis(4000)));
        guard.refresh(1, &space);
        assert_eq!(guard.cell(&space), Cell::new(2, 0));

        // After the bounce the guard walks back toward the origin.
        let _ = guard.advance(Duration::from_millis(2000));
        guard.refresh(2, &space);
        assert_eq!(guard.cell(&space), Cell::new(1, 0));
    }

    #[test]
    fn patrol_restart_snaps_back_to_the_loop_start() {
        let space = space();
        let route = vec![
            Cell::new(0, 0),
            Cell::new(1, 0),
            Cell::new(1, 1),
            Cell::new(0, 1),
            Cell::new(0, 0),
        ];
        let mut guard =
            Actor::patrolling_guard(ActorId::new(4), route, 2, LoopPolicy::Restart, BODY);
        guard.refresh(0, &space);

        // Four segments at half speed take eight seconds.
        assert!(guard.advance(Duration::from_millis(8000)));
        guard.refresh(1, &space);
        assert_eq!(guard.cell(&space), Cell::new(0, 0));

        // The loop continues from the shared endpoint without reversing.
        let _ = guard.advance(Duration::from_millis(2000));
        guard.refresh(2, &space);
        assert_eq!(guard.cell(&space), Cell::new(1, 0));
    }

    #[test]
    fn patrol_facing_follows_the_current_segment() {
        let space = space();
        let route = vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(1, 1)];
        let mut guard =
            Actor::patrolling_guard(ActorId::new(4), route, 2, LoopPolicy::Bounce, BODY);
        guard.refresh(0, &space);
        // First segment heads right.
        assert_eq!(guard.guard().expect("guard").facing(), DirectionIndex::new(0));

        let _ = guard.advance(Duration::from_millis(3000));
        guard.refresh(1, &space);
        // Second segment heads down.
        assert_eq!(guard.guard().expect("guard").facing(), DirectionIndex::new(3));
    }

    #[test]
    fn patrol_facing_survives_the_endpoint_crossing() {
        let space = space();
        let route = vec![Cell::new(0, 0), Cell::new(0, 1), Cell::new(0, 0)];
        let mut guard =
            Actor::patrolling_guard(ActorId::new(4), route, 2, LoopPolicy::Restart, BODY);
        guard.refresh(0, &space);
        assert_eq!(guard.guard().expect("guard").facing(), DirectionIndex::new(3));

        // Crossing the loop endpoint wraps the patrol and recomputes the
        // facing from the fresh first segment, never from past the path end.
        let seconds = 2.0 / PATROL_SPEED;
        let crossed = guard.advance(Duration::from_secs_f64(seconds));
        assert!(crossed);
        guard.refresh(1, &space);
        assert_eq!(guard.guard().expect("guard").facing(), DirectionIndex::new(3));
    }

    #[test]
    fn vision_stops_at_walls_and_at_range() {
        let space = space();
        let layout: Vec<String> = ["S..#.....", ".........", "....E...."]
            .iter()
            .map(|row| (*row).to_owned())
            .collect();
        let parsed = parse_layout(&layout).expect("valid layout");

        let mut guard = Actor::stationary_guard(
            ActorId::new(5),
            Cell::new(0, 0),
            5,
            DirectionIndex::new(0),
            BODY,
        );
        guard.refresh(0, &space);
        guard.refresh_vision(&space, &parsed.terrain);
        // Two open cells before the wall at x = 3.
        assert_eq!(guard.guard().expect("guard").visible(), 2);
        assert_eq!(
            guard.vision_cells(&space),
            vec![Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)]
        );

        let mut down_guard = Actor::stationary_guard(
            ActorId::new(6),
            Cell::new(8, 0),
            1,
            DirectionIndex::new(3),
            BODY,
        );
        down_guard.refresh(0, &space);
        down_guard.refresh_vision(&space, &parsed.terrain);
        // Range caps the walk before terrain does.
        assert_eq!(down_guard.guard().expect("guard").visible(), 1);
    }

    #[test]
    fn celebration_decays_back_to_idle() {
        let mut guard = Actor::stationary_guard(
            ActorId::new(7),
            Cell::new(0, 0),
            2,
            DirectionIndex::new(0),
            BODY,
        );
        assert!(!guard.guard().expect("guard").is_celebrating());

        guard.guard_mut().expect("guard").start_celebrating();
        assert!(guard.guard().expect("guard").is_celebrating());

        let _ = guard.advance(Duration::from_millis(1000));
        assert!(guard.guard().expect("guard").is_celebrating());

        let _ = guard.advance(Duration::from_millis(1600));
        assert!(!guard.guard().expect("guard").is_celebrating());
    }

    #[test]
    fn remaining_trail_covers_the_unfinished_waypoints() {
        let space = space();
        let mut actor = unit_with_path(&[Cell::new(0, 0), Cell::new(1, 0), Cell::new(2, 0)], 1.0);
        actor.refresh(0, &space);
        let trail = actor.remaining_trail(&space);
        assert_eq!(
            trail,
            vec![
                space.pos_to_screen(Cell::new(0, 0)),
                space.pos_to_screen(Cell::new(1, 0)),
                space.pos_to_screen(Cell::new(2, 0)),
            ]
        );

        let _ = actor.advance(Duration::from_millis(2000));
        actor.refresh(1, &space);
        assert!(actor.remaining_trail(&space).is_empty());
    }
}
