#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridshade engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.
//!
//! It also carries the level-blueprint vocabulary ([`LevelSpec`] and friends)
//! and the pluggable [`CoordinateSpace`] that maps logical cells to device
//! pixels.

pub mod space;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use space::{AdjacencyError, CoordinateSpace};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Gridshade.";

/// Describes the active phase of a level attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// Interactive planning: paths are extended and clones placed.
    Plan,
    /// The plan runs frame by frame; actors move autonomously.
    Execute,
    /// The player unit reached the end tile. Terminal for this attempt.
    Success,
    /// A guard sighted an intruder. Terminal for this attempt.
    Failure,
}

impl GameMode {
    /// Reports whether the attempt has ended and awaits a dismiss click.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Updates the viewport partition and cell pixel size after a layout or
    /// resize event.
    ConfigureLayout {
        /// Width of the simulation viewport in device pixels.
        viewport_width: i32,
        /// Width of the side panel in device pixels.
        panel_width: i32,
        /// Height shared by the viewport and the side panel.
        height: i32,
        /// Derived pixel size of a single grid cell.
        cell_size: i32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Routes a primary pointer-up event expressed in device pixels.
    Click {
        /// Screen location of the click.
        at: ScreenPoint,
    },
    /// Reports that a guard's line of sight covered an intruder.
    ///
    /// Emitted by the detection system; the world answers by starting the
    /// guard's celebration and failing the attempt when executing.
    ReportSighting {
        /// Guard whose vision covered the intruder.
        guard: ActorId,
        /// The sighted player or clone unit.
        target: ActorId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the level entered a new game mode.
    ModeChanged {
        /// Mode that became active after processing commands.
        mode: GameMode,
    },
    /// Announces that the selected unit changed.
    SelectionChanged {
        /// Newly selected unit, or `None` when the selection cleared.
        selected: Option<ActorId>,
    },
    /// Confirms that a planned path gained a waypoint.
    PathExtended {
        /// Unit whose plan was extended.
        actor: ActorId,
        /// Cell appended to the plan.
        cell: Cell,
    },
    /// Reports that an actor's progress reached the end of its path.
    ///
    /// Fires exactly once per crossing; a path reset re-arms it.
    PathEnded {
        /// Actor that finished traversing its path.
        actor: ActorId,
    },
    /// Announces that a clone type was armed for placement.
    CloneArmed {
        /// Index of the armed clone profile.
        profile: usize,
    },
    /// Announces that clone placement was cancelled without spawning.
    CloneDisarmed,
    /// Confirms that a clone unit was spawned next to the player.
    CloneSpawned {
        /// Identifier assigned to the new unit.
        actor: ActorId,
        /// Index of the clone profile that produced it.
        profile: usize,
        /// Cell the clone occupies after spawning.
        cell: Cell,
    },
    /// Confirms that a sighting report was accepted while executing.
    IntruderSighted {
        /// Guard that made the sighting.
        guard: ActorId,
        /// The unit that was sighted.
        target: ActorId,
    },
}

/// Unique identifier assigned to an actor by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(u32);

impl ActorId {
    /// Creates a new actor identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell.
///
/// Coordinates are signed so that directional math can represent transient
/// off-grid cells; bounds checks belong to the coordinate space and terrain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    x: i32,
    y: i32,
}

impl Cell {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the cell displaced by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Location expressed in device pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScreenPoint {
    x: i32,
    y: i32,
}

impl ScreenPoint {
    /// Creates a new screen point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal pixel coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical pixel coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

/// Index into a coordinate space's direction table.
///
/// The grid space exposes four directions; other topologies may expose more,
/// so directions are indices rather than a closed compass enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectionIndex(u8);

impl DirectionIndex {
    /// Creates a new direction index.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Retrieves the underlying table index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }
}

/// Byte RGBA color applied to actors and their derived visuals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    red: u8,
    green: u8,
    blue: u8,
    alpha: u8,
}

impl Rgba {
    /// Creates a new color from explicit channel values.
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::new(red, green, blue, 255)
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Alpha component of the color.
    #[must_use]
    pub const fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Returns the translucent half-intensity tint used for planned paths.
    #[must_use]
    pub const fn path_tint(&self) -> Self {
        Self::new(self.red / 2, self.green / 2, self.blue / 2, 160)
    }

    /// Returns the channel-inverted opaque color used for selection rings.
    #[must_use]
    pub const fn inverted(&self) -> Self {
        Self::new(255 - self.red, 255 - self.green, 255 - self.blue, 255)
    }
}

/// Classification of a single blueprint tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    /// Passable floor.
    Open,
    /// Impassable wall; becomes a wall actor at load time.
    Wall,
    /// The unique spawn tile of the player unit; passable after load.
    Start,
    /// The unique goal tile; becomes an end-marker actor, passable after load.
    End,
}

impl Tile {
    /// Maps a blueprint glyph to its tile classification.
    #[must_use]
    pub const fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' => Some(Self::Open),
            '#' => Some(Self::Wall),
            'S' => Some(Self::Start),
            'E' => Some(Self::End),
            _ => None,
        }
    }
}

/// Kind of coordinate space a level is laid out in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceKind {
    /// Square grid with four orthogonal directions.
    Grid,
    /// Hexagonal layout. Declared for level books but not yet constructible.
    Hex,
}

/// Policy applied when a cyclic guard sequence reaches its final entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPolicy {
    /// Jump back to the first entry.
    Restart,
    /// Walk the sequence backwards without repeating the endpoints.
    Bounce,
}

/// Movement and appearance parameters of one placeable clone type.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloneProfile {
    /// Traversal speed in cells per second.
    pub speed: f64,
    /// Body color of units spawned from this profile.
    pub color: Rgba,
}

impl CloneProfile {
    /// Creates a new clone profile.
    #[must_use]
    pub const fn new(speed: f64, color: Rgba) -> Self {
        Self { speed, color }
    }
}

/// Blueprint descriptor for a single guard.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GuardSpec {
    /// Guard that never moves or turns.
    Stationary {
        /// Cell the guard occupies.
        cell: Cell,
        /// Sight range in cells.
        range: u32,
        /// Fixed facing direction.
        facing: DirectionIndex,
    },
    /// Guard that cycles through an ordered list of facings on a timer.
    Rotating {
        /// Cell the guard occupies.
        cell: Cell,
        /// Sight range in cells.
        range: u32,
        /// Ordered facing sequence; must hold at least two entries.
        facings: Vec<DirectionIndex>,
        /// Policy applied at the end of the sequence.
        policy: LoopPolicy,
    },
    /// Guard that walks a waypoint loop at reduced speed.
    Patrolling {
        /// Waypoints of the patrol; consecutive entries must be adjacent.
        waypoints: Vec<Cell>,
        /// Sight range in cells.
        range: u32,
        /// Policy applied at the end of the patrol.
        policy: LoopPolicy,
    },
}

/// Immutable blueprint describing one level.
///
/// One blueprint produces one world instance per playthrough; resets and
/// retries construct a fresh world from the same blueprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelSpec {
    /// Human-readable level name shown by hosts.
    pub name: String,
    /// Coordinate space the layout is expressed in.
    pub space: SpaceKind,
    /// Layout rows using `.` (open), `#` (wall), `S` (start), `E` (end).
    pub layout: Vec<String>,
    /// Initial inventory per clone profile, in profile order.
    pub clones: Vec<u32>,
    /// Guards populating the level.
    pub guards: Vec<GuardSpec>,
}

/// Reasons level construction can fail.
///
/// Construction-time invariant violations are unrecoverable: the level cannot
/// be entered and the error surfaces to the host as a hard failure.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The layout defines no start tile.
    #[error("level defines no start tile")]
    MissingStart,
    /// The layout defines more than one start tile.
    #[error("level defines a second start tile at {cell:?}")]
    DuplicateStart {
        /// Location of the offending extra start tile.
        cell: Cell,
    },
    /// The layout defines no end tile.
    #[error("level defines no end tile")]
    MissingEnd,
    /// The layout defines more than one end tile.
    #[error("level defines a second end tile at {cell:?}")]
    DuplicateEnd {
        /// Location of the offending extra end tile.
        cell: Cell,
    },
    /// The layout has no rows or no columns.
    #[error("level layout is empty")]
    EmptyLayout,
    /// A layout row differs in length from the first row.
    #[error("level layout row {row} does not match the first row's width")]
    RaggedLayout {
        /// Zero-based index of the offending row.
        row: usize,
    },
    /// A layout row contains a glyph outside the `.#SE` vocabulary.
    #[error("unknown layout glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// The unrecognized character.
        glyph: char,
        /// Zero-based row of the glyph.
        row: usize,
        /// Zero-based column of the glyph.
        column: usize,
    },
    /// The blueprint requests more clone types than profiles exist.
    #[error("level wants {requested} clone types but only {known} are defined")]
    TooManyCloneKinds {
        /// Number of clone inventory entries in the blueprint.
        requested: usize,
        /// Number of known clone profiles.
        known: usize,
    },
    /// A rotating guard lists fewer than two facings.
    #[error("rotating guard needs at least 2 facings, got {len}")]
    ShortRotation {
        /// Number of facings provided.
        len: usize,
    },
    /// A patrolling guard lists fewer than two waypoints.
    #[error("patrol needs at least 2 waypoints, got {len}")]
    ShortPatrol {
        /// Number of waypoints provided.
        len: usize,
    },
    /// Two consecutive patrol waypoints are not one orthogonal step apart.
    #[error("patrol step from {from:?} to {to:?} is not a single orthogonal move")]
    BrokenPatrol {
        /// Waypoint the step departs from.
        from: Cell,
        /// Waypoint the step arrives at.
        to: Cell,
    },
    /// A restarting patrol does not start and end on the same cell.
    #[error("restarting patrol must start and end on the same cell, got {first:?} and {last:?}")]
    OpenPatrolLoop {
        /// First waypoint of the patrol.
        first: Cell,
        /// Last waypoint of the patrol.
        last: Cell,
    },
    /// The blueprint requests a coordinate space with no implementation.
    #[error("coordinate space {kind:?} is not implemented")]
    UnsupportedSpace {
        /// The requested space kind.
        kind: SpaceKind,
    },
}
