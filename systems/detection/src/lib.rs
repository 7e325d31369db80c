#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure detection system that turns guard sightings into failure reports.
//!
//! The system intersects each guard's visible cells with the cells occupied
//! by intruding units and emits [`Command::ReportSighting`] for every hit.
//! Hosts wire it into their command pump explicitly; leaving it out yields a
//! world where guards watch but never catch.

use gridshade_core::{Command, Event, GameMode};
use gridshade_world::query::{GuardVision, Intruder};

/// Pure system that reacts to elapsed time by scanning guard vision.
#[derive(Clone, Copy, Debug)]
pub struct Detection {
    include_clones: bool,
}

impl Detection {
    /// Creates a detection rule that only spots the player unit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            include_clones: false,
        }
    }

    /// Creates a detection rule that spots clones as well as the player.
    #[must_use]
    pub const fn including_clones() -> Self {
        Self {
            include_clones: true,
        }
    }

    /// Consumes world events and immutable views to emit sighting reports.
    ///
    /// Sightings only fire while the simulation executes and only on ticks
    /// that actually advanced time.
    pub fn handle(
        &self,
        events: &[Event],
        mode: GameMode,
        guards: &[GuardVision],
        intruders: &[Intruder],
        out: &mut Vec<Command>,
    ) {
        if mode != GameMode::Execute {
            return;
        }

        if !events
            .iter()
            .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for guard in guards {
            let sighted = intruders
                .iter()
                .filter(|intruder| self.include_clones || intruder.is_player)
                .find(|intruder| guard.cells.contains(&intruder.cell));
            if let Some(intruder) = sighted {
                out.push(Command::ReportSighting {
                    guard: guard.guard,
                    target: intruder.id,
                });
            }
        }
    }
}

impl Default for Detection {
    fn default() -> Self {
        Self::new()
    }
}
