//! The embedded level book and the clone profile table.
//!
//! Levels are immutable configuration loaded once at startup and passed
//! explicitly into world construction; nothing in the simulation reaches for
//! an ambient level registry.

use anyhow::{ensure, Context, Result};
use gridshade_core::{CloneProfile, LevelSpec, Rgba};
use serde::Deserialize;

const LEVEL_BOOK: &str = include_str!("../levels.toml");

/// Ordered collection of playable levels.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct LevelBook {
    /// Playable levels in progression order.
    pub(crate) levels: Vec<LevelSpec>,
}

/// Parses the level book embedded in the binary.
pub(crate) fn load_book() -> Result<LevelBook> {
    let book: LevelBook = toml::from_str(LEVEL_BOOK).context("level book failed to parse")?;
    ensure!(!book.levels.is_empty(), "level book contains no levels");
    Ok(book)
}

/// The clone profile table, indexed by the `clones` arrays in level specs.
pub(crate) fn clone_profiles() -> Vec<CloneProfile> {
    vec![
        CloneProfile::new(1.0, Rgba::from_rgb(255, 160, 0)),
        CloneProfile::new(2.0, Rgba::from_rgb(255, 0, 0)),
        CloneProfile::new(0.5, Rgba::new(0, 255, 0, 100)),
        CloneProfile::new(4.0, Rgba::from_rgb(0, 0, 255)),
        CloneProfile::new(0.25, Rgba::from_rgb(255, 0, 160)),
    ]
}
