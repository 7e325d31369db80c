//! Blueprint layout parsing and passability queries.
//!
//! A layout is parsed exactly once per level construction. Start and end
//! tiles are extracted into dedicated fields and wall tiles into a cell list
//! (both become actors); the surviving grid only answers passability.

use gridshade_core::{Cell, LevelError, Tile};

/// Passability grid derived from a parsed layout.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TerrainGrid {
    columns: i32,
    rows: i32,
    passable: Vec<bool>,
}

impl TerrainGrid {
    /// Number of columns in the grid.
    pub(crate) fn columns(&self) -> i32 {
        self.columns
    }

    /// Number of rows in the grid.
    pub(crate) fn rows(&self) -> i32 {
        self.rows
    }

    /// Reports whether the cell is inside the grid and free of walls.
    pub(crate) fn is_passable(&self, cell: Cell) -> bool {
        self.index(cell)
            .map_or(false, |index| self.passable[index])
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if cell.x() >= 0 && cell.y() >= 0 && cell.x() < self.columns && cell.y() < self.rows {
            Some((cell.y() * self.columns + cell.x()) as usize)
        } else {
            None
        }
    }
}

/// Result of parsing a blueprint layout.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ParsedLayout {
    /// Passability grid; start and end tiles read as passable.
    pub(crate) terrain: TerrainGrid,
    /// The unique start tile.
    pub(crate) start: Cell,
    /// The unique end tile.
    pub(crate) end: Cell,
    /// Wall tiles in row-major scan order.
    pub(crate) walls: Vec<Cell>,
}

/// Parses blueprint rows into terrain, validating the start/end invariants.
pub(crate) fn parse_layout(rows: &[String]) -> Result<ParsedLayout, LevelError> {
    let height = rows.len();
    let width = rows.first().map_or(0, |row| row.chars().count());
    if height == 0 || width == 0 {
        return Err(LevelError::EmptyLayout);
    }

    let mut passable = Vec::with_capacity(width * height);
    let mut start = None;
    let mut end = None;
    let mut walls = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        if row.chars().count() != width {
            return Err(LevelError::RaggedLayout { row: y });
        }
        for (x, glyph) in row.chars().enumerate() {
            let cell = Cell::new(x as i32, y as i32);
            let tile = Tile::from_glyph(glyph).ok_or(LevelError::UnknownGlyph {
                glyph,
                row: y,
                column: x,
            })?;
            match tile {
                Tile::Open => passable.push(true),
                Tile::Wall => {
                    walls.push(cell);
                    passable.push(false);
                }
                Tile::Start => {
                    if start.is_some() {
                        return Err(LevelError::DuplicateStart { cell });
                    }
                    start = Some(cell);
                    passable.push(true);
                }
                Tile::End => {
                    if end.is_some() {
                        return Err(LevelError::DuplicateEnd { cell });
                    }
                    end = Some(cell);
                    passable.push(true);
                }
            }
        }
    }

    let start = start.ok_or(LevelError::MissingStart)?;
    let end = end.ok_or(LevelError::MissingEnd)?;

    Ok(ParsedLayout {
        terrain: TerrainGrid {
            columns: width as i32,
            rows: height as i32,
            passable,
        },
        start,
        end,
        walls,
    })
}

#[cfg(test)]
mod tests {
    use super::parse_layout;
    use gridshade_core::{Cell, LevelError};

    fn rows(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|line| (*line).to_owned()).collect()
    }

    #[test]
    fn parses_start_end_and_walls() {
        let parsed = parse_layout(&rows(&["S.#", "..E"])).expect("layout is valid");
        assert_eq!(parsed.start, Cell::new(0, 0));
        assert_eq!(parsed.end, Cell::new(2, 1));
        assert_eq!(parsed.walls, vec![Cell::new(2, 0)]);
        assert!(parsed.terrain.is_passable(Cell::new(1, 0)));
        assert!(!parsed.terrain.is_passable(Cell::new(2, 0)));
    }

    #[test]
    fn start_and_end_tiles_are_passable_after_parsing() {
        let parsed = parse_layout(&rows(&["SE"])).expect("layout is valid");
        assert!(parsed.terrain.is_passable(parsed.start));
        assert!(parsed.terrain.is_passable(parsed.end));
    }

    #[test]
    fn out_of_bounds_cells_are_impassable() {
        let parsed = parse_layout(&rows(&["SE"])).expect("layout is valid");
        assert!(!parsed.terrain.is_passable(Cell::new(-1, 0)));
        assert!(!parsed.terrain.is_passable(Cell::new(0, 1)));
    }

    #[test]
    fn rejects_duplicate_start() {
        let error = parse_layout(&rows(&["SS", ".E"])).expect_err("two starts must fail");
        assert_eq!(
            error,
            LevelError::DuplicateStart {
                cell: Cell::new(1, 0)
            }
        );
    }

    #[test]
    fn rejects_duplicate_end() {
        let error = parse_layout(&rows(&["SE", ".E"])).expect_err("two ends must fail");
        assert_eq!(
            error,
            LevelError::DuplicateEnd {
                cell: Cell::new(1, 1)
            }
        );
    }

    #[test]
    fn rejects_missing_start_or_end() {
        assert_eq!(
            parse_layout(&rows(&["..", ".E"])),
            Err(LevelError::MissingStart)
        );
        assert_eq!(
            parse_layout(&rows(&["S.", ".."])),
            Err(LevelError::MissingEnd)
        );
    }

    #[test]
    fn rejects_ragged_and_empty_layouts() {
        assert_eq!(
            parse_layout(&rows(&["S.", ".E."])),
            Err(LevelError::RaggedLayout { row: 1 })
        );
        assert_eq!(parse_layout(&rows(&[])), Err(LevelError::EmptyLayout));
        assert_eq!(parse_layout(&rows(&["", ""])), Err(LevelError::EmptyLayout));
    }

    #[test]
    fn rejects_unknown_glyphs() {
        assert_eq!(
            parse_layout(&rows(&["S?", ".E"])),
            Err(LevelError::UnknownGlyph {
                glyph: '?',
                row: 0,
                column: 1
            })
        );
    }
}
