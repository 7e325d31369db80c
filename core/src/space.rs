//! Pluggable coordinate spaces mapping logical cells to device pixels.
//!
//! A coordinate space owns the topology of a level: cell-to-pixel projection,
//! distance, the direction table, and neighbor math. The grid space is the
//! only constructible variant today; the enum dispatch keeps every call site
//! ready for a hexagonal sibling without API changes.

use thiserror::Error;

use crate::{Cell, DirectionIndex, ScreenPoint};

/// Direction table of the grid space: right, up, left, down.
const GRID_DELTAS: [(i32, i32); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

/// Invalid-argument condition raised when two cells are not one orthogonal
/// step apart.
///
/// This is a programming-contract violation: callers validate adjacency
/// before asking for a direction, so the error never stems from external
/// input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("cells {from:?} and {to:?} are not one orthogonal step apart")]
pub struct AdjacencyError {
    /// Cell the displacement starts from.
    pub from: Cell,
    /// Cell the displacement points at.
    pub to: Cell,
}

/// Topology of a level: projects cells onto the screen and answers
/// adjacency queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoordinateSpace {
    /// Square grid with four orthogonal directions.
    Grid(GridSpace),
}

impl CoordinateSpace {
    /// Creates a grid coordinate space anchored at the provided origin.
    #[must_use]
    pub const fn grid(origin: ScreenPoint, cell_size: i32, columns: i32, rows: i32) -> Self {
        Self::Grid(GridSpace {
            origin,
            cell_size,
            columns,
            rows,
        })
    }

    /// Returns the screen coordinate of the center of the provided cell.
    #[must_use]
    pub fn pos_to_screen(&self, cell: Cell) -> ScreenPoint {
        match self {
            Self::Grid(grid) => grid.pos_to_screen(cell),
        }
    }

    /// Returns the cell containing the provided screen coordinate.
    ///
    /// Uses floor division, so any pixel within a cell maps to that cell;
    /// this is deliberately not an exact inverse of [`Self::pos_to_screen`]
    /// for off-center pixels.
    #[must_use]
    pub fn screen_to_pos(&self, point: ScreenPoint) -> Cell {
        match self {
            Self::Grid(grid) => grid.screen_to_pos(point),
        }
    }

    /// Computes the topology distance between two cells.
    ///
    /// For the grid space this is the Manhattan distance.
    #[must_use]
    pub fn distance(&self, a: Cell, b: Cell) -> u32 {
        match self {
            Self::Grid(_) => a.x().abs_diff(b.x()) + a.y().abs_diff(b.y()),
        }
    }

    /// Number of entries in this space's direction table.
    #[must_use]
    pub fn num_directions(&self) -> usize {
        match self {
            Self::Grid(_) => GRID_DELTAS.len(),
        }
    }

    /// Applies the direction table to the provided cell.
    ///
    /// Does not bounds-check the result; transiently off-grid cells are the
    /// caller's concern.
    #[must_use]
    pub fn neighbor_in_direction(&self, cell: Cell, direction: DirectionIndex) -> Cell {
        match self {
            Self::Grid(_) => {
                let (dx, dy) = GRID_DELTAS[usize::from(direction.get())];
                cell.offset(dx, dy)
            }
        }
    }

    /// Returns the direction whose delta carries `from` onto `to`.
    ///
    /// Fails with [`AdjacencyError`] when the displacement is not one of the
    /// canonical unit deltas.
    pub fn direction_between(&self, from: Cell, to: Cell) -> Result<DirectionIndex, AdjacencyError> {
        match self {
            Self::Grid(_) => {
                let displacement = (to.x() - from.x(), to.y() - from.y());
                GRID_DELTAS
                    .iter()
                    .position(|delta| *delta == displacement)
                    .map(|index| DirectionIndex::new(index as u8))
                    .ok_or(AdjacencyError { from, to })
            }
        }
    }

    /// Enumerates the in-bounds cells adjacent to the provided cell.
    #[must_use]
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        match self {
            Self::Grid(grid) => GRID_DELTAS
                .iter()
                .map(|(dx, dy)| cell.offset(*dx, *dy))
                .filter(|candidate| grid.in_bounds(*candidate))
                .collect(),
        }
    }

    /// Reports whether the cell lies within the space's bounds.
    #[must_use]
    pub fn in_bounds(&self, cell: Cell) -> bool {
        match self {
            Self::Grid(grid) => grid.in_bounds(cell),
        }
    }

    /// Number of columns contained in the space.
    #[must_use]
    pub fn columns(&self) -> i32 {
        match self {
            Self::Grid(grid) => grid.columns,
        }
    }

    /// Number of rows contained in the space.
    #[must_use]
    pub fn rows(&self) -> i32 {
        match self {
            Self::Grid(grid) => grid.rows,
        }
    }

    /// Current pixel size of a single cell.
    #[must_use]
    pub fn cell_size(&self) -> i32 {
        match self {
            Self::Grid(grid) => grid.cell_size,
        }
    }

    /// Updates the pixel size of a single cell after a layout event.
    pub fn set_cell_size(&mut self, cell_size: i32) {
        match self {
            Self::Grid(grid) => grid.cell_size = cell_size,
        }
    }
}

/// Square-grid projection state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpace {
    origin: ScreenPoint,
    cell_size: i32,
    columns: i32,
    rows: i32,
}

impl GridSpace {
    fn pos_to_screen(&self, cell: Cell) -> ScreenPoint {
        ScreenPoint::new(
            self.project_axis(cell.x(), self.origin.x()),
            self.project_axis(cell.y(), self.origin.y()),
        )
    }

    fn project_axis(&self, pos: i32, origin: i32) -> i32 {
        origin + pos * self.cell_size + self.cell_size / 2
    }

    fn screen_to_pos(&self, point: ScreenPoint) -> Cell {
        Cell::new(
            (point.x() - self.origin.x()).div_euclid(self.cell_size),
            (point.y() - self.origin.y()).div_euclid(self.cell_size),
        )
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        cell.x() >= 0 && cell.y() >= 0 && cell.x() < self.columns && cell.y() < self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateSpace, GRID_DELTAS};
    use crate::{Cell, DirectionIndex, ScreenPoint};

    fn space() -> CoordinateSpace {
        CoordinateSpace::grid(ScreenPoint::new(0, 0), 100, 9, 6)
    }

    #[test]
    fn screen_to_pos_inverts_pos_to_screen_for_every_cell() {
        let space = space();
        for x in 0..space.columns() {
            for y in 0..space.rows() {
                let cell = Cell::new(x, y);
                assert_eq!(space.screen_to_pos(space.pos_to_screen(cell)), cell);
            }
        }
    }

    #[test]
    fn off_center_pixels_map_to_the_containing_cell() {
        let space = space();
        assert_eq!(space.screen_to_pos(ScreenPoint::new(1, 1)), Cell::new(0, 0));
        assert_eq!(
            space.screen_to_pos(ScreenPoint::new(99, 99)),
            Cell::new(0, 0)
        );
        assert_eq!(
            space.screen_to_pos(ScreenPoint::new(100, 99)),
            Cell::new(1, 0)
        );
    }

    #[test]
    fn distance_is_the_symmetric_manhattan_sum() {
        let space = space();
        let a = Cell::new(1, 1);
        let b = Cell::new(4, 3);
        assert_eq!(space.distance(a, b), 5);
        assert_eq!(space.distance(b, a), 5);
    }

    #[test]
    fn direction_between_recovers_every_table_entry() {
        let space = space();
        let origin = Cell::new(3, 3);
        for (index, (dx, dy)) in GRID_DELTAS.iter().enumerate() {
            let neighbor = origin.offset(*dx, *dy);
            assert_eq!(
                space.direction_between(origin, neighbor),
                Ok(DirectionIndex::new(index as u8))
            );
        }
    }

    #[test]
    fn direction_between_rejects_non_adjacent_pairs() {
        let space = space();
        let origin = Cell::new(3, 3);
        for target in [
            Cell::new(3, 3),
            Cell::new(5, 3),
            Cell::new(4, 4),
            Cell::new(2, 2),
        ] {
            assert!(space.direction_between(origin, target).is_err());
        }
    }

    #[test]
    fn neighbors_exclude_out_of_bounds_cells() {
        let space = space();
        let corner = space.neighbors(Cell::new(0, 0));
        assert_eq!(corner, vec![Cell::new(1, 0), Cell::new(0, 1)]);

        let interior = space.neighbors(Cell::new(4, 3));
        assert_eq!(interior.len(), space.num_directions());
    }

    #[test]
    fn neighbor_in_direction_does_not_bounds_check() {
        let space = space();
        assert_eq!(
            space.neighbor_in_direction(Cell::new(0, 0), DirectionIndex::new(2)),
            Cell::new(-1, 0)
        );
    }

    #[test]
    fn cell_size_updates_apply_to_the_projection() {
        let mut space = space();
        assert_eq!(space.pos_to_screen(Cell::new(1, 1)), ScreenPoint::new(150, 150));
        space.set_cell_size(40);
        assert_eq!(space.cell_size(), 40);
        assert_eq!(space.pos_to_screen(Cell::new(1, 1)), ScreenPoint::new(60, 60));
    }
}
