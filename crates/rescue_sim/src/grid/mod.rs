//! Occupancy grid over the operating area and discrete path search on it.
//!
//! This module defines [`OccupancyGrid`] and [`GridCoord`] used to discretize the
//! continuous world for the pathfinder in [`astar`]. World positions map to cells by
//! flooring `p / cell_size`; cells map back to world space at their lower corner.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod astar;

pub use astar::{find_path, find_path_with, DiagonalCost, SearchOptions};

/// Occupancy state of a single grid cell.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Cell {
    #[default]
    Free,
    Blocked,
}

/// Integer cell coordinate on an [`OccupancyGrid`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    /// Column index (x axis).
    pub col: i32,
    /// Row index (y axis).
    pub row: i32,
}

impl GridCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Returns `true` if `other` is one of the eight cells surrounding `self`.
    pub fn is_adjacent(&self, other: GridCoord) -> bool {
        let dc = (self.col - other.col).abs();
        let dr = (self.row - other.row).abs();
        dc <= 1 && dr <= 1 && (dc, dr) != (0, 0)
    }
}

/// Upper bound on `width * height`. Keeps every coordinate within `i32`.
pub const MAX_GRID_CELLS: usize = 1 << 26;

/// A fixed-size 2D grid of free/blocked cells covering the operating area.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct OccupancyGrid {
    width: usize,
    height: usize,
    cell_size: f32,
    cells: Vec<Cell>,
}

impl OccupancyGrid {
    /// Creates an all-free grid with the given dimensions in cells.
    pub fn new(width: usize, height: usize, cell_size: f32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidGrid(format!(
                "grid dimensions must be > 0, got {width}x{height}"
            )));
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(Error::InvalidGrid(format!(
                "cell_size must be finite and > 0, got {cell_size}"
            )));
        }
        let cells = width
            .checked_mul(height)
            .filter(|&n| n <= MAX_GRID_CELLS)
            .ok_or_else(|| {
                Error::InvalidGrid(format!(
                    "{width}x{height} cells exceeds the limit of {MAX_GRID_CELLS}"
                ))
            })?;
        Ok(Self {
            width,
            height,
            cell_size,
            cells: vec![Cell::Free; cells],
        })
    }

    /// Creates an all-free grid that covers a `extent.x` by `extent.y` area.
    pub fn covering(extent: Vec2, cell_size: f32) -> Result<Self> {
        if !extent.is_finite() || extent.x <= 0.0 || extent.y <= 0.0 {
            return Err(Error::InvalidGrid(format!(
                "area extent must be finite and > 0 in both components, got {extent}"
            )));
        }
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(Error::InvalidGrid(format!(
                "cell_size must be finite and > 0, got {cell_size}"
            )));
        }
        let width = (extent.x / cell_size).ceil();
        let height = (extent.y / cell_size).ceil();
        if f64::from(width) * f64::from(height) > MAX_GRID_CELLS as f64 {
            return Err(Error::InvalidGrid(format!(
                "covering {extent} with cells of size {cell_size} needs {width}x{height} cells, \
                 more than the limit of {MAX_GRID_CELLS}"
            )));
        }
        Self::new(width as usize, height as usize, cell_size)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Edge length of one cell in world units.
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn in_bounds(&self, c: GridCoord) -> bool {
        c.col >= 0 && c.row >= 0 && (c.col as usize) < self.width && (c.row as usize) < self.height
    }

    /// Cell state at `c`, or `None` when out of bounds.
    pub fn get(&self, c: GridCoord) -> Option<Cell> {
        self.index(c).map(|i| self.cells[i])
    }

    pub fn is_free(&self, c: GridCoord) -> bool {
        self.get(c) == Some(Cell::Free)
    }

    /// Sets the state of one cell. Out-of-bounds coordinates are rejected.
    pub fn set(&mut self, c: GridCoord, cell: Cell) -> Result<()> {
        let i = self.index(c).ok_or_else(|| {
            Error::InvalidGrid(format!(
                "cell ({}, {}) outside {}x{} grid",
                c.col, c.row, self.width, self.height
            ))
        })?;
        self.cells[i] = cell;
        Ok(())
    }

    /// Marks every cell of the inclusive rectangle `a..=b` as blocked, clipped to the grid.
    pub fn block_rect(&mut self, a: GridCoord, b: GridCoord) {
        let (c0, c1) = (a.col.min(b.col).max(0), a.col.max(b.col));
        let (r0, r1) = (a.row.min(b.row).max(0), a.row.max(b.row));
        for row in r0..=r1.min(self.height as i32 - 1) {
            for col in c0..=c1.min(self.width as i32 - 1) {
                let i = row as usize * self.width + col as usize;
                self.cells[i] = Cell::Blocked;
            }
        }
    }

    /// Number of blocked cells.
    pub fn blocked_count(&self) -> usize {
        self.cells.iter().filter(|c| **c == Cell::Blocked).count()
    }

    /// Converts a world position to the cell containing it. The result may be out of bounds.
    pub fn world_to_cell(&self, p: Vec2) -> GridCoord {
        GridCoord::new(
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    /// Converts a cell back to world space at its lower corner.
    pub fn cell_to_world(&self, c: GridCoord) -> Vec2 {
        Vec2::new(
            c.col as f32 * self.cell_size,
            c.row as f32 * self.cell_size,
        )
    }

    fn index(&self, c: GridCoord) -> Option<usize> {
        self.in_bounds(c)
            .then(|| c.row as usize * self.width + c.col as usize)
    }
}
