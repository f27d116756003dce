//! A* search over an [`OccupancyGrid`] with 8-connected moves.
//!
//! Cells are closed when popped and never expanded twice. A cell that is already on the
//! frontier is not relaxed when a cheaper route to it shows up; the cheaper entry is pushed
//! next to the old one instead. With the default uniform step cost and the Euclidean
//! heuristic this can return a valid path that is not cost-minimal in dense obstacle fields.
//!
//! Frontier ties are broken by lower `f`, then lower `g`, then lower `(row, col)`, so a
//! given grid/start/goal always yields the same path.
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{GridCoord, OccupancyGrid};

/// Neighbor expansion order: N, S, W, E, NW, SW, NE, SE.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (0, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Cost charged for a diagonal step.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DiagonalCost {
    /// Diagonal steps cost the same as orthogonal ones.
    #[default]
    Uniform,
    /// Diagonal steps cost `sqrt(2)`.
    Euclidean,
}

impl DiagonalCost {
    #[inline]
    fn step(self, dc: i32, dr: i32) -> f32 {
        match self {
            DiagonalCost::Euclidean if dc != 0 && dr != 0 => std::f32::consts::SQRT_2,
            _ => 1.0,
        }
    }
}

/// Tunables for [`find_path_with`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchOptions {
    pub diagonal_cost: DiagonalCost,
}

impl SearchOptions {
    pub fn with_diagonal_cost(mut self, diagonal_cost: DiagonalCost) -> Self {
        self.diagonal_cost = diagonal_cost;
        self
    }
}

struct SearchNode {
    coord: GridCoord,
    parent: Option<usize>,
}

struct OpenEntry {
    f: f32,
    g: f32,
    coord: GridCoord,
    node: usize,
}

impl Ord for OpenEntry {
    // Reversed so the max-heap pops the best entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.g.total_cmp(&self.g))
            .then_with(|| (other.coord.row, other.coord.col).cmp(&(self.coord.row, self.coord.col)))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

#[inline]
fn heuristic(a: GridCoord, b: GridCoord) -> f32 {
    let dx = (a.col - b.col) as f32;
    let dy = (a.row - b.row) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Finds a path from `start` to `goal` using uniform step costs.
///
/// Returns `None` if either endpoint is out of bounds, `goal` is blocked, or no path
/// exists. The returned path includes both endpoints in traversal order. `start` itself
/// is not required to be free.
pub fn find_path(grid: &OccupancyGrid, start: GridCoord, goal: GridCoord) -> Option<Vec<GridCoord>> {
    find_path_with(grid, start, goal, &SearchOptions::default())
}

/// Like [`find_path`], with explicit [`SearchOptions`].
pub fn find_path_with(
    grid: &OccupancyGrid,
    start: GridCoord,
    goal: GridCoord,
    options: &SearchOptions,
) -> Option<Vec<GridCoord>> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) || !grid.is_free(goal) {
        return None;
    }

    let mut nodes = vec![SearchNode {
        coord: start,
        parent: None,
    }];
    let mut closed = vec![false; grid.width() * grid.height()];
    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        f: heuristic(start, goal),
        g: 0.0,
        coord: start,
        node: 0,
    });

    while let Some(current) = open.pop() {
        let Some(ci) = grid.index(current.coord) else {
            continue;
        };
        if closed[ci] {
            continue;
        }
        closed[ci] = true;

        if current.coord == goal {
            return Some(reconstruct(&nodes, current.node));
        }

        for (dc, dr) in NEIGHBOR_OFFSETS {
            let next = GridCoord::new(current.coord.col + dc, current.coord.row + dr);
            if !grid.is_free(next) {
                continue;
            }
            let Some(ni) = grid.index(next) else {
                continue;
            };
            if closed[ni] {
                continue;
            }

            let g = current.g + options.diagonal_cost.step(dc, dr);
            nodes.push(SearchNode {
                coord: next,
                parent: Some(current.node),
            });
            open.push(OpenEntry {
                f: g + heuristic(next, goal),
                g,
                coord: next,
                node: nodes.len() - 1,
            });
        }
    }

    None
}

fn reconstruct(nodes: &[SearchNode], mut at: usize) -> Vec<GridCoord> {
    let mut path = vec![nodes[at].coord];
    while let Some(parent) = nodes[at].parent {
        path.push(nodes[parent].coord);
        at = parent;
    }
    path.reverse();
    path
}

/// Total step cost of `path` under `diagonal_cost`.
pub fn path_cost(path: &[GridCoord], diagonal_cost: DiagonalCost) -> f32 {
    path.windows(2)
        .map(|w| diagonal_cost.step(w[1].col - w[0].col, w[1].row - w[0].row))
        .sum()
}
