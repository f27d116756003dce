//! Greedy nearest-neighbor visiting order.
//!
//! This is a heuristic and makes no promise about total tour length. Ties go to the
//! first candidate in input order.
use glam::Vec2;

use crate::error::{Error, Result};

/// Orders `points` into a visiting sequence starting at `start_index`.
///
/// Returns a permutation of `0..points.len()` whose first element is `start_index`. An empty
/// input yields an empty sequence regardless of `start_index`.
pub fn plan_route(points: &[Vec2], start_index: usize) -> Result<Vec<usize>> {
    if points.is_empty() {
        return Ok(Vec::new());
    }
    if start_index >= points.len() {
        return Err(Error::IndexOutOfRange {
            index: start_index,
            len: points.len(),
        });
    }

    let mut visited = vec![false; points.len()];
    let mut order = Vec::with_capacity(points.len());
    visited[start_index] = true;
    order.push(start_index);

    let mut current = start_index;
    for _ in 1..points.len() {
        let mut nearest: Option<(usize, f32)> = None;
        for (i, p) in points.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let d = points[current].distance(*p);
            if nearest.is_none_or(|(_, best)| d < best) {
                nearest = Some((i, d));
            }
        }
        let Some((next, _)) = nearest else {
            break;
        };
        visited[next] = true;
        order.push(next);
        current = next;
    }

    Ok(order)
}

/// Orders identified stops into a visiting sequence starting from `origin`.
///
/// The origin itself is not part of the output; the returned ids are matched through the
/// planner by identity, never by their position in `stops`.
pub fn plan_route_by_id<I: Copy>(origin: Vec2, stops: &[(I, Vec2)]) -> Vec<I> {
    let points: Vec<Vec2> = std::iter::once(origin)
        .chain(stops.iter().map(|(_, p)| *p))
        .collect();
    // Index 0 is always valid here, the list holds at least the origin.
    let order = plan_route(&points, 0).unwrap_or_default();
    order
        .into_iter()
        .skip(1)
        .map(|i| stops[i - 1].0)
        .collect()
}
