//! Boustrophedon (lawnmower) coverage path.
use glam::Vec2;
use mint::Vector2;

use crate::planning::CoveragePattern;

/// Lawnmower sweep with vertical lanes `lane_spacing` apart.
///
/// The path starts at the mid-left edge `(0, height / 2)`, climbs to the top-left corner,
/// then sweeps full-height lanes alternately down and up, stepping right by
/// `lane_spacing` until `x >= width`, and finally returns to the mid-left point.
#[derive(Debug, Clone)]
pub struct BoustrophedonCoverage {
    /// Horizontal distance between adjacent lanes.
    pub lane_spacing: f32,
}

impl BoustrophedonCoverage {
    pub fn new(lane_spacing: f32) -> Self {
        Self { lane_spacing }
    }
}

impl CoveragePattern for BoustrophedonCoverage {
    fn waypoints(&self, area_extent: Vector2<f32>) -> Vec<Vector2<f32>> {
        generate_coverage_path(area_extent.x, area_extent.y, self.lane_spacing)
            .into_iter()
            .map(Into::into)
            .collect()
    }
}

/// Upper bound on the number of lanes [`generate_coverage_path`] will lay out.
pub const MAX_COVERAGE_LANES: usize = 1 << 20;

/// Generates the boustrophedon waypoint sequence for a `width` by `height` area.
///
/// Returns an empty sequence if any argument is non-finite or not strictly positive, or if
/// the sweep would need more than [`MAX_COVERAGE_LANES`] lanes.
pub fn generate_coverage_path(width: f32, height: f32, lane_spacing: f32) -> Vec<Vec2> {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !valid(width) || !valid(height) || !valid(lane_spacing) {
        return Vec::new();
    }

    let home = Vec2::new(0.0, height * 0.5);
    let lanes = (width / lane_spacing).ceil();
    if lanes > MAX_COVERAGE_LANES as f32 {
        return Vec::new();
    }
    let lanes = lanes as usize;
    let mut path = Vec::with_capacity(2 * lanes + 3);
    path.push(home);
    path.push(Vec2::ZERO);

    let mut moving_down = true;
    for lane in 0..lanes {
        let x = lane as f32 * lane_spacing;
        let edge = if moving_down { height } else { 0.0 };
        path.push(Vec2::new(x, edge));
        let next_x = x + lane_spacing;
        if next_x < width {
            path.push(Vec2::new(next_x, edge));
        }
        moving_down = !moving_down;
    }

    path.push(home);
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_area_produces_expected_sweep() {
        let path = generate_coverage_path(800.0, 600.0, 100.0);
        assert_eq!(path.first(), Some(&Vec2::new(0.0, 300.0)));
        assert_eq!(path[1], Vec2::ZERO);
        assert_eq!(path[2], Vec2::new(0.0, 600.0));
        assert_eq!(path[3], Vec2::new(100.0, 600.0));
        assert_eq!(path[4], Vec2::new(100.0, 0.0));
        assert_eq!(path[5], Vec2::new(200.0, 0.0));
        assert_eq!(path.last(), Some(&Vec2::new(0.0, 300.0)));
        // 8 lanes, the last one has no step-over.
        assert_eq!(path.len(), 2 + 8 * 2 - 1 + 1);
        assert_eq!(path[path.len() - 2], Vec2::new(700.0, 0.0));
    }

    #[test]
    fn every_column_is_within_one_lane_of_a_waypoint() {
        for &(w, h, s) in &[(800.0, 600.0, 100.0), (95.0, 40.0, 30.0), (10.0, 10.0, 25.0)] {
            let path = generate_coverage_path(w, h, s);
            let mut x = 0.0;
            while x < w {
                assert!(
                    path.iter().any(|p| (p.x - x).abs() <= s),
                    "column {x} not covered for {w}x{h} spacing {s}"
                );
                x += 1.0;
            }
        }
    }

    #[test]
    fn degenerate_lane_spacing_yields_nothing() {
        assert!(generate_coverage_path(800.0, 600.0, 1e-30).is_empty());
        assert!(generate_coverage_path(f32::MAX, 600.0, 1.0).is_empty());
        let at_limit = generate_coverage_path(MAX_COVERAGE_LANES as f32, 1.0, 1.0);
        assert_eq!(at_limit.len(), 2 * MAX_COVERAGE_LANES + 2);
    }

    #[test]
    fn lane_wider_than_area_still_sweeps_once() {
        let path = generate_coverage_path(10.0, 20.0, 50.0);
        assert_eq!(
            path,
            vec![
                Vec2::new(0.0, 10.0),
                Vec2::ZERO,
                Vec2::new(0.0, 20.0),
                Vec2::new(0.0, 10.0),
            ]
        );
    }

    #[test]
    fn invalid_arguments_yield_empty_path() {
        assert!(generate_coverage_path(0.0, 10.0, 1.0).is_empty());
        assert!(generate_coverage_path(10.0, -1.0, 1.0).is_empty());
        assert!(generate_coverage_path(10.0, 10.0, f32::NAN).is_empty());
    }

    #[test]
    fn trait_impl_matches_free_function() {
        let pattern = BoustrophedonCoverage::new(100.0);
        let via_trait: Vec<Vec2> = pattern
            .waypoints(Vec2::new(800.0, 600.0).into())
            .into_iter()
            .map(Vec2::from)
            .collect();
        assert_eq!(via_trait, generate_coverage_path(800.0, 600.0, 100.0));
    }
}
