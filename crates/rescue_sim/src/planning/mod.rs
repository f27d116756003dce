//! Waypoint planning: coverage sweeps for the scout and visiting orders for deliveries.
//!
//! This module defines the [`CoveragePattern`] trait used by the simulation to obtain the
//! scout's fixed scan path, the boustrophedon implementation in [`coverage`], and the greedy
//! nearest-neighbor visiting order in [`route`].
use mint::Vector2;

pub mod coverage;
pub mod route;

pub use coverage::{generate_coverage_path, BoustrophedonCoverage, MAX_COVERAGE_LANES};
pub use route::{plan_route, plan_route_by_id};

/// Trait for fixed scan patterns over a rectangular area anchored at the origin.
pub trait CoveragePattern: Send + Sync {
    /// Returns the ordered waypoints covering an `area_extent.x` by `area_extent.y` area.
    fn waypoints(&self, area_extent: Vector2<f32>) -> Vec<Vector2<f32>>;
}
