//! Simulation parameters and their validation.
use std::fmt;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::{DiagonalCost, SearchOptions};
use crate::planning::MAX_COVERAGE_LANES;

/// How detected survivors are turned into deliveries.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Every new, non-duplicate detection spawns its own delivery agent at the depot.
    #[default]
    Unconstrained,
    /// A single delivery agent works a task queue with a limited kit inventory and
    /// flies reload trips to the depot.
    CapacityConstrained,
}

impl fmt::Display for DispatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DispatchMode::Unconstrained => "unconstrained",
            DispatchMode::CapacityConstrained => "capacity-constrained",
        })
    }
}

/// Configuration for a simulation run.
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Width of the operating area in world units.
    pub area_width: f32,
    /// Height of the operating area in world units.
    pub area_height: f32,
    /// Edge length of one occupancy grid cell in world units.
    pub cell_size: f32,
    /// Survivors strictly closer than this to the scout are detected.
    pub detection_radius: f32,
    /// New detections strictly closer than this to a claimed delivery site are not dispatched.
    pub duplicate_claim_radius: f32,
    /// Scout speed in world units per unit time.
    pub scout_speed: f32,
    /// Delivery agent speed in world units per unit time.
    pub delivery_speed: f32,
    /// Duration of one tick.
    pub dt: f32,
    /// Kits carried by the single agent in [`DispatchMode::CapacityConstrained`].
    pub kit_capacity: u32,
    /// Distance between scout coverage lanes.
    pub lane_spacing: f32,
    /// Hard ceiling on the number of ticks.
    pub max_steps: u32,
    pub dispatch_mode: DispatchMode,
    pub diagonal_cost: DiagonalCost,
    /// Record a [`crate::sim::runner::WorldState`] for every tick.
    pub record_trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            area_width: 800.0,
            area_height: 600.0,
            cell_size: 10.0,
            detection_radius: 100.0,
            duplicate_claim_radius: 50.0,
            scout_speed: 10.0,
            delivery_speed: 15.0,
            dt: 1.0,
            kit_capacity: 20,
            lane_spacing: 100.0,
            max_steps: 5000,
            dispatch_mode: DispatchMode::Unconstrained,
            diagonal_cost: DiagonalCost::Uniform,
            record_trace: true,
        }
    }
}

impl SimConfig {
    /// Creates a new [`SimConfig`] for an area of the given extent, other values at their defaults.
    pub fn new(area_extent: Vec2) -> Self {
        Self {
            area_width: area_extent.x,
            area_height: area_extent.y,
            ..Default::default()
        }
    }

    pub fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn with_detection_radius(mut self, detection_radius: f32) -> Self {
        self.detection_radius = detection_radius;
        self
    }

    pub fn with_duplicate_claim_radius(mut self, duplicate_claim_radius: f32) -> Self {
        self.duplicate_claim_radius = duplicate_claim_radius;
        self
    }

    pub fn with_scout_speed(mut self, scout_speed: f32) -> Self {
        self.scout_speed = scout_speed;
        self
    }

    pub fn with_delivery_speed(mut self, delivery_speed: f32) -> Self {
        self.delivery_speed = delivery_speed;
        self
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_kit_capacity(mut self, kit_capacity: u32) -> Self {
        self.kit_capacity = kit_capacity;
        self
    }

    pub fn with_lane_spacing(mut self, lane_spacing: f32) -> Self {
        self.lane_spacing = lane_spacing;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_dispatch_mode(mut self, dispatch_mode: DispatchMode) -> Self {
        self.dispatch_mode = dispatch_mode;
        self
    }

    pub fn with_diagonal_cost(mut self, diagonal_cost: DiagonalCost) -> Self {
        self.diagonal_cost = diagonal_cost;
        self
    }

    pub fn with_record_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }

    pub fn area_extent(&self) -> Vec2 {
        Vec2::new(self.area_width, self.area_height)
    }

    /// Home base of the delivery agents, at the middle of the left edge.
    pub fn depot(&self) -> Vec2 {
        Vec2::new(0.0, self.area_height * 0.5)
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::default().with_diagonal_cost(self.diagonal_cost)
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, v: f32) -> Result<()> {
            if !v.is_finite() || v <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be finite and > 0, got {v}"
                )));
            }
            Ok(())
        }

        positive("area_width", self.area_width)?;
        positive("area_height", self.area_height)?;
        positive("cell_size", self.cell_size)?;
        positive("detection_radius", self.detection_radius)?;
        positive("scout_speed", self.scout_speed)?;
        positive("delivery_speed", self.delivery_speed)?;
        positive("dt", self.dt)?;
        positive("lane_spacing", self.lane_spacing)?;

        if !self.duplicate_claim_radius.is_finite() || self.duplicate_claim_radius < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "duplicate_claim_radius must be finite and >= 0, got {}",
                self.duplicate_claim_radius
            )));
        }
        let lanes = (self.area_width / self.lane_spacing).ceil();
        if lanes > MAX_COVERAGE_LANES as f32 {
            return Err(Error::InvalidConfig(format!(
                "lane_spacing {} over area_width {} needs {lanes} lanes, more than {MAX_COVERAGE_LANES}",
                self.lane_spacing, self.area_width
            )));
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidConfig("max_steps must be > 0".into()));
        }
        if self.dispatch_mode == DispatchMode::CapacityConstrained && self.kit_capacity == 0 {
            return Err(Error::InvalidConfig(
                "kit_capacity must be > 0 in capacity-constrained mode".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.depot(), Vec2::new(0.0, 300.0));
        assert_eq!(config.area_extent(), Vec2::new(800.0, 600.0));
    }

    #[test]
    fn builder_sets_fields() {
        let config = SimConfig::new(Vec2::new(100.0, 50.0))
            .with_cell_size(5.0)
            .with_kit_capacity(3)
            .with_dispatch_mode(DispatchMode::CapacityConstrained)
            .with_diagonal_cost(DiagonalCost::Euclidean)
            .with_record_trace(false);
        assert_eq!(config.area_width, 100.0);
        assert_eq!(config.cell_size, 5.0);
        assert_eq!(config.kit_capacity, 3);
        assert!(!config.record_trace);
        assert_eq!(
            config.search_options().diagonal_cost,
            DiagonalCost::Euclidean
        );
    }

    #[test]
    fn rejects_non_positive_speeds_and_sizes() {
        let base = SimConfig::default();
        for bad in [
            base.clone().with_scout_speed(0.0),
            base.clone().with_delivery_speed(-1.0),
            base.clone().with_cell_size(f32::NAN),
            base.clone().with_dt(0.0),
            base.clone().with_lane_spacing(0.0),
            base.clone().with_detection_radius(-5.0),
            base.clone().with_duplicate_claim_radius(-1.0),
            base.clone().with_max_steps(0),
            SimConfig::new(Vec2::new(0.0, 10.0)),
        ] {
            assert!(
                matches!(bad.validate(), Err(Error::InvalidConfig(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn zero_capacity_only_matters_when_constrained() {
        let config = SimConfig::default().with_kit_capacity(0);
        assert!(config.validate().is_ok());
        assert!(config
            .with_dispatch_mode(DispatchMode::CapacityConstrained)
            .validate()
            .is_err());
    }

    #[test]
    fn dispatch_mode_display() {
        assert_eq!(DispatchMode::Unconstrained.to_string(), "unconstrained");
        assert_eq!(
            DispatchMode::CapacityConstrained.to_string(),
            "capacity-constrained"
        );
    }

    #[test]
    fn rejects_lane_spacing_too_fine_for_area() {
        let config = SimConfig::default().with_lane_spacing(1e-30);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        assert!(SimConfig::default()
            .with_lane_spacing(0.001)
            .validate()
            .is_ok());
    }

    #[test]
    fn zero_duplicate_radius_is_allowed() {
        assert!(SimConfig::default()
            .with_duplicate_claim_radius(0.0)
            .validate()
            .is_ok());
    }
}
