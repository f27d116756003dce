//! Live mission side: survivor reports from the scout's detector and delivery ordering.
//!
//! Unlike [`crate::sim`], nothing here knows the ground truth. A [`SurvivorRegistry`]
//! accumulates noisy [`Detection`]s, merging repeated sightings of the same person, and
//! [`plan_delivery`] orders the pending ones for a single delivery run.
use glam::Vec2;
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::planning::plan_route_by_id;
use crate::sim::SurvivorId;

/// Reports at or below this confidence are discarded.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// A person sighting at an estimated position.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub position: Vec2,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Detection {
    pub fn new(position: Vec2, confidence: f32) -> Self {
        Self {
            position,
            confidence,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MissionStatus {
    #[default]
    Detected,
    Delivered,
}

/// A survivor known to the mission, identified by a stable id.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TrackedSurvivor {
    pub id: SurvivorId,
    pub position: Vec2,
    /// Highest confidence reported so far.
    pub confidence: f32,
    pub status: MissionStatus,
}

/// What [`SurvivorRegistry::report`] did with a detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Confidence too low.
    Ignored,
    /// Registered as a new survivor.
    Added(SurvivorId),
    /// Within the merge radius of a known survivor.
    Merged(SurvivorId),
}

/// Known survivors in registration order. Ids start at 1 and are never reused.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct SurvivorRegistry {
    merge_radius: f32,
    min_confidence: f32,
    survivors: Vec<TrackedSurvivor>,
}

impl SurvivorRegistry {
    /// Reports strictly closer than `merge_radius` to a known survivor are merged into it.
    pub fn new(merge_radius: f32) -> Self {
        Self {
            merge_radius,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            survivors: Vec::new(),
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn merge_radius(&self) -> f32 {
        self.merge_radius
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    pub fn report(&mut self, detection: Detection) -> ReportOutcome {
        if !(detection.confidence > self.min_confidence) {
            return ReportOutcome::Ignored;
        }

        if let Some(known) = self
            .survivors
            .iter_mut()
            .find(|s| s.position.distance(detection.position) < self.merge_radius)
        {
            if detection.confidence > known.confidence {
                known.confidence = detection.confidence;
            }
            return ReportOutcome::Merged(known.id);
        }

        let id = SurvivorId(self.survivors.len() as u32 + 1);
        debug!(
            "Registered survivor {id} at {} (confidence {:.2}).",
            detection.position, detection.confidence
        );
        self.survivors.push(TrackedSurvivor {
            id,
            position: detection.position,
            confidence: detection.confidence,
            status: MissionStatus::Detected,
        });
        ReportOutcome::Added(id)
    }

    pub fn ingest(&mut self, detections: impl IntoIterator<Item = Detection>) -> Vec<ReportOutcome> {
        detections.into_iter().map(|d| self.report(d)).collect()
    }

    pub fn get(&self, id: SurvivorId) -> Option<&TrackedSurvivor> {
        self.survivors.iter().find(|s| s.id == id)
    }

    /// Marks a survivor delivered. Delivering twice is not an error.
    pub fn mark_delivered(&mut self, id: SurvivorId) -> Result<()> {
        let s = self
            .survivors
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(Error::UnknownSurvivor { id })?;
        s.status = MissionStatus::Delivered;
        Ok(())
    }

    /// Survivors still waiting for a kit, in registration order.
    pub fn pending(&self) -> impl Iterator<Item = &TrackedSurvivor> {
        self.survivors
            .iter()
            .filter(|s| s.status == MissionStatus::Detected)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedSurvivor> {
        self.survivors.iter()
    }

    pub fn len(&self) -> usize {
        self.survivors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.survivors.is_empty()
    }
}

/// Visiting order over the pending survivors, nearest first starting from `depot`.
pub fn plan_delivery(depot: Vec2, registry: &SurvivorRegistry) -> Vec<SurvivorId> {
    let stops: Vec<(SurvivorId, Vec2)> = registry.pending().map(|s| (s.id, s.position)).collect();
    plan_route_by_id(depot, &stops)
}

/// Turns detector confidences at the scout's position into positioned [`Detection`]s.
#[derive(Clone, Debug)]
pub struct SimulatedDetector {
    /// Full width of the uniform position jitter on each axis.
    pub spread: f32,
    pub min_confidence: f32,
}

impl Default for SimulatedDetector {
    fn default() -> Self {
        Self {
            spread: 10.0,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl SimulatedDetector {
    pub fn new(spread: f32) -> Self {
        Self {
            spread,
            ..Default::default()
        }
    }

    /// Returns `None` when `confidence` does not exceed the threshold. Consumes two rng
    /// values otherwise.
    pub fn detect(&self, scout: Vec2, confidence: f32, rng: &mut dyn RngCore) -> Option<Detection> {
        if !(confidence > self.min_confidence) {
            return None;
        }
        let jitter = Vec2::new(rand01(rng) - 0.5, rand01(rng) - 0.5) * self.spread;
        Some(Detection::new(scout + jitter, confidence))
    }
}

fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    struct FixedRng {
        value: u32,
    }

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.value
        }

        fn next_u64(&mut self) -> u64 {
            self.value as u64
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 4];
            }
        }
    }

    #[test]
    fn low_confidence_reports_are_ignored() {
        let mut registry = SurvivorRegistry::new(5.0);
        assert_eq!(
            registry.report(Detection::new(Vec2::ZERO, 0.5)),
            ReportOutcome::Ignored
        );
        assert_eq!(
            registry.report(Detection::new(Vec2::ZERO, f32::NAN)),
            ReportOutcome::Ignored
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn nearby_reports_merge_and_raise_confidence() {
        let mut registry = SurvivorRegistry::new(5.0);
        let outcomes = registry.ingest([
            Detection::new(Vec2::new(10.0, 10.0), 0.6),
            Detection::new(Vec2::new(12.0, 10.0), 0.9),
            Detection::new(Vec2::new(12.0, 10.0), 0.7),
            Detection::new(Vec2::new(15.0, 10.0), 0.8),
        ]);
        assert_eq!(
            outcomes,
            vec![
                ReportOutcome::Added(SurvivorId(1)),
                ReportOutcome::Merged(SurvivorId(1)),
                ReportOutcome::Merged(SurvivorId(1)),
                ReportOutcome::Added(SurvivorId(2)),
            ]
        );
        let first = registry.get(SurvivorId(1)).unwrap();
        assert_eq!(first.confidence, 0.9);
        assert_eq!(first.position, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn delivered_survivors_leave_the_pending_set() {
        let mut registry = SurvivorRegistry::new(1.0);
        registry.report(Detection::new(Vec2::new(1.0, 0.0), 0.9));
        registry.report(Detection::new(Vec2::new(5.0, 0.0), 0.9));
        registry.mark_delivered(SurvivorId(1)).unwrap();
        registry.mark_delivered(SurvivorId(1)).unwrap();

        let pending: Vec<_> = registry.pending().map(|s| s.id).collect();
        assert_eq!(pending, vec![SurvivorId(2)]);
        assert!(matches!(
            registry.mark_delivered(SurvivorId(9)),
            Err(Error::UnknownSurvivor { id: SurvivorId(9) })
        ));
    }

    #[test]
    fn delivery_plan_returns_ids_nearest_first() {
        let mut registry = SurvivorRegistry::new(1.0);
        registry.ingest([
            Detection::new(Vec2::new(300.0, 0.0), 0.9),
            Detection::new(Vec2::new(100.0, 0.0), 0.9),
            Detection::new(Vec2::new(200.0, 0.0), 0.9),
            Detection::new(Vec2::new(50.0, 0.0), 0.9),
        ]);
        registry.mark_delivered(SurvivorId(4)).unwrap();

        let order = plan_delivery(Vec2::ZERO, &registry);
        assert_eq!(order, vec![SurvivorId(2), SurvivorId(3), SurvivorId(1)]);
    }

    #[test]
    fn empty_registry_plans_nothing() {
        let registry = SurvivorRegistry::new(1.0);
        assert!(plan_delivery(Vec2::ZERO, &registry).is_empty());
    }

    #[test]
    fn detector_drops_weak_signals() {
        let detector = SimulatedDetector::default();
        let mut rng = FixedRng { value: 0 };
        assert!(detector.detect(Vec2::ZERO, 0.3, &mut rng).is_none());
    }

    #[test]
    fn detector_jitter_is_centered_on_scout() {
        let detector = SimulatedDetector::new(10.0);
        let mut rng = FixedRng { value: 0 };
        let d = detector
            .detect(Vec2::new(100.0, 100.0), 0.8, &mut rng)
            .unwrap();
        assert_eq!(d.position, Vec2::new(95.0, 95.0));
        assert_eq!(d.confidence, 0.8);
    }

    #[test]
    fn detector_jitter_stays_within_spread() {
        let detector = SimulatedDetector::new(4.0);
        let mut rng = StdRng::seed_from_u64(42);
        let scout = Vec2::new(50.0, 50.0);
        for _ in 0..200 {
            let d = detector.detect(scout, 0.9, &mut rng).unwrap();
            let offset = d.position - scout;
            assert!(offset.x.abs() <= 2.0 && offset.y.abs() <= 2.0);
        }
    }
}
