//! Constant-speed waypoint following.
use glam::Vec2;

use crate::sim::Agent;

/// Result of advancing an agent by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotionOutcome {
    /// The agent is not travelling and did not move.
    Stationary,
    /// Moved toward the current waypoint without reaching it.
    Moved,
    /// Snapped onto the current waypoint and advanced the cursor.
    WaypointReached,
    /// The agent is travelling but has no waypoints left. The caller applies the
    /// arrival transition.
    PathExhausted,
}

/// Moves `position` toward `target` by `speed * dt`.
///
/// Snaps onto `target` and returns `true` when it is strictly closer than one step.
pub fn step_toward(position: Vec2, target: Vec2, speed: f32, dt: f32) -> (Vec2, bool) {
    let step = speed * dt;
    let offset = target - position;
    let dist = offset.length();
    if dist < step {
        (target, true)
    } else {
        (position + offset / dist * step, false)
    }
}

impl Agent {
    /// Advances along the path by one tick if the agent is `Moving` or `Returning`.
    ///
    /// Arrival transitions are left to the caller; this only reports
    /// [`MotionOutcome::PathExhausted`].
    pub fn advance(&mut self, speed: f32, dt: f32) -> MotionOutcome {
        if !self.state.is_travelling() {
            return MotionOutcome::Stationary;
        }
        self.follow_path(speed, dt)
    }

    /// Advances along the path by one tick regardless of state.
    pub(crate) fn follow_path(&mut self, speed: f32, dt: f32) -> MotionOutcome {
        let Some(&target) = self.path.get(self.path_cursor) else {
            return MotionOutcome::PathExhausted;
        };
        let (next, reached) = step_toward(self.position, target, speed, dt);
        self.position = next;
        if reached {
            self.path_cursor += 1;
            MotionOutcome::WaypointReached
        } else {
            MotionOutcome::Moved
        }
    }
}
