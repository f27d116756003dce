//! Tick-based mission simulation: survivors, agents, dispatch, and the run loop.
use std::fmt;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod config;
pub mod dispatch;
pub mod events;
pub mod motion;
pub mod runner;

/// Stable identifier of a ground-truth survivor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurvivorId(pub u32);

impl fmt::Display for SurvivorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identifier of an agent. The scout is always `AgentId(0)`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent-{}", self.0)
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Scout,
    Delivery,
}

/// Motion state of an agent.
///
/// `Idle -> Moving | Returning -> Idle | Completed`. Unconstrained delivery agents also go
/// `Moving -> Returning` directly after dropping their kit. `Completed` is terminal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AgentState {
    #[default]
    Idle,
    /// En route to the assigned task.
    Moving,
    /// En route to the depot.
    Returning,
    Completed,
}

impl AgentState {
    pub fn is_travelling(self) -> bool {
        matches!(self, AgentState::Moving | AgentState::Returning)
    }
}

/// Externally visible status of a survivor.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurvivorStatus {
    Undetected,
    Detected,
    Delivered,
}

/// Ground-truth survivor. `detected` and `delivered` only ever go from `false` to `true`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Survivor {
    pub id: SurvivorId,
    pub position: Vec2,
    detected: bool,
    delivered: bool,
}

impl Survivor {
    pub fn new(id: SurvivorId, position: Vec2) -> Self {
        Self {
            id,
            position,
            detected: false,
            delivered: false,
        }
    }

    pub fn detected(&self) -> bool {
        self.detected
    }

    pub fn delivered(&self) -> bool {
        self.delivered
    }

    pub fn status(&self) -> SurvivorStatus {
        if self.delivered {
            SurvivorStatus::Delivered
        } else if self.detected {
            SurvivorStatus::Detected
        } else {
            SurvivorStatus::Undetected
        }
    }

    /// Marks the survivor detected. Returns `true` only on the first call.
    pub(crate) fn mark_detected(&mut self) -> bool {
        !std::mem::replace(&mut self.detected, true)
    }

    /// Marks the survivor delivered. Returns `true` only on the first call.
    pub(crate) fn mark_delivered(&mut self) -> bool {
        self.detected = true;
        !std::mem::replace(&mut self.delivered, true)
    }
}

/// A scout or delivery agent following a waypoint path.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub role: Role,
    pub position: Vec2,
    pub path: Vec<Vec2>,
    /// Index of the next waypoint in `path`.
    pub path_cursor: usize,
    pub state: AgentState,
    pub assigned_task: Option<SurvivorId>,
}

impl Agent {
    pub fn new(id: AgentId, role: Role, position: Vec2) -> Self {
        Self {
            id,
            role,
            position,
            path: Vec::new(),
            path_cursor: 0,
            state: AgentState::Idle,
            assigned_task: None,
        }
    }

    /// Replaces the current path and rewinds the cursor.
    pub fn set_path(&mut self, path: Vec<Vec2>) {
        self.path = path;
        self.path_cursor = 0;
    }

    /// Remaining waypoints, starting with the current target.
    pub fn remaining_path(&self) -> &[Vec2] {
        self.path.get(self.path_cursor..).unwrap_or_default()
    }

    pub fn path_exhausted(&self) -> bool {
        self.path_cursor >= self.path.len()
    }
}
