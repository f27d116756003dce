//! Event types and sinks for observing simulation runs.
//!
//! This module defines [`SimEvent`] and a set of sinks and adapters to emit, collect, or
//! forward events while executing a [`crate::sim::runner::Simulation`] via
//! [`crate::sim::runner::Simulation::run_with_events`] or
//! [`crate::sim::runner::Simulation::step_with_events`].
use glam::Vec2;

use crate::sim::config::SimConfig;
use crate::sim::runner::SimSummary;
use crate::sim::{AgentId, SurvivorId};

/// Describes events emitted while a simulation runs.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum SimEvent {
    /// Emitted once before the first tick.
    RunStarted {
        config: SimConfig,
        survivor_count: usize,
    },

    /// Emitted once after the last tick.
    RunFinished { summary: SimSummary },

    /// A survivor came within detection range of the scout for the first time.
    SurvivorDetected {
        tick: u32,
        survivor: SurvivorId,
        position: Vec2,
    },

    /// A detection was not dispatched because a claimed delivery site is too close.
    DuplicateSuppressed {
        tick: u32,
        survivor: SurvivorId,
        /// Closest claimed site.
        site: Vec2,
    },

    /// A detection was added to the capacity-constrained task queue.
    TaskQueued {
        tick: u32,
        survivor: SurvivorId,
        queue_len: usize,
    },

    /// A delivery agent was sent toward a survivor.
    Dispatched {
        tick: u32,
        agent: AgentId,
        survivor: SurvivorId,
        waypoints: usize,
    },

    /// No path to the survivor exists; it stays detected but undelivered.
    DispatchFailed {
        tick: u32,
        agent: Option<AgentId>,
        survivor: SurvivorId,
    },

    /// A kit reached a survivor.
    Delivered {
        tick: u32,
        agent: AgentId,
        survivor: SurvivorId,
    },

    /// A delivery agent started back to the depot.
    ReturnStarted {
        tick: u32,
        agent: AgentId,
        /// `true` for a reload trip, `false` for the final return.
        reload: bool,
    },

    /// The capacity-constrained agent refilled its kits at the depot.
    Reloaded {
        tick: u32,
        agent: AgentId,
        kits: u32,
    },

    /// An agent reached its terminal state.
    AgentCompleted { tick: u32, agent: AgentId },

    /// The scout has no coverage waypoints left.
    CoverageCompleted { tick: u32 },

    /// Non-fatal warning generated during the run.
    Warning {
        /// Context string (e.g. agent or survivor id).
        context: String,
        /// Human-readable message.
        message: String,
    },
}

impl SimEvent {
    pub fn kind(&self) -> SimEventKind {
        match self {
            SimEvent::RunStarted { .. } => SimEventKind::RunStarted,
            SimEvent::RunFinished { .. } => SimEventKind::RunFinished,
            SimEvent::SurvivorDetected { .. } => SimEventKind::SurvivorDetected,
            SimEvent::DuplicateSuppressed { .. } => SimEventKind::DuplicateSuppressed,
            SimEvent::TaskQueued { .. } => SimEventKind::TaskQueued,
            SimEvent::Dispatched { .. } => SimEventKind::Dispatched,
            SimEvent::DispatchFailed { .. } => SimEventKind::DispatchFailed,
            SimEvent::Delivered { .. } => SimEventKind::Delivered,
            SimEvent::ReturnStarted { .. } => SimEventKind::ReturnStarted,
            SimEvent::Reloaded { .. } => SimEventKind::Reloaded,
            SimEvent::AgentCompleted { .. } => SimEventKind::AgentCompleted,
            SimEvent::CoverageCompleted { .. } => SimEventKind::CoverageCompleted,
            SimEvent::Warning { .. } => SimEventKind::Warning,
        }
    }
}

/// Discriminant of [`SimEvent`], used by sinks to opt out of event construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SimEventKind {
    RunStarted,
    RunFinished,
    SurvivorDetected,
    DuplicateSuppressed,
    TaskQueued,
    Dispatched,
    DispatchFailed,
    Delivered,
    ReturnStarted,
    Reloaded,
    AgentCompleted,
    CoverageCompleted,
    Warning,
}

/// A generic event sink that accepts [`SimEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: SimEvent);

    /// Whether events of `kind` should be built and sent at all.
    #[inline]
    fn wants(&self, _kind: SimEventKind) -> bool {
        true
    }
}

/// Forwards through a borrow, so sinks can be lent to a [`MultiSink`] and read afterwards.
impl<S: EventSink + ?Sized> EventSink for &mut S {
    #[inline]
    fn send(&mut self, event: SimEvent) {
        (**self).send(event);
    }

    #[inline]
    fn wants(&self, kind: SimEventKind) -> bool {
        (**self).wants(kind)
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: SimEvent) {}

    #[inline]
    fn wants(&self, _kind: SimEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(SimEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(SimEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(SimEvent),
{
    #[inline]
    fn send(&mut self, event: SimEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally restricted to some kinds.
#[derive(Default)]
pub struct VecSink {
    events: Vec<SimEvent>,
    only: Option<Vec<SimEventKind>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            events: Vec::with_capacity(cap),
            only: None,
        }
    }

    /// Collects only events whose kind is in `kinds`.
    pub fn only(kinds: impl IntoIterator<Item = SimEventKind>) -> Self {
        Self {
            events: Vec::new(),
            only: Some(kinds.into_iter().collect()),
        }
    }

    pub fn into_inner(self) -> Vec<SimEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: SimEvent) {
        if self.wants(event.kind()) {
            self.events.push(event);
        }
    }

    fn wants(&self, kind: SimEventKind) -> bool {
        self.only.as_ref().is_none_or(|kinds| kinds.contains(&kind))
    }
}

/// Fan-out sink that forwards each event to all contained sinks.
pub struct MultiSink<S: EventSink> {
    pub(crate) sinks: Vec<S>,
}

impl<S: EventSink> MultiSink<S> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sinks(sinks: Vec<S>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl<S: EventSink> Default for MultiSink<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventSink> EventSink for MultiSink<S> {
    fn send(&mut self, event: SimEvent) {
        let Some(last_idx) = self.sinks.len().checked_sub(1) else {
            return;
        };
        for i in 0..last_idx {
            self.sinks[i].send(event.clone());
        }
        self.sinks[last_idx].send(event);
    }

    fn wants(&self, kind: SimEventKind) -> bool {
        self.sinks.iter().any(|s| s.wants(kind))
    }
}
