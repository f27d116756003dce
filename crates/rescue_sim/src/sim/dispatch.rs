//! Dispatch scheduling: turns scout detections into delivery agent routes.
//!
//! The [`Scheduler`] owns the ground-truth survivors, the delivery agents, the task queue,
//! the kit inventory, and the registry of claimed delivery sites. All of it is mutated only
//! through [`Scheduler::detect`] and [`Scheduler::update`], called once each per tick from
//! the run loop in that order.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::grid::{find_path_with, OccupancyGrid, SearchOptions};
use crate::sim::config::{DispatchMode, SimConfig};
use crate::sim::events::{EventSink, SimEvent, SimEventKind};
use crate::sim::motion::MotionOutcome;
use crate::sim::{Agent, AgentId, AgentState, Role, Survivor, SurvivorId};

/// Kits on board the capacity-constrained agent. Always within `0..=capacity`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KitInventory {
    remaining: u32,
    capacity: u32,
}

impl KitInventory {
    /// A full inventory.
    pub fn new(capacity: u32) -> Self {
        Self {
            remaining: capacity,
            capacity,
        }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Removes one kit. Returns `false` and leaves the count unchanged when empty.
    pub fn take(&mut self) -> bool {
        match self.remaining.checked_sub(1) {
            Some(left) => {
                self.remaining = left;
                true
            }
            None => false,
        }
    }

    pub(crate) fn refill(&mut self) {
        self.remaining = self.capacity;
    }
}

/// Survivors waiting for the capacity-constrained agent. Order carries no meaning.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskQueue {
    pending: Vec<SurvivorId>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: SurvivorId) {
        self.pending.push(id);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, id: SurvivorId) -> bool {
        self.pending.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = SurvivorId> + '_ {
        self.pending.iter().copied()
    }

    /// Removes and returns the queued survivor closest to `from`; the first one queued wins ties.
    pub fn take_nearest(&mut self, from: Vec2, survivors: &[Survivor]) -> Option<SurvivorId> {
        let mut best: Option<(usize, f32)> = None;
        for (slot, id) in self.pending.iter().enumerate() {
            let Some(s) = survivors.iter().find(|s| s.id == *id) else {
                continue;
            };
            let d = from.distance(s.position);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((slot, d));
            }
        }
        best.map(|(slot, _)| self.pending.remove(slot))
    }
}

/// Positions that already received (or are about to receive) a kit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverySites {
    sites: Vec<Vec2>,
    radius: f32,
}

impl DeliverySites {
    /// `radius` is the duplicate-claim radius.
    pub fn new(radius: f32) -> Self {
        Self {
            sites: Vec::new(),
            radius,
        }
    }

    /// Claims `position` unless an existing site lies strictly within the radius, in which
    /// case the closest such site is returned and nothing is recorded.
    pub fn try_claim(&mut self, position: Vec2) -> Result<(), Vec2> {
        let conflict = self
            .sites
            .iter()
            .copied()
            .filter(|s| s.distance(position) < self.radius)
            .min_by(|a, b| a.distance(position).total_cmp(&b.distance(position)));
        match conflict {
            Some(site) => Err(site),
            None => {
                self.sites.push(position);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn as_slice(&self) -> &[Vec2] {
        &self.sites
    }
}

/// Owns all dispatch state and applies the active [`DispatchMode`] policy.
#[derive(Clone, Debug)]
pub struct Scheduler {
    mode: DispatchMode,
    depot: Vec2,
    delivery_speed: f32,
    dt: f32,
    search: SearchOptions,
    survivors: Vec<Survivor>,
    agents: Vec<Agent>,
    queue: TaskQueue,
    kits: Option<KitInventory>,
    sites: DeliverySites,
    stranded: Vec<SurvivorId>,
    next_agent_id: u32,
}

impl Scheduler {
    /// Creates a scheduler for `survivors`. Assumes `config` has been validated.
    pub fn new(config: &SimConfig, survivors: Vec<Survivor>) -> Self {
        let depot = config.depot();
        let mut scheduler = Self {
            mode: config.dispatch_mode,
            depot,
            delivery_speed: config.delivery_speed,
            dt: config.dt,
            search: config.search_options(),
            survivors,
            agents: Vec::new(),
            queue: TaskQueue::new(),
            kits: None,
            sites: DeliverySites::new(config.duplicate_claim_radius),
            stranded: Vec::new(),
            next_agent_id: 1,
        };
        if config.dispatch_mode == DispatchMode::CapacityConstrained {
            scheduler.kits = Some(KitInventory::new(config.kit_capacity));
            let id = scheduler.allocate_agent_id();
            scheduler.agents.push(Agent::new(id, Role::Delivery, depot));
        }
        scheduler
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn depot(&self) -> Vec2 {
        self.depot
    }

    pub fn survivors(&self) -> &[Survivor] {
        &self.survivors
    }

    pub fn survivor(&self, id: SurvivorId) -> Option<&Survivor> {
        self.survivors.iter().find(|s| s.id == id)
    }

    /// Delivery agents in creation order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Kit inventory, present only in capacity-constrained mode.
    pub fn kits(&self) -> Option<&KitInventory> {
        self.kits.as_ref()
    }

    pub fn sites(&self) -> &DeliverySites {
        &self.sites
    }

    /// Survivors that were selected for dispatch but had no path.
    pub fn stranded(&self) -> &[SurvivorId] {
        &self.stranded
    }

    pub fn detected_count(&self) -> usize {
        self.survivors.iter().filter(|s| s.detected()).count()
    }

    pub fn delivered_count(&self) -> usize {
        self.survivors.iter().filter(|s| s.delivered()).count()
    }

    /// Marks undetected survivors strictly within `radius` of `scout` as detected and
    /// dispatches or queues the ones that are not duplicates of a claimed site.
    pub fn detect(
        &mut self,
        tick: u32,
        scout: Vec2,
        radius: f32,
        grid: &OccupancyGrid,
        sink: &mut dyn EventSink,
    ) {
        for idx in 0..self.survivors.len() {
            let survivor = &mut self.survivors[idx];
            if survivor.detected() || survivor.position.distance(scout) >= radius {
                continue;
            }
            survivor.mark_detected();
            let (id, position) = (survivor.id, survivor.position);
            debug!("Tick {tick}: survivor {id} detected at {position}.");
            if sink.wants(SimEventKind::SurvivorDetected) {
                sink.send(SimEvent::SurvivorDetected {
                    tick,
                    survivor: id,
                    position,
                });
            }

            if let Err(site) = self.sites.try_claim(position) {
                debug!("Tick {tick}: survivor {id} is within claim radius of {site}; not dispatched.");
                if sink.wants(SimEventKind::DuplicateSuppressed) {
                    sink.send(SimEvent::DuplicateSuppressed {
                        tick,
                        survivor: id,
                        site,
                    });
                }
                continue;
            }

            match self.mode {
                DispatchMode::Unconstrained => self.spawn_agent(tick, id, position, grid, sink),
                DispatchMode::CapacityConstrained => {
                    self.queue.push(id);
                    if sink.wants(SimEventKind::TaskQueued) {
                        sink.send(SimEvent::TaskQueued {
                            tick,
                            survivor: id,
                            queue_len: self.queue.len(),
                        });
                    }
                }
            }
        }
    }

    /// Applies dispatch decisions, then advances every delivery agent by one tick.
    pub fn update(
        &mut self,
        tick: u32,
        coverage_complete: bool,
        grid: &OccupancyGrid,
        sink: &mut dyn EventSink,
    ) {
        if self.mode == DispatchMode::CapacityConstrained {
            self.decide(tick, coverage_complete, grid, sink);
        }
        for idx in 0..self.agents.len() {
            if self.agents[idx].advance(self.delivery_speed, self.dt) == MotionOutcome::PathExhausted {
                self.arrive(tick, idx, sink);
            }
        }
    }

    /// Whether all delivery work is finished under the active policy.
    pub fn is_done(&self, coverage_complete: bool) -> bool {
        if !coverage_complete {
            return false;
        }
        match self.mode {
            DispatchMode::Unconstrained => {
                self.survivors.iter().all(|s| s.delivered())
                    && self.agents.iter().all(|a| a.state == AgentState::Completed)
            }
            DispatchMode::CapacityConstrained => {
                self.queue.is_empty()
                    && self
                        .agents
                        .first()
                        .is_some_and(|a| a.state == AgentState::Completed)
            }
        }
    }

    fn allocate_agent_id(&mut self) -> AgentId {
        let id = AgentId(self.next_agent_id);
        self.next_agent_id += 1;
        id
    }

    fn plan(&self, grid: &OccupancyGrid, from: Vec2, to: Vec2) -> Option<Vec<Vec2>> {
        let start = grid.world_to_cell(from);
        let goal = grid.world_to_cell(to);
        find_path_with(grid, start, goal, &self.search)
            .map(|cells| cells.into_iter().map(|c| grid.cell_to_world(c)).collect())
    }

    fn spawn_agent(
        &mut self,
        tick: u32,
        survivor: SurvivorId,
        target: Vec2,
        grid: &OccupancyGrid,
        sink: &mut dyn EventSink,
    ) {
        let Some(path) = self.plan(grid, self.depot, target) else {
            self.strand(tick, None, survivor, sink);
            return;
        };
        let id = self.allocate_agent_id();
        let mut agent = Agent::new(id, Role::Delivery, self.depot);
        let waypoints = path.len();
        agent.set_path(path);
        agent.state = AgentState::Moving;
        agent.assigned_task = Some(survivor);
        self.agents.push(agent);
        debug!("Tick {tick}: {id} launched toward survivor {survivor} ({waypoints} waypoints).");
        if sink.wants(SimEventKind::Dispatched) {
            sink.send(SimEvent::Dispatched {
                tick,
                agent: id,
                survivor,
                waypoints,
            });
        }
    }

    fn decide(
        &mut self,
        tick: u32,
        coverage_complete: bool,
        grid: &OccupancyGrid,
        sink: &mut dyn EventSink,
    ) {
        let Some(agent) = self.agents.first() else {
            return;
        };
        if agent.state != AgentState::Idle {
            return;
        }
        let (agent_id, position) = (agent.id, agent.position);
        let kits_empty = self.kits.is_some_and(|k| k.is_empty());

        if kits_empty {
            self.start_return(tick, position, true, grid, sink);
        } else if !self.queue.is_empty() {
            let Some(survivor) = self.queue.take_nearest(position, &self.survivors) else {
                return;
            };
            let Some(target) = self.survivor(survivor).map(|s| s.position) else {
                return;
            };
            let Some(path) = self.plan(grid, position, target) else {
                self.strand(tick, Some(agent_id), survivor, sink);
                return;
            };
            let taken = self.kits.as_mut().is_some_and(|k| k.take());
            debug_assert!(taken, "dispatching with an empty inventory");
            let waypoints = path.len();
            let agent = &mut self.agents[0];
            agent.set_path(path);
            agent.state = AgentState::Moving;
            agent.assigned_task = Some(survivor);
            debug!(
                "Tick {tick}: {agent_id} dispatched to survivor {survivor}, {} kits left.",
                self.kits.map_or(0, |k| k.remaining())
            );
            if sink.wants(SimEventKind::Dispatched) {
                sink.send(SimEvent::Dispatched {
                    tick,
                    agent: agent_id,
                    survivor,
                    waypoints,
                });
            }
        } else if coverage_complete {
            self.start_return(tick, position, false, grid, sink);
        }
    }

    fn start_return(
        &mut self,
        tick: u32,
        from: Vec2,
        reload: bool,
        grid: &OccupancyGrid,
        sink: &mut dyn EventSink,
    ) {
        let Some(path) = self.plan(grid, from, self.depot) else {
            warn!("Tick {tick}: no path back to the depot from {from}; retrying next tick.");
            if sink.wants(SimEventKind::Warning) {
                sink.send(SimEvent::Warning {
                    context: format!("tick:{tick}"),
                    message: format!("No path to depot from {from}"),
                });
            }
            return;
        };
        let agent = &mut self.agents[0];
        agent.set_path(path);
        agent.state = AgentState::Returning;
        agent.assigned_task = None;
        let id = agent.id;
        debug!("Tick {tick}: {id} returning to depot (reload: {reload}).");
        if sink.wants(SimEventKind::ReturnStarted) {
            sink.send(SimEvent::ReturnStarted {
                tick,
                agent: id,
                reload,
            });
        }
    }

    fn strand(
        &mut self,
        tick: u32,
        agent: Option<AgentId>,
        survivor: SurvivorId,
        sink: &mut dyn EventSink,
    ) {
        warn!("Tick {tick}: no path to survivor {survivor}; leaving it undelivered.");
        self.stranded.push(survivor);
        if sink.wants(SimEventKind::DispatchFailed) {
            sink.send(SimEvent::DispatchFailed {
                tick,
                agent,
                survivor,
            });
        }
    }

    fn deliver(&mut self, tick: u32, agent: AgentId, survivor: SurvivorId, sink: &mut dyn EventSink) {
        let Some(s) = self.survivors.iter_mut().find(|s| s.id == survivor) else {
            return;
        };
        if s.mark_delivered() {
            debug!("Tick {tick}: {agent} delivered a kit to survivor {survivor}.");
            if sink.wants(SimEventKind::Delivered) {
                sink.send(SimEvent::Delivered {
                    tick,
                    agent,
                    survivor,
                });
            }
        }
    }

    fn arrive(&mut self, tick: u32, idx: usize, sink: &mut dyn EventSink) {
        let (id, state, task) = {
            let a = &self.agents[idx];
            (a.id, a.state, a.assigned_task)
        };
        match (self.mode, state) {
            (DispatchMode::Unconstrained, AgentState::Moving) => {
                if let Some(survivor) = task {
                    self.deliver(tick, id, survivor, sink);
                }
                let agent = &mut self.agents[idx];
                let mut back = std::mem::take(&mut agent.path);
                back.reverse();
                agent.set_path(back);
                agent.state = AgentState::Returning;
                agent.assigned_task = None;
                if sink.wants(SimEventKind::ReturnStarted) {
                    sink.send(SimEvent::ReturnStarted {
                        tick,
                        agent: id,
                        reload: false,
                    });
                }
            }
            (DispatchMode::CapacityConstrained, AgentState::Moving) => {
                if let Some(survivor) = task {
                    self.deliver(tick, id, survivor, sink);
                }
                let agent = &mut self.agents[idx];
                agent.state = AgentState::Idle;
                agent.assigned_task = None;
            }
            (DispatchMode::CapacityConstrained, AgentState::Returning)
                if self.kits.is_some_and(|k| k.is_empty()) =>
            {
                if let Some(kits) = self.kits.as_mut() {
                    kits.refill();
                }
                let kits = self.kits.map_or(0, |k| k.remaining());
                self.agents[idx].state = AgentState::Idle;
                debug!("Tick {tick}: {id} reloaded to {kits} kits.");
                if sink.wants(SimEventKind::Reloaded) {
                    sink.send(SimEvent::Reloaded {
                        tick,
                        agent: id,
                        kits,
                    });
                }
            }
            (_, AgentState::Returning) => {
                self.agents[idx].state = AgentState::Completed;
                debug!("Tick {tick}: {id} back at depot, done.");
                if sink.wants(SimEventKind::AgentCompleted) {
                    sink.send(SimEvent::AgentCompleted { tick, agent: id });
                }
            }
            _ => {}
        }
    }
}
