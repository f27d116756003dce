//! Tick loop driving the scout, detection, dispatch, and delivery motion.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::grid::OccupancyGrid;
use crate::planning::{BoustrophedonCoverage, CoveragePattern};
use crate::sim::config::SimConfig;
use crate::sim::dispatch::{KitInventory, Scheduler};
use crate::sim::events::{EventSink, SimEvent, SimEventKind};
use crate::sim::{Agent, AgentId, AgentState, Role, Survivor, SurvivorId, SurvivorStatus};

/// Why a run stopped.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The termination condition of the active dispatch mode was met.
    AllWorkDone,
    /// The tick counter reached `max_steps` first.
    StepLimit,
}

/// Position and state of one agent at the end of a tick.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub role: Role,
    pub position: Vec2,
    pub state: AgentState,
    pub assigned_task: Option<SurvivorId>,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            role: agent.role,
            position: agent.position,
            state: agent.state,
            assigned_task: agent.assigned_task,
        }
    }
}

/// Observable world state at the end of a tick.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct WorldState {
    pub tick: u32,
    pub scout: AgentSnapshot,
    /// Delivery agents in creation order.
    pub delivery_agents: Vec<AgentSnapshot>,
    pub survivors: Vec<(SurvivorId, SurvivorStatus)>,
    /// Remaining and total kits, present only in capacity-constrained mode.
    pub kits: Option<(u32, u32)>,
    pub queue_len: usize,
}

/// Aggregate counts for a finished run.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimSummary {
    pub total_survivors: usize,
    pub detected: usize,
    pub delivered: usize,
    /// Survivors selected for dispatch that had no path.
    pub stranded: usize,
    pub delivery_agents: usize,
    /// Ticks executed.
    pub ticks: u32,
    pub stop_reason: StopReason,
}

/// Result of [`Simulation::run`].
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct RunResult {
    pub summary: SimSummary,
    /// One entry per tick when [`SimConfig::record_trace`] is set, empty otherwise.
    pub trace: Vec<WorldState>,
}

/// A single simulation run. Owns the grid, the scout, and the [`Scheduler`].
#[derive(Clone, Debug)]
pub struct Simulation {
    config: SimConfig,
    grid: OccupancyGrid,
    scout: Agent,
    coverage_complete: bool,
    scheduler: Scheduler,
    tick: u32,
    stop: Option<StopReason>,
    trace: Vec<WorldState>,
}

impl Simulation {
    /// Creates a run over an all-free grid with the boustrophedon scout path.
    ///
    /// Survivors get ids `0..n` in iteration order.
    pub fn try_new(config: SimConfig, survivors: impl IntoIterator<Item = Vec2>) -> Result<Self> {
        config.validate()?;
        let grid = OccupancyGrid::covering(config.area_extent(), config.cell_size)?;
        let pattern = BoustrophedonCoverage::new(config.lane_spacing);
        let survivors: Vec<Survivor> = survivors
            .into_iter()
            .enumerate()
            .map(|(i, p)| Survivor::new(SurvivorId(i as u32), p))
            .collect();
        let scheduler = Scheduler::new(&config, survivors);

        let mut sim = Self {
            scout: Agent::new(AgentId(0), Role::Scout, config.depot()),
            coverage_complete: false,
            scheduler,
            tick: 0,
            stop: None,
            trace: Vec::new(),
            grid,
            config,
        };
        sim.set_coverage(&pattern);
        Ok(sim)
    }

    /// Replaces the all-free grid. Its dimensions must match the configured area and cell size.
    pub fn with_grid(mut self, grid: OccupancyGrid) -> Result<Self> {
        let expected = OccupancyGrid::covering(self.config.area_extent(), self.config.cell_size)?;
        if grid.width() != expected.width()
            || grid.height() != expected.height()
            || grid.cell_size() != expected.cell_size()
        {
            return Err(Error::InvalidGrid(format!(
                "expected {}x{} cells of size {}, got {}x{} of size {}",
                expected.width(),
                expected.height(),
                expected.cell_size(),
                grid.width(),
                grid.height(),
                grid.cell_size()
            )));
        }
        self.grid = grid;
        Ok(self)
    }

    /// Replaces the scout's scan path.
    pub fn with_coverage_pattern(mut self, pattern: &dyn CoveragePattern) -> Self {
        self.set_coverage(pattern);
        self
    }

    fn set_coverage(&mut self, pattern: &dyn CoveragePattern) {
        let path: Vec<Vec2> = pattern
            .waypoints(self.config.area_extent().into())
            .into_iter()
            .map(Vec2::from)
            .collect();
        if let Some(&first) = path.first() {
            self.scout.position = first;
        }
        self.coverage_complete = path.is_empty();
        self.scout.state = if self.coverage_complete {
            AgentState::Completed
        } else {
            AgentState::Moving
        };
        self.scout.set_path(path);
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scout(&self) -> &Agent {
        &self.scout
    }

    pub fn delivery_agents(&self) -> &[Agent] {
        self.scheduler.agents()
    }

    pub fn survivors(&self) -> &[Survivor] {
        self.scheduler.survivors()
    }

    pub fn survivor_status(&self, id: SurvivorId) -> Result<SurvivorStatus> {
        self.scheduler
            .survivor(id)
            .map(Survivor::status)
            .ok_or(Error::UnknownSurvivor { id })
    }

    pub fn kits(&self) -> Option<&KitInventory> {
        self.scheduler.kits()
    }

    /// Ticks executed so far.
    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn coverage_complete(&self) -> bool {
        self.coverage_complete
    }

    /// `Some` once the run has stopped.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Trace recorded so far.
    pub fn trace(&self) -> &[WorldState] {
        &self.trace
    }

    pub fn snapshot(&self) -> WorldState {
        WorldState {
            tick: self.tick,
            scout: AgentSnapshot::from(&self.scout),
            delivery_agents: self.scheduler.agents().iter().map(AgentSnapshot::from).collect(),
            survivors: self
                .scheduler
                .survivors()
                .iter()
                .map(|s| (s.id, s.status()))
                .collect(),
            kits: self.scheduler.kits().map(|k| (k.remaining(), k.capacity())),
            queue_len: self.scheduler.queue().len(),
        }
    }

    pub fn summary(&self) -> SimSummary {
        SimSummary {
            total_survivors: self.scheduler.survivors().len(),
            detected: self.scheduler.detected_count(),
            delivered: self.scheduler.delivered_count(),
            stranded: self.scheduler.stranded().len(),
            delivery_agents: self.scheduler.agents().len(),
            ticks: self.tick,
            stop_reason: self.stop.unwrap_or(StopReason::StepLimit),
        }
    }

    /// Executes one tick. Returns the stop reason once the run has stopped; further calls
    /// do nothing.
    pub fn step(&mut self) -> Option<StopReason> {
        self.step_with_events(&mut ())
    }

    pub fn step_with_events(&mut self, sink: &mut dyn EventSink) -> Option<StopReason> {
        if self.stop.is_some() {
            return self.stop;
        }
        self.tick += 1;
        let tick = self.tick;

        if !self.coverage_complete {
            self.scout.follow_path(self.config.scout_speed, self.config.dt);
        }
        if !self.coverage_complete && self.scout.path_exhausted() {
            self.coverage_complete = true;
            self.scout.state = AgentState::Completed;
            info!("Tick {tick}: scout finished its coverage path.");
            if sink.wants(SimEventKind::CoverageCompleted) {
                sink.send(SimEvent::CoverageCompleted { tick });
            }
        }

        self.scheduler.detect(
            tick,
            self.scout.position,
            self.config.detection_radius,
            &self.grid,
            sink,
        );
        self.scheduler
            .update(tick, self.coverage_complete, &self.grid, sink);

        if self.config.record_trace {
            self.trace.push(self.snapshot());
        }

        if self.scheduler.is_done(self.coverage_complete) {
            self.stop = Some(StopReason::AllWorkDone);
        } else if tick >= self.config.max_steps {
            warn!(
                "Step limit of {} reached with {}/{} survivors delivered.",
                self.config.max_steps,
                self.scheduler.delivered_count(),
                self.scheduler.survivors().len()
            );
            self.stop = Some(StopReason::StepLimit);
        }
        self.stop
    }

    /// Runs to completion.
    pub fn run(&mut self) -> RunResult {
        self.run_with_events(&mut ())
    }

    pub fn run_with_events(&mut self, sink: &mut dyn EventSink) -> RunResult {
        info!(
            "Starting {} run: {} survivors, {}x{} area, max {} steps.",
            self.config.dispatch_mode,
            self.scheduler.survivors().len(),
            self.config.area_width,
            self.config.area_height,
            self.config.max_steps
        );
        if sink.wants(SimEventKind::RunStarted) {
            sink.send(SimEvent::RunStarted {
                config: self.config.clone(),
                survivor_count: self.scheduler.survivors().len(),
            });
        }

        while self.step_with_events(sink).is_none() {}

        let summary = self.summary();
        info!(
            "Run finished after {} ticks ({:?}): {} detected, {} delivered, {} stranded.",
            summary.ticks, summary.stop_reason, summary.detected, summary.delivered, summary.stranded
        );
        if sink.wants(SimEventKind::RunFinished) {
            sink.send(SimEvent::RunFinished {
                summary: summary.clone(),
            });
        }
        RunResult {
            summary,
            trace: std::mem::take(&mut self.trace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridCoord;
    use crate::sim::config::DispatchMode;
    use crate::sim::events::VecSink;

    fn constrained(capacity: u32) -> SimConfig {
        SimConfig::default()
            .with_dispatch_mode(DispatchMode::CapacityConstrained)
            .with_kit_capacity(capacity)
    }

    #[test]
    fn single_survivor_constrained_run() {
        let mut sim = Simulation::try_new(constrained(20), [Vec2::new(400.0, 300.0)]).unwrap();
        let result = sim.run();

        assert_eq!(result.summary.stop_reason, StopReason::AllWorkDone);
        assert_eq!(result.summary.delivered, 1);
        assert_eq!(sim.kits().map(|k| k.remaining()), Some(19));
        let agent = &sim.delivery_agents()[0];
        assert_eq!(agent.state, AgentState::Completed);
        assert_eq!(agent.position, sim.config().depot());

        let dispatched = result
            .trace
            .iter()
            .find(|w| w.delivery_agents[0].state == AgentState::Moving)
            .expect("agent was dispatched");
        assert_eq!(dispatched.kits, Some((19, 20)));
        assert_eq!(dispatched.survivors[0].1, SurvivorStatus::Detected);

        let returning = result
            .trace
            .iter()
            .position(|w| w.delivery_agents[0].state == AgentState::Returning)
            .expect("agent returned");
        assert!(result.trace[returning].scout.state == AgentState::Completed);
        assert_eq!(result.trace[returning].survivors[0].1, SurvivorStatus::Delivered);
    }

    #[test]
    fn kits_stay_within_capacity_across_reloads() {
        let survivors = [
            Vec2::new(150.0, 150.0),
            Vec2::new(350.0, 450.0),
            Vec2::new(550.0, 150.0),
            Vec2::new(650.0, 450.0),
            Vec2::new(250.0, 300.0),
        ];
        let mut sim = Simulation::try_new(constrained(2), survivors).unwrap();
        let mut sink = VecSink::only([SimEventKind::Reloaded]);
        let result = sim.run_with_events(&mut sink);

        assert_eq!(result.summary.stop_reason, StopReason::AllWorkDone);
        assert_eq!(result.summary.delivered, 5);
        assert!(sink.len() >= 2);
        for w in &result.trace {
            let (remaining, capacity) = w.kits.unwrap();
            assert!(remaining <= capacity);
        }
    }

    #[test]
    fn survivor_statuses_never_regress() {
        let survivors = [Vec2::new(120.0, 80.0), Vec2::new(520.0, 420.0)];
        let mut sim = Simulation::try_new(SimConfig::default(), survivors).unwrap();
        let result = sim.run();
        assert_eq!(result.summary.stop_reason, StopReason::AllWorkDone);

        let rank = |s: SurvivorStatus| match s {
            SurvivorStatus::Undetected => 0,
            SurvivorStatus::Detected => 1,
            SurvivorStatus::Delivered => 2,
        };
        for pair in result.trace.windows(2) {
            for (a, b) in pair[0].survivors.iter().zip(&pair[1].survivors) {
                assert!(rank(a.1) <= rank(b.1));
            }
        }
    }

    #[test]
    fn unconstrained_run_launches_one_agent_per_survivor() {
        let survivors = [Vec2::new(120.0, 80.0), Vec2::new(520.0, 420.0)];
        let mut sim = Simulation::try_new(SimConfig::default(), survivors).unwrap();
        let result = sim.run();

        assert_eq!(result.summary.delivery_agents, 2);
        assert_eq!(result.summary.delivered, 2);
        for agent in sim.delivery_agents() {
            assert_eq!(agent.state, AgentState::Completed);
            assert_eq!(agent.position, sim.config().depot());
        }
        assert!(sim.kits().is_none());
    }

    #[test]
    fn duplicate_detection_runs_to_step_limit() {
        let survivors = [Vec2::new(400.0, 300.0), Vec2::new(420.0, 300.0)];
        let config = SimConfig::default().with_max_steps(1500);
        let mut sim = Simulation::try_new(config, survivors).unwrap();
        let result = sim.run();

        assert_eq!(result.summary.stop_reason, StopReason::StepLimit);
        assert_eq!(result.summary.ticks, 1500);
        assert_eq!(result.summary.delivery_agents, 1);
        assert_eq!(result.summary.detected, 2);
        assert_eq!(result.summary.delivered, 1);
    }

    #[test]
    fn unreachable_survivor_does_not_stall_constrained_run() {
        let config = constrained(5);
        let mut grid = OccupancyGrid::covering(config.area_extent(), config.cell_size).unwrap();
        grid.block_rect(GridCoord::new(35, 25), GridCoord::new(45, 25));
        grid.block_rect(GridCoord::new(35, 35), GridCoord::new(45, 35));
        grid.block_rect(GridCoord::new(35, 25), GridCoord::new(35, 35));
        grid.block_rect(GridCoord::new(45, 25), GridCoord::new(45, 35));

        let mut sim = Simulation::try_new(config, [Vec2::new(400.0, 300.0)])
            .unwrap()
            .with_grid(grid)
            .unwrap();
        let mut sink = VecSink::only([SimEventKind::DispatchFailed]);
        let result = sim.run_with_events(&mut sink);

        assert_eq!(result.summary.stop_reason, StopReason::AllWorkDone);
        assert_eq!(result.summary.stranded, 1);
        assert_eq!(result.summary.delivered, 0);
        assert_eq!(sink.len(), 1);
        assert_eq!(sim.kits().map(|k| k.remaining()), Some(5));
        assert_eq!(
            sim.survivor_status(SurvivorId(0)).unwrap(),
            SurvivorStatus::Detected
        );
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let sim = Simulation::try_new(SimConfig::default(), Vec::<Vec2>::new()).unwrap();
        let grid = OccupancyGrid::new(10, 10, 10.0).unwrap();
        assert!(matches!(sim.with_grid(grid), Err(Error::InvalidGrid(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SimConfig::default().with_delivery_speed(0.0);
        assert!(matches!(
            Simulation::try_new(config, Vec::<Vec2>::new()),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn unknown_survivor_query_errors() {
        let sim = Simulation::try_new(SimConfig::default(), [Vec2::ZERO]).unwrap();
        assert!(matches!(
            sim.survivor_status(SurvivorId(9)),
            Err(Error::UnknownSurvivor { id: SurvivorId(9) })
        ));
    }

    #[test]
    fn stepping_after_stop_is_a_no_op() {
        let config = SimConfig::default().with_max_steps(3).with_record_trace(false);
        let mut sim = Simulation::try_new(config, [Vec2::new(700.0, 500.0)]).unwrap();
        assert_eq!(sim.step(), None);
        assert_eq!(sim.step(), None);
        assert_eq!(sim.step(), Some(StopReason::StepLimit));
        assert_eq!(sim.step(), Some(StopReason::StepLimit));
        assert_eq!(sim.tick(), 3);
        assert!(sim.trace().is_empty());
    }

    #[test]
    fn coverage_completes_on_the_tick_the_last_waypoint_is_reached() {
        let mut sim = Simulation::try_new(constrained(3), Vec::<Vec2>::new()).unwrap();
        let mut sink = VecSink::only([SimEventKind::CoverageCompleted]);
        while !sim.scout().path_exhausted() {
            assert!(!sim.coverage_complete());
            assert_eq!(sim.step_with_events(&mut sink), None);
        }
        let last = sim.tick();
        assert!(sim.coverage_complete());
        assert_eq!(sim.scout().state, AgentState::Completed);
        assert_eq!(sim.scout().position, sim.config().depot());
        assert!(matches!(
            sink.as_slice(),
            [SimEvent::CoverageCompleted { tick }] if *tick == last
        ));
        assert_eq!(
            sim.delivery_agents()[0].state,
            AgentState::Returning,
            "final return starts on the same tick"
        );

        assert_eq!(sim.step(), Some(StopReason::AllWorkDone));
        assert_eq!(sim.tick(), last + 1);
    }

    #[test]
    fn oversized_grid_is_an_error_not_a_panic() {
        let config = SimConfig::default().with_cell_size(1e-9);
        assert!(matches!(
            Simulation::try_new(config, Vec::<Vec2>::new()),
            Err(Error::InvalidGrid(_))
        ));
    }

    #[test]
    fn empty_coverage_pattern_completes_scout_immediately() {
        struct Nowhere;
        impl CoveragePattern for Nowhere {
            fn waypoints(&self, _area_extent: mint::Vector2<f32>) -> Vec<mint::Vector2<f32>> {
                Vec::new()
            }
        }
        let mut sim = Simulation::try_new(SimConfig::default(), Vec::<Vec2>::new())
            .unwrap()
            .with_coverage_pattern(&Nowhere);
        assert!(sim.coverage_complete());
        assert_eq!(sim.step(), Some(StopReason::AllWorkDone));
        assert_eq!(sim.scout().state, AgentState::Completed);
    }
}
