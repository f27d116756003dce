#![forbid(unsafe_code)]
//! rescue_sim: Scout-and-deliver disaster-response simulation core.
//!
//! Modules:
//! - grid: occupancy grid and 8-connected A* search
//! - planning: boustrophedon coverage sweeps and nearest-neighbor visiting orders
//! - sim: survivors, agents, motion, dispatch scheduling (unconstrained or capacity-constrained), tick loop, events
//! - mission: live survivor registry fed by noisy detections, id-based delivery ordering
//!
//! For runnable scenarios, see the `rescue_sim_examples` crate.
pub mod error;
pub mod grid;
pub mod mission;
pub mod planning;
pub mod sim;

/// Convenient re-exports for common types. Import with `use rescue_sim::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::grid::{
        find_path, find_path_with, Cell, DiagonalCost, GridCoord, OccupancyGrid, SearchOptions,
    };
    pub use crate::mission::{
        plan_delivery, Detection, MissionStatus, ReportOutcome, SimulatedDetector,
        SurvivorRegistry, TrackedSurvivor,
    };
    pub use crate::planning::{
        generate_coverage_path, plan_route, plan_route_by_id, BoustrophedonCoverage,
        CoveragePattern,
    };
    pub use crate::sim::config::{DispatchMode, SimConfig};
    pub use crate::sim::dispatch::{DeliverySites, KitInventory, Scheduler, TaskQueue};
    pub use crate::sim::events::{EventSink, FnSink, MultiSink, SimEvent, SimEventKind, VecSink};
    pub use crate::sim::motion::{step_toward, MotionOutcome};
    pub use crate::sim::runner::{
        AgentSnapshot, RunResult, SimSummary, Simulation, StopReason, WorldState,
    };
    pub use crate::sim::{
        Agent, AgentId, AgentState, Role, Survivor, SurvivorId, SurvivorStatus,
    };
}
