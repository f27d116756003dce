#![forbid(unsafe_code)]

use std::path::Path;

use anyhow::Context;
use glam::Vec2;
use rescue_sim::prelude::*;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Inclusive rectangle of blocked cells.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Wall {
    pub from: GridCoord,
    pub to: GridCoord,
}

/// A simulation scenario as stored in TOML.
///
/// ```toml
/// survivors = [[400.0, 300.0], [120.0, 80.0]]
///
/// [config]
/// dispatch_mode = "CapacityConstrained"
/// kit_capacity = 2
///
/// [[walls]]
/// from = { col = 30, row = 0 }
/// to = { col = 30, row = 40 }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: SimConfig,
    #[serde(default)]
    pub survivors: Vec<Vec2>,
    #[serde(default)]
    pub walls: Vec<Wall>,
}

impl Scenario {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Validates the config and builds the simulation with walls applied.
    pub fn build(&self) -> rescue_sim::error::Result<Simulation> {
        let mut sim = Simulation::try_new(self.config.clone(), self.survivors.iter().copied())?;
        if !self.walls.is_empty() {
            let mut grid = sim.grid().clone();
            for wall in &self.walls {
                grid.block_rect(wall.from, wall.to);
            }
            sim = sim.with_grid(grid)?;
        }
        Ok(sim)
    }
}

/// Sink that logs the notable events of a run.
pub fn log_events() -> FnSink<impl FnMut(SimEvent)> {
    FnSink::new(|event| match event {
        SimEvent::Dispatched {
            tick,
            agent,
            survivor,
            waypoints,
        } => info!("[{tick:>5}] {agent} -> survivor {survivor} ({waypoints} waypoints)"),
        SimEvent::Delivered {
            tick,
            agent,
            survivor,
        } => info!("[{tick:>5}] {agent} delivered to survivor {survivor}"),
        SimEvent::Reloaded { tick, agent, kits } => {
            info!("[{tick:>5}] {agent} reloaded ({kits} kits)")
        }
        SimEvent::DispatchFailed { tick, survivor, .. } => {
            info!("[{tick:>5}] survivor {survivor} unreachable")
        }
        SimEvent::CoverageCompleted { tick } => info!("[{tick:>5}] scout coverage complete"),
        _ => {}
    })
}

pub fn log_summary(summary: &SimSummary) {
    info!(
        "{} ticks, stop: {:?}; survivors {} total, {} detected, {} delivered, {} stranded; {} delivery agent(s)",
        summary.ticks,
        summary.stop_reason,
        summary.total_survivors,
        summary.detected,
        summary.delivered,
        summary.stranded,
        summary.delivery_agents
    );
}
