use glam::Vec2;
use rescue_sim::prelude::*;
use rescue_sim_examples::{init_tracing, log_events, log_summary};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SimConfig::default()
        .with_diagonal_cost(DiagonalCost::Euclidean)
        .with_max_steps(3000);
    let mut grid = OccupancyGrid::covering(config.area_extent(), config.cell_size)?;

    // A long wall with a gap at the bottom, and a closed box around (650, 150).
    grid.block_rect(GridCoord::new(30, 0), GridCoord::new(30, 50));
    grid.block_rect(GridCoord::new(60, 10), GridCoord::new(70, 10));
    grid.block_rect(GridCoord::new(60, 20), GridCoord::new(70, 20));
    grid.block_rect(GridCoord::new(60, 10), GridCoord::new(60, 20));
    grid.block_rect(GridCoord::new(70, 10), GridCoord::new(70, 20));
    println!("{} blocked cells", grid.blocked_count());

    let survivors = [Vec2::new(450.0, 200.0), Vec2::new(650.0, 150.0)];
    let mut sim = Simulation::try_new(config, survivors)?.with_grid(grid)?;
    let result = sim.run_with_events(&mut log_events());

    log_summary(&result.summary);
    for id in [SurvivorId(0), SurvivorId(1)] {
        println!("survivor {id}: {:?}", sim.survivor_status(id)?);
    }
    Ok(())
}
