use glam::Vec2;
use rescue_sim::prelude::*;
use rescue_sim_examples::{init_tracing, log_events, log_summary};

fn main() -> anyhow::Result<()> {
    init_tracing();

    // The last two survivors sit within the duplicate-claim radius of each other, so only
    // one of them gets an agent and the run ends at the step ceiling.
    let survivors = [
        Vec2::new(120.0, 80.0),
        Vec2::new(330.0, 520.0),
        Vec2::new(610.0, 140.0),
        Vec2::new(700.0, 400.0),
        Vec2::new(720.0, 420.0),
    ];
    let config = SimConfig::default().with_max_steps(2500);
    let mut sim = Simulation::try_new(config, survivors)?;
    let result = sim.run_with_events(&mut log_events());

    log_summary(&result.summary);
    for agent in sim.delivery_agents() {
        println!("{}: {:?} at {}", agent.id, agent.state, agent.position);
    }
    for s in sim.survivors() {
        println!("survivor {}: {:?}", s.id, s.status());
    }
    Ok(())
}
