use glam::Vec2;
use rescue_sim::prelude::*;
use rescue_sim_examples::{init_tracing, log_events, log_summary};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SimConfig::new(Vec2::new(800.0, 600.0))
        .with_dispatch_mode(DispatchMode::CapacityConstrained)
        .with_kit_capacity(20)
        .with_delivery_speed(15.0);

    let mut sim = Simulation::try_new(config, [Vec2::new(400.0, 300.0)])?;
    let result = sim.run_with_events(&mut log_events());

    log_summary(&result.summary);
    if let Some(kits) = sim.kits() {
        println!("kits left: {}/{}", kits.remaining(), kits.capacity());
    }
    Ok(())
}
