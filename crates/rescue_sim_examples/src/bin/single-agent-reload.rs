use glam::Vec2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rescue_sim::prelude::*;
use rescue_sim_examples::{init_tracing, log_events, log_summary};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = SimConfig::default()
        .with_dispatch_mode(DispatchMode::CapacityConstrained)
        .with_kit_capacity(3);

    let mut rng = StdRng::seed_from_u64(7);
    let mut unit = || (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0);
    let survivors: Vec<Vec2> = (0..12)
        .map(|_| Vec2::new(unit() * config.area_width, unit() * config.area_height))
        .collect();

    let mut sim = Simulation::try_new(config, survivors)?;
    let mut log = log_events();
    let mut reloads = VecSink::only([SimEventKind::Reloaded]);
    let result = {
        let mut sink = MultiSink::with_sinks(vec![&mut log as &mut dyn EventSink, &mut reloads]);
        sim.run_with_events(&mut sink)
    };

    log_summary(&result.summary);
    println!("reload trips: {}", reloads.into_inner().len());
    let max_queue = result.trace.iter().map(|w| w.queue_len).max().unwrap_or(0);
    println!("longest task queue: {max_queue}");
    Ok(())
}
