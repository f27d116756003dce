use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rescue_sim::prelude::*;
use rescue_sim_examples::init_tracing;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let detector = SimulatedDetector::new(8.0);
    let mut rng = StdRng::seed_from_u64(11);
    let mut registry = SurvivorRegistry::new(10.0);

    // Scout passes with raw detector confidences; repeated sightings merge.
    let passes = [
        (Vec2::new(120.0, 90.0), 0.62),
        (Vec2::new(122.0, 91.0), 0.88),
        (Vec2::new(480.0, 260.0), 0.41),
        (Vec2::new(480.0, 260.0), 0.77),
        (Vec2::new(300.0, 510.0), 0.93),
        (Vec2::new(690.0, 120.0), 0.71),
    ];
    for (scout, confidence) in passes {
        if let Some(detection) = detector.detect(scout, confidence, &mut rng) {
            let outcome = registry.report(detection);
            println!("{scout} @ {confidence:.2}: {outcome:?}");
        }
    }

    let depot = SimConfig::default().depot();
    let order = plan_delivery(depot, &registry);
    println!("route from depot {depot}:");
    for id in &order {
        if let Some(s) = registry.get(*id) {
            println!("  {id} at {} (confidence {:.2})", s.position, s.confidence);
        }
    }

    if let Some(&first) = order.first() {
        registry.mark_delivered(first)?;
    }
    println!("still pending: {}", registry.pending().count());
    Ok(())
}
