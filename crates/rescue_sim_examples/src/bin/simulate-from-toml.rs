use rescue_sim_examples::{init_tracing, log_events, log_summary, Scenario};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        format!(
            "{}/scenarios/reload.toml",
            env!("CARGO_MANIFEST_DIR")
        )
    });
    let scenario = Scenario::from_file(&path)?;
    let mut sim = scenario.build()?;
    let result = sim.run_with_events(&mut log_events());

    log_summary(&result.summary);
    println!("stop reason: {:?}", result.summary.stop_reason);
    Ok(())
}
