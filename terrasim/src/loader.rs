use anyhow::{Context, Result};
use std::path::Path;
use terrasim_core::{Economy, Scenario, SessionBuilder};

/// Read, validate and build an economy from a scenario file.
///
/// `seed` overrides the scenario's `rng_seed` when given.
pub fn load_economy(path: &Path, seed: Option<u64>) -> Result<Economy> {
    log::info!("Loading scenario from {:?}", path);
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    let mut scenario = Scenario::from_json_str(&json)
        .with_context(|| format!("Invalid scenario {}", path.display()))?;

    if let Some(seed) = seed {
        log::info!("Seed override: {} (scenario had {})", seed, scenario.rng_seed);
        scenario.rng_seed = seed;
    }
    log::info!(
        "{} buildings, {} event groups, {} event slots",
        scenario.buildings.len(),
        scenario.event_groups.len(),
        scenario.balance.event_slots
    );

    SessionBuilder::new()
        .scenario(scenario)
        .scenario_seed()
        .build()
        .context("Failed to build economy")
}
