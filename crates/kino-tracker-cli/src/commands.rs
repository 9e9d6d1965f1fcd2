//! CLI command implementations

use crate::output::format_entries;
use crate::scenario::{Replay, Scenario, DEMO_SCENARIO};
use kino_tracker::TrackerConfig;
use std::path::Path;

/// Replay a scenario file
pub fn replay(path: &Path, config: Option<&Path>, format: &str) -> anyhow::Result<()> {
    let mut scenario = Scenario::load(path)?;

    if let Some(config_path) = config {
        let json = std::fs::read_to_string(config_path)?;
        scenario.config = Some(TrackerConfig::from_json_str(&json)?);
    }

    tracing::info!(steps = scenario.steps.len(), path = %path.display(), "Replaying scenario");
    let entries = Replay::run(scenario)?;
    println!("{}", format_entries(&entries, format)?);

    Ok(())
}

/// Replay the built-in player swap scenario
pub fn demo(format: &str) -> anyhow::Result<()> {
    let scenario = Scenario::from_json_str(DEMO_SCENARIO)?;
    let entries = Replay::run(scenario)?;
    println!("{}", format_entries(&entries, format)?);

    Ok(())
}
