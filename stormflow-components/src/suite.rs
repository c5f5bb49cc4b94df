use stormflow_core::{RunConfig, Systems};

use crate::{
    climate::ClimateTracker, hot_start::ColdStart, mass_balance::ContinuityTracker,
    project::InMemoryProject, rainfall::NoRainfall, results::MemoryResults,
    routing::ConstantStepRouting, runoff::ConstantStepRunoff, statistics::RunTally,
};

/// Wires a complete in-memory collaborator set for `config`.
///
/// Swap individual fields afterwards to mix in real sub-models:
///
/// ```ignore
/// let mut systems = suite::in_memory(config);
/// systems.routing = Box::new(MyDynamicWaveSolver::new(&network));
/// let engine = Engine::new(systems);
/// ```
#[must_use]
pub fn in_memory(config: RunConfig) -> Systems {
    Systems {
        project: Box::new(InMemoryProject::new(config)),
        rainfall: Box::new(NoRainfall),
        runoff: Box::new(ConstantStepRunoff::new(config.wet_step)),
        routing: Box::new(ConstantStepRouting::new(config.node_count)),
        climate: Box::new(ClimateTracker::new()),
        hot_start: Box::new(ColdStart),
        mass_balance: Box::new(ContinuityTracker::new()),
        statistics: Box::new(RunTally::new()),
        results: Box::new(MemoryResults::new()),
    }
}
