//! Lifecycle state machine and time-stepping orchestrator for a drainage
//! simulation engine.
//!
//! The core drives a discrete-time simulation of surface runoff generation
//! and drainage-network flow routing from a start time to a total duration.
//! It coordinates two sub-models advancing on independent, mutually
//! constrained clocks, schedules evenly spaced result snapshots, and
//! isolates transient arithmetic faults so a rare numerical hiccup does not
//! abort an otherwise-valid multi-hour run.
//!
//! The physics live behind the collaborator traits in [`systems`]; this
//! crate only sequences them. See [`Engine`] for the driving surface.

pub mod config;
pub mod engine;
pub mod error;
pub mod fault;
pub mod schedule;
pub mod systems;

mod stepper;

#[cfg(test)]
mod test_utils;

pub use config::{RoutingMethod, RunConfig};
pub use engine::{Engine, Phase, StepOutcome};
pub use error::{EngineError, Stage, SystemError, SystemResult};
pub use fault::{FaultKind, MAX_FAULTS, NumericFault};
pub use schedule::ReportSchedule;
pub use systems::{
    ClimateState, HotStartFile, MassBalance, MassBalanceErrors, NodeState, ProjectLoader,
    RainfallProcessor, ResultsWriter, RoutingAdvance, RoutingEngine, RunFiles, RunoffEngine,
    Statistics, Systems,
};
