//! Collaborator contracts the orchestration core depends on.
//!
//! Each trait covers one subsystem at its interface boundary; the physics
//! and file formats behind them are collaborator concerns. `close` methods
//! are teardown hooks: they must be safe to call even when the matching
//! `open` failed or was never reached, because the engine releases
//! partially-acquired resources after a failed start.

use std::path::PathBuf;

use jiff::civil;
use uom::si::f64::{Length, Time, VolumeRate};

use crate::{
    config::{RoutingMethod, RunConfig},
    error::SystemResult,
};

/// Input, report, and binary results files for one run.
#[derive(Debug, Clone, Default)]
pub struct RunFiles {
    pub input: PathBuf,
    pub report: PathBuf,
    /// Absent when results go to a scratch stream that is deleted at close.
    pub results: Option<PathBuf>,
}

/// Loads, validates, and owns the project data for a run.
pub trait ProjectLoader {
    /// Opens the project files.
    fn open(&mut self, files: &RunFiles) -> SystemResult<()>;

    /// Reads the project data from the input file.
    fn read_input(&mut self) -> SystemResult<()>;

    /// Validates the project data after reading.
    fn validate(&mut self) -> SystemResult<()>;

    /// Resets per-run component state before a simulation starts.
    fn init(&mut self) -> SystemResult<()>;

    /// Run options extracted from the validated project.
    fn config(&self) -> &RunConfig;

    /// Releases the project data and file handles.
    fn close(&mut self);
}

/// Prepares rainfall data for a run.
///
/// Opening may synthesize derived inflow series as a side effect.
pub trait RainfallProcessor {
    fn open(&mut self) -> SystemResult<()>;
    fn close(&mut self);
}

/// Surface runoff and infiltration sub-model.
pub trait RunoffEngine {
    fn open(&mut self) -> SystemResult<()>;

    /// Advances the runoff model by one of its own (typically smaller)
    /// steps and returns its new clock, as elapsed time since the start of
    /// the run. The clock must strictly advance on every call.
    fn execute(&mut self) -> SystemResult<Time>;

    fn close(&mut self);
}

/// Result of one routing advance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingAdvance {
    /// The shared routing clock after the advance, as elapsed time since
    /// the start of the run. Internal sub-steps are allowed, but on success
    /// the clock must land on the instant the step was asked to reach.
    pub elapsed: Time,
    /// Whether the flow solution converged over this step.
    pub converged: bool,
}

/// Observable state of one drainage network node, for external coupling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeState {
    pub inflow: VolumeRate,
    pub outflow: VolumeRate,
    pub head: Length,
    pub crest_elevation: Length,
    pub depth: Length,
}

/// Drainage network flow routing sub-model.
pub trait RoutingEngine {
    fn open(&mut self) -> SystemResult<()>;

    /// Step length to use for the next advance, given the configured method
    /// and nominal step. Adaptive solvers may shrink this under numerical
    /// instability; a non-positive result aborts the run.
    fn step_length(&mut self, method: RoutingMethod, nominal: Time) -> Time;

    /// Routes flow through the network over `step`.
    fn execute(&mut self, method: RoutingMethod, step: Time) -> SystemResult<RoutingAdvance>;

    fn close(&mut self, method: RoutingMethod);

    /// Coupling readout of one node's current state, `None` if the index
    /// is unknown to the network.
    fn node_state(&self, index: usize) -> Option<NodeState>;

    /// Injects an external lateral inflow at a node, accumulated into the
    /// next routing advance.
    fn add_node_inflow(&mut self, index: usize, inflow: VolumeRate) -> SystemResult<()>;
}

/// Slow-varying climate boundary conditions (evaporation, temperature).
///
/// Used instead of a full runoff pass when no runoff is computed.
pub trait ClimateState {
    fn set_state(&mut self, date: civil::DateTime);
}

/// Hot-start checkpoint: resumes physical state from a prior run's
/// snapshot instead of cold initial conditions.
pub trait HotStartFile {
    /// Reads the checkpoint if one is configured. An error here is
    /// unrecoverable and aborts the start.
    fn open(&mut self) -> SystemResult<()>;

    fn close(&mut self);
}

/// Continuity-error percentages accumulated over a run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MassBalanceErrors {
    pub runoff: f64,
    pub groundwater: f64,
    pub flow: f64,
    pub quality: f64,
}

/// Conservation-of-mass bookkeeping across the run.
pub trait MassBalance {
    fn open(&mut self) -> SystemResult<()>;

    /// Final continuity errors, reported once at the end of a run.
    fn report(&mut self) -> MassBalanceErrors;

    fn close(&mut self);
}

/// Per-object summary statistics across the run.
pub trait Statistics {
    fn open(&mut self) -> SystemResult<()>;
    fn report(&mut self);
    fn close(&mut self);
}

/// Persisted result stream the reporting scheduler writes snapshots to.
pub trait ResultsWriter {
    fn open(&mut self) -> SystemResult<()>;

    /// Persists a snapshot keyed by the scheduled report instant.
    fn save(&mut self, instant: Time) -> SystemResult<()>;

    /// Writes end-of-run records.
    fn end(&mut self) -> SystemResult<()>;

    /// Verifies the stream is intact before a textual report is generated.
    fn check_size(&mut self) -> SystemResult<()>;

    /// Releases the stream; a scratch-mode stream is deleted from disk.
    /// Must be idempotent.
    fn close(&mut self);
}

/// One boxed instance of every collaborator, as wired by the caller.
pub struct Systems {
    pub project: Box<dyn ProjectLoader>,
    pub rainfall: Box<dyn RainfallProcessor>,
    pub runoff: Box<dyn RunoffEngine>,
    pub routing: Box<dyn RoutingEngine>,
    pub climate: Box<dyn ClimateState>,
    pub hot_start: Box<dyn HotStartFile>,
    pub mass_balance: Box<dyn MassBalance>,
    pub statistics: Box<dyn Statistics>,
    pub results: Box<dyn ResultsWriter>,
}
