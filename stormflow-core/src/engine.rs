use uom::si::{
    f64::{Time, VolumeRate},
    time::{day, hour},
};

use crate::{
    config::RunConfig,
    error::{EngineError, Stage},
    fault::FaultBoundary,
    schedule::ReportSchedule,
    stepper::{self, Clocks},
    systems::{MassBalanceErrors, NodeState, RunFiles, Systems},
};

/// Lifecycle phase of an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Closed,
    Open,
    Started,
}

/// Outcome of a single [`Engine::step`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// The run advanced; carries the elapsed simulated time since start.
    Advanced(Time),
    /// The routing clock has reached the total duration. Terminal and
    /// idempotent: further `step` calls return `Complete` without any
    /// physical advance.
    Complete,
}

/// Drives a simulation through its lifecycle:
/// `open → start → step* → end → close`.
///
/// An `Engine` owns one instance of every collaborator subsystem and the
/// shared clocks they synchronize on. Each instance supports one run at a
/// time; independent concurrent runs need independent engines.
///
/// The first error any phase returns becomes *sticky*: every later call
/// short-circuits with a clone of it, except [`end`] and [`close`] which
/// still release previously-acquired resources. Callers that abort early
/// must still call [`end`] and [`close`].
///
/// ```ignore
/// let mut engine = Engine::new(systems);
/// engine.open(&files)?;
/// engine.start(true)?;
/// while let StepOutcome::Advanced(_) = engine.step()? {}
/// engine.end()?;
/// engine.report()?;
/// engine.close()?;
/// ```
///
/// [`end`]: Engine::end
/// [`close`]: Engine::close
pub struct Engine {
    systems: Systems,
    phase: Phase,
    config: Option<RunConfig>,
    sticky: Option<EngineError>,
    save_results: bool,
    do_runoff: bool,
    do_routing: bool,
    clocks: Clocks,
    schedule: ReportSchedule,
    faults: FaultBoundary,
    mass_balance: MassBalanceErrors,
}

impl Engine {
    /// Creates an engine in the `Closed` phase from a set of collaborators.
    #[must_use]
    pub fn new(systems: Systems) -> Self {
        Self {
            systems,
            phase: Phase::Closed,
            config: None,
            sticky: None,
            save_results: true,
            do_runoff: false,
            do_routing: false,
            clocks: Clocks::default(),
            schedule: ReportSchedule::default(),
            faults: FaultBoundary::default(),
            mass_balance: MassBalanceErrors::default(),
        }
    }

    /// Opens a project: loads and validates its data.
    ///
    /// Valid only from `Closed`. Clears any sticky error from a previous
    /// run of this engine.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotOpen`] when a project is already open; otherwise
    /// whatever the project loader reports, which becomes sticky.
    pub fn open(&mut self, files: &RunFiles) -> Result<(), EngineError> {
        if self.phase != Phase::Closed {
            return Err(EngineError::NotOpen);
        }
        self.sticky = None;
        self.faults.reset();
        self.clocks = Clocks::default();
        self.mass_balance = MassBalanceErrors::default();

        let systems = &mut self.systems;
        let phase = &mut self.phase;
        let result = self.faults.isolate(Time::default(), 0, || {
            systems
                .project
                .open(files)
                .map_err(|e| EngineError::collaborator(Stage::Project, e))?;
            // Project files are held from here on; close() releases them
            // even if reading or validation fails below.
            *phase = Phase::Open;
            systems
                .project
                .read_input()
                .map_err(|e| EngineError::collaborator(Stage::Project, e))?;
            systems
                .project
                .validate()
                .map_err(|e| EngineError::collaborator(Stage::Project, e))?;
            Ok(())
        });

        match result {
            Ok(()) => {
                self.config = Some(*self.systems.project.config());
                tracing::info!(input = %files.input.display(), "project opened");
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Starts a simulation run.
    ///
    /// Valid only from `Open` with no run already started. Resets all
    /// clocks and accumulators, decides which sub-models are active, and
    /// opens every collaborator in acquisition order; the hot-start
    /// checkpoint is read before the routing engine opens so routing sees
    /// restored state.
    ///
    /// On failure the remaining opens are skipped and the error is sticky;
    /// the caller must still call [`Engine::end`] and [`Engine::close`] to
    /// release whatever was acquired.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotOpen`] out of sequence, [`EngineError::InputData`]
    /// for an invalid configuration, or a collaborator failure.
    pub fn start(&mut self, save_results: bool) -> Result<(), EngineError> {
        self.guard()?;
        if self.phase != Phase::Open {
            return Err(EngineError::NotOpen);
        }
        let Some(config) = self.config else {
            return Err(EngineError::NotOpen);
        };
        if let Err(reason) = config.validate() {
            return Err(self.fail(EngineError::InputData { reason }));
        }

        self.faults.reset();
        self.clocks = Clocks::default();
        self.schedule = ReportSchedule::new(config.report_step);
        self.mass_balance = MassBalanceErrors::default();
        self.save_results = save_results;
        self.do_runoff = config.subcatchment_count > 0;
        self.do_routing = config.node_count > 0 && !config.ignore_routing;
        // Started before the opens below, so end() tears down partially-
        // acquired collaborators after a failed start.
        self.phase = Phase::Started;

        let systems = &mut self.systems;
        let do_runoff = self.do_runoff;
        let do_routing = self.do_routing;
        let mut acquired = 0;
        let result = self.faults.isolate(Time::default(), 0, || {
            Self::open_run_systems(systems, &config, do_runoff, do_routing, &mut acquired)
        });

        match result {
            Ok(()) => {
                tracing::info!(
                    save_results,
                    do_runoff,
                    do_routing,
                    total_hours = config.total_duration.get::<hour>(),
                    "run started"
                );
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// `acquired` counts the opens that already succeeded. Collaborator
    /// `open` is not required to be idempotent, so when the fault boundary
    /// re-runs this body a retry resumes after them instead of re-opening.
    fn open_run_systems(
        systems: &mut Systems,
        config: &RunConfig,
        do_runoff: bool,
        do_routing: bool,
        acquired: &mut u32,
    ) -> Result<(), EngineError> {
        if *acquired < 1 {
            if !config.ignore_rainfall {
                systems
                    .rainfall
                    .open()
                    .map_err(|e| EngineError::collaborator(Stage::Rainfall, e))?;
            }
            *acquired = 1;
        }
        if *acquired < 2 {
            systems
                .project
                .init()
                .map_err(|e| EngineError::collaborator(Stage::Project, e))?;
            *acquired = 2;
        }
        if *acquired < 3 {
            systems
                .results
                .open()
                .map_err(|e| EngineError::collaborator(Stage::Results, e))?;
            *acquired = 3;
        }
        if *acquired < 4 {
            if do_runoff {
                systems
                    .runoff
                    .open()
                    .map_err(|e| EngineError::collaborator(Stage::Runoff, e))?;
            }
            *acquired = 4;
        }
        if *acquired < 5 {
            // Checkpoint state must be in place before routing opens.
            systems
                .hot_start
                .open()
                .map_err(|e| EngineError::collaborator(Stage::HotStart, e))?;
            *acquired = 5;
        }
        if *acquired < 6 {
            if do_routing {
                systems
                    .routing
                    .open()
                    .map_err(|e| EngineError::collaborator(Stage::Routing, e))?;
            }
            *acquired = 6;
        }
        if *acquired < 7 {
            systems
                .mass_balance
                .open()
                .map_err(|e| EngineError::collaborator(Stage::MassBalance, e))?;
            *acquired = 7;
        }
        systems
            .statistics
            .open()
            .map_err(|e| EngineError::collaborator(Stage::Statistics, e))?;
        Ok(())
    }

    /// Advances the simulation by one routing time step.
    ///
    /// Returns [`StepOutcome::Advanced`] with the elapsed simulated time
    /// while the run is in progress, and [`StepOutcome::Complete`] once the
    /// routing clock has reached the total duration. `Complete` is the sole
    /// termination signal for a driving loop and is idempotent.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotOpen`] when no run is started; otherwise any
    /// orchestration or collaborator error, which becomes sticky.
    pub fn step(&mut self) -> Result<StepOutcome, EngineError> {
        self.guard()?;
        if self.phase != Phase::Started {
            return Err(EngineError::NotOpen);
        }
        let Some(config) = self.config else {
            return Err(EngineError::NotOpen);
        };

        if self.clocks.routing < config.total_duration {
            // One count per logical step, even when the fault boundary
            // re-runs the step body.
            self.clocks.step_count += 1;
            let systems = &mut self.systems;
            let clocks = &mut self.clocks;
            let do_runoff = self.do_runoff;
            let do_routing = self.do_routing;
            let elapsed = clocks.routing;
            let step_count = clocks.step_count;
            let result = self.faults.isolate(elapsed, step_count, || {
                stepper::advance(systems, clocks, &config, do_runoff, do_routing)
            });
            if let Err(err) = result {
                return Err(self.fail(err));
            }
        }

        // Snapshot at the scheduled instant, then move the schedule by one
        // interval. At most one snapshot per call.
        if self.schedule.is_due(self.clocks.routing) {
            if self.save_results {
                let instant = self.schedule.instant();
                if let Err(e) = self.systems.results.save(instant) {
                    let err = EngineError::collaborator(Stage::Results, e);
                    return Err(self.fail(err));
                }
                tracing::debug!(
                    report_hours = instant.get::<hour>(),
                    "results snapshot saved"
                );
            }
            self.schedule.advance();
        }

        if self.clocks.routing < config.total_duration {
            Ok(StepOutcome::Advanced(self.clocks.routing))
        } else {
            Ok(StepOutcome::Complete)
        }
    }

    /// Ends a simulation run and releases run-scoped collaborators in
    /// reverse acquisition order.
    ///
    /// A no-op when no run is started, so repeated calls are safe.
    /// Teardown is best-effort and proceeds even under a sticky error,
    /// though end-of-run summaries are only produced for clean runs.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotOpen`] when no project is open.
    pub fn end(&mut self) -> Result<(), EngineError> {
        if self.phase == Phase::Closed {
            return Err(EngineError::NotOpen);
        }
        if self.phase != Phase::Started {
            return Ok(());
        }

        if let Err(e) = self.systems.results.end() {
            tracing::warn!(error = %e, "result stream failed to finalize");
        }
        if self.sticky.is_none() {
            self.mass_balance = self.systems.mass_balance.report();
            self.systems.statistics.report();
        }

        self.systems.statistics.close();
        self.systems.mass_balance.close();
        if let Some(config) = self.config {
            if !config.ignore_rainfall {
                self.systems.rainfall.close();
            }
            if self.do_runoff {
                self.systems.runoff.close();
            }
            if self.do_routing {
                self.systems.routing.close(config.route_model);
            }
        }
        self.systems.hot_start.close();
        self.phase = Phase::Open;
        tracing::info!(
            steps = self.clocks.step_count,
            non_converging = self.clocks.non_converge_count,
            faults = self.faults.count(),
            "run ended"
        );
        Ok(())
    }

    /// Summarizes the finished run.
    ///
    /// Verifies the result stream, then logs either the sticky error or an
    /// end-of-run summary.
    ///
    /// # Errors
    ///
    /// The sticky error when the run failed, or a result-stream failure.
    pub fn report(&mut self) -> Result<(), EngineError> {
        if let Err(e) = self.systems.results.check_size() {
            let err = EngineError::collaborator(Stage::Results, e);
            return Err(self.fail(err));
        }
        if let Some(err) = &self.sticky {
            tracing::error!(error = %err, "run ended with an error");
            return Err(err.clone());
        }
        tracing::info!(
            steps = self.clocks.step_count,
            non_converging = self.clocks.non_converge_count,
            runoff_error_pct = self.mass_balance.runoff,
            flow_error_pct = self.mass_balance.flow,
            quality_error_pct = self.mass_balance.quality,
            "simulation summary"
        );
        Ok(())
    }

    /// Closes the project and releases all file-backed resources.
    ///
    /// Always safe to call, from any phase. Does not raise new errors on
    /// top of a prior failure; it reports the sticky error if one was set.
    ///
    /// # Errors
    ///
    /// The sticky error from the failed run, if any.
    pub fn close(&mut self) -> Result<(), EngineError> {
        self.systems.results.close();
        if self.phase != Phase::Closed {
            self.systems.project.close();
            tracing::info!("project closed");
        }
        self.phase = Phase::Closed;
        self.config = None;
        match &self.sticky {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Runs a complete simulation:
    /// `open → start → step loop → end → report → close`.
    ///
    /// Teardown phases run even when an earlier phase failed.
    ///
    /// # Errors
    ///
    /// The first error the run hit, as reported by [`Engine::close`].
    pub fn run(&mut self, files: &RunFiles) -> Result<(), EngineError> {
        if self.open(files).is_ok() {
            if self.start(true).is_ok() {
                let mut last_hour = -1_i64;
                loop {
                    match self.step() {
                        Ok(StepOutcome::Advanced(elapsed)) => {
                            let hours = elapsed.get::<hour>() as i64;
                            if hours > last_hour {
                                tracing::info!(
                                    day = elapsed.get::<day>() as i64,
                                    hour = hours.rem_euclid(24),
                                    "simulating"
                                );
                                last_hour = hours;
                            }
                        }
                        Ok(StepOutcome::Complete) => {
                            tracing::info!("simulation complete");
                            break;
                        }
                        Err(_) => break,
                    }
                }
            }
            let _ = self.end();
        }
        let _ = self.report();
        self.close()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Elapsed time flow routing has advanced to in the current run.
    #[must_use]
    pub fn routing_time(&self) -> Time {
        self.clocks.routing
    }

    /// Number of routing steps taken in the current run.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.clocks.step_count
    }

    /// Number of non-converging routing steps in the current run.
    #[must_use]
    pub fn non_converge_count(&self) -> u64 {
        self.clocks.non_converge_count
    }

    /// Number of continuable faults absorbed in the current run.
    #[must_use]
    pub fn fault_count(&self) -> u32 {
        self.faults.count()
    }

    /// Continuity errors of the finished run.
    ///
    /// Neutral (zero) values outside the valid query window, which is after
    /// [`Engine::end`] and before [`Engine::close`].
    #[must_use]
    pub fn mass_balance_errors(&self) -> MassBalanceErrors {
        if self.phase == Phase::Open {
            self.mass_balance
        } else {
            MassBalanceErrors::default()
        }
    }

    /// Engine version string.
    #[must_use]
    pub fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Coupling readout of one drainage node's current state.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotOpen`] when no project is open, or
    /// [`EngineError::ObjectIndex`] for an out-of-range node index.
    pub fn node_state(&self, index: usize) -> Result<NodeState, EngineError> {
        let count = self.node_index_bound(index)?;
        self.systems
            .routing
            .node_state(index)
            .ok_or(EngineError::ObjectIndex { index, count })
    }

    /// Injects an external lateral inflow at a drainage node, to be picked
    /// up by the next routing step.
    ///
    /// Coupling errors are reported to the caller but are not sticky; the
    /// run itself stays valid.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotOpen`], [`EngineError::ObjectIndex`], or a routing
    /// collaborator failure.
    pub fn add_node_inflow(
        &mut self,
        index: usize,
        inflow: VolumeRate,
    ) -> Result<(), EngineError> {
        self.node_index_bound(index)?;
        self.systems
            .routing
            .add_node_inflow(index, inflow)
            .map_err(|e| EngineError::collaborator(Stage::Routing, e))
    }

    fn node_index_bound(&self, index: usize) -> Result<usize, EngineError> {
        if self.phase == Phase::Closed {
            return Err(EngineError::NotOpen);
        }
        let count = self.config.map_or(0, |c| c.node_count);
        if index >= count {
            return Err(EngineError::ObjectIndex { index, count });
        }
        Ok(count)
    }

    fn guard(&self) -> Result<(), EngineError> {
        match &self.sticky {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: EngineError) -> EngineError {
        tracing::error!(error = %err, "phase failed");
        self.sticky = Some(err.clone());
        err
    }
}
