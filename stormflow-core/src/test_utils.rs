//! Recording collaborator fakes for engine tests.
//!
//! Every fake appends to a shared [`Activity`] log, so a test can inspect
//! call ordering and captured values after the boxed collaborators have
//! been handed to the engine.

use std::{cell::RefCell, panic, rc::Rc};

use jiff::civil;
use uom::si::{
    f64::{Time, VolumeRate},
    time::{day, hour, second},
};

use crate::{
    config::{RoutingMethod, RunConfig},
    error::SystemResult,
    fault::{FaultKind, NumericFault},
    systems::{
        ClimateState, HotStartFile, MassBalance, MassBalanceErrors, NodeState, ProjectLoader,
        RainfallProcessor, ResultsWriter, RoutingAdvance, RoutingEngine, RunFiles, RunoffEngine,
        Statistics, Systems,
    },
};

/// Shared record of collaborator activity.
#[derive(Debug, Default)]
pub struct Activity {
    pub calls: Vec<&'static str>,
    pub snapshot_hours: Vec<f64>,
    pub climate_dates: Vec<civil::DateTime>,
    pub runoff_executes: u32,
}

pub type SharedActivity = Rc<RefCell<Activity>>;

fn log(activity: &SharedActivity, call: &'static str) {
    activity.borrow_mut().calls.push(call);
}

/// Two-day run, daily reports, 6-hour routing steps, hourly runoff steps.
pub fn two_day_config() -> RunConfig {
    RunConfig {
        start: civil::date(2024, 10, 1).at(0, 0, 0, 0),
        total_duration: Time::new::<day>(2.0),
        report_step: Time::new::<hour>(24.0),
        wet_step: Time::new::<hour>(1.0),
        route_step: Time::new::<hour>(6.0),
        route_model: RoutingMethod::KinematicWave,
        ignore_rainfall: false,
        ignore_routing: false,
        subcatchment_count: 1,
        node_count: 2,
    }
}

/// How the fake routing engine behaves during a test.
#[derive(Debug, Clone, Copy)]
pub struct RoutingBehavior {
    /// Step length in seconds returned by `step_length` instead of the
    /// nominal step.
    pub step_override: Option<f64>,
    /// Number of `execute` calls that raise a continuable fault before the
    /// advance succeeds.
    pub faults_before_success: u32,
    /// Number of `open` calls that raise a continuable fault before the
    /// open succeeds.
    pub faults_on_open: u32,
    /// Convergence flag reported on every advance.
    pub converges: bool,
}

impl Default for RoutingBehavior {
    fn default() -> Self {
        Self {
            step_override: None,
            faults_before_success: 0,
            faults_on_open: 0,
            converges: true,
        }
    }
}

struct FakeProject {
    config: RunConfig,
    activity: SharedActivity,
}

impl ProjectLoader for FakeProject {
    fn open(&mut self, _files: &RunFiles) -> SystemResult<()> {
        log(&self.activity, "project.open");
        Ok(())
    }

    fn read_input(&mut self) -> SystemResult<()> {
        log(&self.activity, "project.read_input");
        Ok(())
    }

    fn validate(&mut self) -> SystemResult<()> {
        log(&self.activity, "project.validate");
        Ok(())
    }

    fn init(&mut self) -> SystemResult<()> {
        log(&self.activity, "project.init");
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }

    fn close(&mut self) {
        log(&self.activity, "project.close");
    }
}

struct FakeRainfall {
    activity: SharedActivity,
}

impl RainfallProcessor for FakeRainfall {
    fn open(&mut self) -> SystemResult<()> {
        log(&self.activity, "rainfall.open");
        Ok(())
    }

    fn close(&mut self) {
        log(&self.activity, "rainfall.close");
    }
}

struct FakeRunoff {
    step: Time,
    clock: Time,
    activity: SharedActivity,
}

impl RunoffEngine for FakeRunoff {
    fn open(&mut self) -> SystemResult<()> {
        log(&self.activity, "runoff.open");
        Ok(())
    }

    fn execute(&mut self) -> SystemResult<Time> {
        self.clock = self.clock + self.step;
        self.activity.borrow_mut().runoff_executes += 1;
        Ok(self.clock)
    }

    fn close(&mut self) {
        log(&self.activity, "runoff.close");
    }
}

struct FakeRouting {
    clock: Time,
    behavior: RoutingBehavior,
    faults_left: u32,
    open_faults_left: u32,
    node_count: usize,
    activity: SharedActivity,
}

impl RoutingEngine for FakeRouting {
    fn open(&mut self) -> SystemResult<()> {
        if self.open_faults_left > 0 {
            self.open_faults_left -= 1;
            panic::panic_any(NumericFault {
                kind: FaultKind::FloatingPoint,
            });
        }
        log(&self.activity, "routing.open");
        Ok(())
    }

    fn step_length(&mut self, _method: RoutingMethod, nominal: Time) -> Time {
        match self.behavior.step_override {
            Some(seconds) => Time::new::<second>(seconds),
            None => nominal,
        }
    }

    fn execute(&mut self, _method: RoutingMethod, step: Time) -> SystemResult<RoutingAdvance> {
        if self.faults_left > 0 {
            self.faults_left -= 1;
            panic::panic_any(NumericFault {
                kind: FaultKind::FloatingPoint,
            });
        }
        self.clock = self.clock + step;
        Ok(RoutingAdvance {
            elapsed: self.clock,
            converged: self.behavior.converges,
        })
    }

    fn close(&mut self, _method: RoutingMethod) {
        log(&self.activity, "routing.close");
    }

    fn node_state(&self, index: usize) -> Option<NodeState> {
        (index < self.node_count).then(NodeState::default)
    }

    fn add_node_inflow(&mut self, _index: usize, _inflow: VolumeRate) -> SystemResult<()> {
        log(&self.activity, "routing.add_node_inflow");
        Ok(())
    }
}

struct FakeClimate {
    activity: SharedActivity,
}

impl ClimateState for FakeClimate {
    fn set_state(&mut self, date: civil::DateTime) {
        self.activity.borrow_mut().climate_dates.push(date);
    }
}

struct FakeHotStart {
    fail: bool,
    activity: SharedActivity,
}

impl HotStartFile for FakeHotStart {
    fn open(&mut self) -> SystemResult<()> {
        log(&self.activity, "hot_start.open");
        if self.fail {
            return Err("checkpoint file truncated".into());
        }
        Ok(())
    }

    fn close(&mut self) {
        log(&self.activity, "hot_start.close");
    }
}

struct FakeMassBalance {
    activity: SharedActivity,
}

impl MassBalance for FakeMassBalance {
    fn open(&mut self) -> SystemResult<()> {
        log(&self.activity, "mass_balance.open");
        Ok(())
    }

    fn report(&mut self) -> MassBalanceErrors {
        log(&self.activity, "mass_balance.report");
        MassBalanceErrors {
            runoff: 1.5,
            groundwater: 0.0,
            flow: -0.8,
            quality: 0.3,
        }
    }

    fn close(&mut self) {
        log(&self.activity, "mass_balance.close");
    }
}

struct FakeStatistics {
    activity: SharedActivity,
}

impl Statistics for FakeStatistics {
    fn open(&mut self) -> SystemResult<()> {
        log(&self.activity, "statistics.open");
        Ok(())
    }

    fn report(&mut self) {
        log(&self.activity, "statistics.report");
    }

    fn close(&mut self) {
        log(&self.activity, "statistics.close");
    }
}

struct FakeResults {
    activity: SharedActivity,
}

impl ResultsWriter for FakeResults {
    fn open(&mut self) -> SystemResult<()> {
        log(&self.activity, "results.open");
        Ok(())
    }

    fn save(&mut self, instant: Time) -> SystemResult<()> {
        self.activity
            .borrow_mut()
            .snapshot_hours
            .push(instant.get::<hour>());
        Ok(())
    }

    fn end(&mut self) -> SystemResult<()> {
        log(&self.activity, "results.end");
        Ok(())
    }

    fn check_size(&mut self) -> SystemResult<()> {
        log(&self.activity, "results.check_size");
        Ok(())
    }

    fn close(&mut self) {
        log(&self.activity, "results.close");
    }
}

/// Builds a full set of recording fakes for `config`.
pub fn systems(config: RunConfig) -> (Systems, SharedActivity) {
    systems_with(config, RoutingBehavior::default(), false)
}

/// Builds recording fakes with a configured routing behavior and an
/// optionally failing hot-start checkpoint.
pub fn systems_with(
    config: RunConfig,
    routing: RoutingBehavior,
    failing_hot_start: bool,
) -> (Systems, SharedActivity) {
    let activity = SharedActivity::default();
    let systems = Systems {
        project: Box::new(FakeProject {
            config,
            activity: Rc::clone(&activity),
        }),
        rainfall: Box::new(FakeRainfall {
            activity: Rc::clone(&activity),
        }),
        runoff: Box::new(FakeRunoff {
            step: config.wet_step,
            clock: Time::default(),
            activity: Rc::clone(&activity),
        }),
        routing: Box::new(FakeRouting {
            clock: Time::default(),
            behavior: routing,
            faults_left: routing.faults_before_success,
            open_faults_left: routing.faults_on_open,
            node_count: config.node_count,
            activity: Rc::clone(&activity),
        }),
        climate: Box::new(FakeClimate {
            activity: Rc::clone(&activity),
        }),
        hot_start: Box::new(FakeHotStart {
            fail: failing_hot_start,
            activity: Rc::clone(&activity),
        }),
        mass_balance: Box::new(FakeMassBalance {
            activity: Rc::clone(&activity),
        }),
        statistics: Box::new(FakeStatistics {
            activity: Rc::clone(&activity),
        }),
        results: Box::new(FakeResults {
            activity: Rc::clone(&activity),
        }),
    };
    (systems, activity)
}
