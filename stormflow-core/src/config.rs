use jiff::{SignedDuration, civil};
use serde::{Deserialize, Serialize};
use uom::si::{f64::Time, time::millisecond, time::second};

/// Flow routing method used by the routing collaborator.
///
/// The orchestrator never interprets the method itself; it only threads it
/// through to [`RoutingEngine::step_length`] and [`RoutingEngine::execute`],
/// since adaptive solvers pick their step differently per method.
///
/// [`RoutingEngine::step_length`]: crate::systems::RoutingEngine::step_length
/// [`RoutingEngine::execute`]: crate::systems::RoutingEngine::execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingMethod {
    SteadyFlow,
    KinematicWave,
    DynamicWave,
}

/// The slice of project options the orchestration core reads.
///
/// Produced by the project loader after input is read and validated.
/// Everything else in a project (subcatchment geometry, conduit data,
/// rain gages, …) belongs to the collaborators and never crosses this
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Calendar date and time the simulation starts at.
    pub start: civil::DateTime,
    /// Total simulated duration.
    pub total_duration: Time,
    /// Interval between persisted result snapshots.
    pub report_step: Time,
    /// Wet-weather runoff step; also bounds the routing cadence when no
    /// routing is performed.
    pub wet_step: Time,
    /// Nominal routing step handed to the routing collaborator.
    pub route_step: Time,
    /// Routing method threaded through to the routing collaborator.
    pub route_model: RoutingMethod,
    /// Skip rainfall processing entirely.
    pub ignore_rainfall: bool,
    /// Skip flow routing even when the project has nodes.
    pub ignore_routing: bool,
    /// Number of subcatchments; runoff is computed only when non-zero.
    pub subcatchment_count: usize,
    /// Number of drainage network nodes; routing is computed only when
    /// non-zero and not ignored.
    pub node_count: usize,
}

impl RunConfig {
    /// Validates that every duration is positive and finite.
    ///
    /// # Errors
    ///
    /// Returns a reason string naming the offending option.
    pub fn validate(&self) -> Result<(), &'static str> {
        for (value, reason) in [
            (self.total_duration, "total_duration must be positive"),
            (self.report_step, "report_step must be positive"),
            (self.wet_step, "wet_step must be positive"),
            (self.route_step, "route_step must be positive"),
        ] {
            let seconds = value.get::<second>();
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(reason);
            }
        }
        Ok(())
    }

    /// Calendar date/time at an elapsed simulation time.
    ///
    /// An extra millisecond is added before conversion so an instant that
    /// lands exactly on a boundary resolves to the interval that follows it.
    #[must_use]
    pub fn date_time_at(&self, elapsed: Time) -> civil::DateTime {
        let seconds = (elapsed.get::<millisecond>() + 1.0) / 1000.0;
        match SignedDuration::try_from_secs_f64(seconds) {
            Ok(duration) => self.start.saturating_add(duration),
            Err(_) => self.start,
        }
    }
}
