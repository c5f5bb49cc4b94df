//! Time-stepping orchestration for one routing step.
//!
//! Runoff and routing advance on independent clocks: runoff takes many
//! small wet-weather steps, routing takes one (possibly adaptive) step per
//! engine step. The two are merged by a synchronization rule: runoff is run
//! until its clock reaches or passes the instant the routing step will land
//! on, then routing advances the shared clock to that instant.

use uom::si::{
    f64::Time,
    time::{hour, millisecond, second},
};

use crate::{
    config::RunConfig,
    error::{EngineError, Stage},
    systems::Systems,
};

/// Shared simulation clocks and step accounting.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Clocks {
    /// Elapsed time the runoff sub-model has advanced to.
    pub runoff: Time,
    /// Elapsed time flow routing has advanced to; never exceeds the total
    /// duration.
    pub routing: Time,
    pub step_count: u64,
    pub non_converge_count: u64,
}

/// Advances the run by one routing step.
///
/// Only called while the routing clock is short of the total duration.
/// On error the routing clock is left untouched. The caller counts the
/// step; this body may be re-run by the fault boundary and must not
/// mutate anything that is not guarded against repetition.
pub(crate) fn advance(
    systems: &mut Systems,
    clocks: &mut Clocks,
    config: &RunConfig,
    do_runoff: bool,
    do_routing: bool,
) -> Result<(), EngineError> {
    // With routing inactive its cadence is governed by the smaller of the
    // wet-weather and report steps instead.
    let mut step = if do_routing {
        systems
            .routing
            .step_length(config.route_model, config.route_step)
    } else {
        config.wet_step.min(config.report_step)
    };
    let seconds = step.get::<second>();
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(EngineError::InvalidTimeStep { seconds });
    }

    // Clamp the final step so the total duration is reached exactly,
    // never overshot. The step never shrinks below one millisecond.
    let mut next = clocks.routing + step;
    if next > config.total_duration {
        step = (config.total_duration - clocks.routing).max(Time::new::<millisecond>(1.0));
        next = config.total_duration;
    }

    if do_runoff {
        // Catch-up loop: runoff may need several of its own steps to cover
        // the routing interval, but never fewer.
        while clocks.runoff < next {
            let before = clocks.runoff;
            clocks.runoff = systems
                .runoff
                .execute()
                .map_err(|e| EngineError::collaborator(Stage::Runoff, e))?;
            if clocks.runoff <= before {
                return Err(EngineError::StalledClock { clock: "runoff" });
            }
        }
    } else {
        // No runoff pass; keep evaporation and other slow boundary
        // conditions current instead.
        systems
            .climate
            .set_state(config.date_time_at(clocks.routing));
    }

    if do_routing {
        let advance = systems
            .routing
            .execute(config.route_model, step)
            .map_err(|e| EngineError::collaborator(Stage::Routing, e))?;
        if !advance.converged {
            clocks.non_converge_count += 1;
        }
        if advance.elapsed <= clocks.routing {
            return Err(EngineError::StalledClock { clock: "routing" });
        }
        // The 1 ms floor can carry the final advance past the total
        // duration; the routing clock never exceeds it.
        clocks.routing = advance.elapsed.min(config.total_duration);
    } else {
        clocks.routing = next;
    }

    tracing::trace!(
        step = clocks.step_count,
        routing_hours = clocks.routing.get::<hour>(),
        "step complete"
    );
    Ok(())
}
