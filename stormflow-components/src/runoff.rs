use stormflow_core::{RunoffEngine, SystemResult};
use uom::si::f64::Time;

/// A runoff engine that advances its clock by a fixed wet-weather step.
///
/// Produces no actual runoff; it exists to exercise the orchestrator's
/// catch-up loop, which runs it until its clock covers the next routing
/// instant.
#[derive(Debug, Clone, Copy)]
pub struct ConstantStepRunoff {
    step: Time,
    clock: Time,
}

impl ConstantStepRunoff {
    #[must_use]
    pub fn new(step: Time) -> Self {
        Self {
            step,
            clock: Time::default(),
        }
    }

    /// Elapsed time this engine has advanced to.
    #[must_use]
    pub fn clock(&self) -> Time {
        self.clock
    }
}

impl RunoffEngine for ConstantStepRunoff {
    fn open(&mut self) -> SystemResult<()> {
        self.clock = Time::default();
        Ok(())
    }

    fn execute(&mut self) -> SystemResult<Time> {
        self.clock = self.clock + self.step;
        Ok(self.clock)
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use uom::si::time::hour;

    #[test]
    fn clock_advances_by_one_step_per_execute() {
        let mut runoff = ConstantStepRunoff::new(Time::new::<hour>(1.0));
        runoff.open().unwrap();
        runoff.execute().unwrap();
        let clock = runoff.execute().unwrap();
        assert_relative_eq!(clock.get::<hour>(), 2.0);
        assert_relative_eq!(runoff.clock().get::<hour>(), 2.0);
    }
}
