use stormflow_core::{MassBalance, MassBalanceErrors, SystemResult};

/// Continuity bookkeeping that reports fixed error percentages.
///
/// A trivially perfect run by default; [`ContinuityTracker::with_errors`]
/// injects known error values for callers testing their handling of
/// imperfect runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuityTracker {
    errors: MassBalanceErrors,
}

impl ContinuityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_errors(errors: MassBalanceErrors) -> Self {
        Self { errors }
    }
}

impl MassBalance for ContinuityTracker {
    fn open(&mut self) -> SystemResult<()> {
        Ok(())
    }

    fn report(&mut self) -> MassBalanceErrors {
        tracing::debug!(
            runoff_pct = self.errors.runoff,
            flow_pct = self.errors.flow,
            "continuity errors reported"
        );
        self.errors
    }

    fn close(&mut self) {}
}
