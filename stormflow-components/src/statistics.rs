use stormflow_core::{Statistics, SystemResult};

/// Summary statistics accumulator that only counts how often it reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTally {
    reports: u32,
}

impl RunTally {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Statistics for RunTally {
    fn open(&mut self) -> SystemResult<()> {
        Ok(())
    }

    fn report(&mut self) {
        self.reports += 1;
        tracing::debug!(reports = self.reports, "run statistics reported");
    }

    fn close(&mut self) {}
}
