use stormflow_core::{ProjectLoader, RunConfig, RunFiles, SystemResult};

/// A project whose data is already in memory.
///
/// `open` and `read_input` are no-ops; `validate` checks the held
/// [`RunConfig`]. Useful for embedding callers that assemble a run
/// programmatically instead of parsing an input file.
#[derive(Debug, Clone)]
pub struct InMemoryProject {
    config: RunConfig,
}

impl InMemoryProject {
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }
}

impl ProjectLoader for InMemoryProject {
    fn open(&mut self, files: &RunFiles) -> SystemResult<()> {
        tracing::debug!(input = %files.input.display(), "in-memory project opened");
        Ok(())
    }

    fn read_input(&mut self) -> SystemResult<()> {
        Ok(())
    }

    fn validate(&mut self) -> SystemResult<()> {
        self.config.validate()?;
        Ok(())
    }

    fn init(&mut self) -> SystemResult<()> {
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }

    fn close(&mut self) {
        tracing::debug!("in-memory project closed");
    }
}
