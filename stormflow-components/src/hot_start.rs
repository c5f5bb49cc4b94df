use stormflow_core::{HotStartFile, SystemResult};

/// A run with no hot-start checkpoint: every run begins from cold initial
/// conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColdStart;

impl HotStartFile for ColdStart {
    fn open(&mut self) -> SystemResult<()> {
        Ok(())
    }

    fn close(&mut self) {}
}
