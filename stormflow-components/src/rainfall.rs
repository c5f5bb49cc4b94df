use stormflow_core::{RainfallProcessor, SystemResult};

/// A rainfall processor for projects with no rain gage data.
///
/// Real processors build a rainfall interface file and may synthesize
/// derived inflow series while opening; this one has nothing to prepare.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRainfall;

impl RainfallProcessor for NoRainfall {
    fn open(&mut self) -> SystemResult<()> {
        tracing::debug!("no rainfall data to process");
        Ok(())
    }

    fn close(&mut self) {}
}
