use std::{cell::Cell, rc::Rc};

use jiff::civil;
use stormflow_core::ClimateState;

/// Tracks the calendar instant the orchestrator last synchronized climate
/// state to.
///
/// Real climate collaborators interpolate evaporation and temperature at
/// that instant; this one only records it. A [`ClimateHandle`] taken before
/// the tracker is boxed lets an embedding caller observe the instant from
/// outside the engine.
#[derive(Debug, Clone, Default)]
pub struct ClimateTracker {
    current: Rc<Cell<Option<civil::DateTime>>>,
}

/// Shared read handle onto a [`ClimateTracker`].
#[derive(Debug, Clone)]
pub struct ClimateHandle {
    current: Rc<Cell<Option<civil::DateTime>>>,
}

impl ClimateTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn handle(&self) -> ClimateHandle {
        ClimateHandle {
            current: Rc::clone(&self.current),
        }
    }
}

impl ClimateHandle {
    /// The instant climate state was last set to, if any.
    #[must_use]
    pub fn current(&self) -> Option<civil::DateTime> {
        self.current.get()
    }
}

impl ClimateState for ClimateTracker {
    fn set_state(&mut self, date: civil::DateTime) {
        self.current.set(Some(date));
    }
}
