use std::{cell::RefCell, rc::Rc};

use stormflow_core::{ResultsWriter, SystemResult};
use uom::si::f64::Time;

#[derive(Debug, Default)]
struct Stream {
    snapshots: Vec<Time>,
    open: bool,
    ended: bool,
}

/// A result stream held in memory instead of a binary file.
///
/// Snapshots are appended in the order the reporting scheduler takes them.
/// A [`ResultsHandle`] taken before the writer is boxed lets the caller
/// read them back after the run.
#[derive(Debug, Clone, Default)]
pub struct MemoryResults {
    stream: Rc<RefCell<Stream>>,
}

/// Shared read handle onto a [`MemoryResults`] stream.
#[derive(Debug, Clone)]
pub struct ResultsHandle {
    stream: Rc<RefCell<Stream>>,
}

impl MemoryResults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn handle(&self) -> ResultsHandle {
        ResultsHandle {
            stream: Rc::clone(&self.stream),
        }
    }
}

impl ResultsHandle {
    /// Snapshot instants persisted so far, in order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<Time> {
        self.stream.borrow().snapshots.clone()
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.stream.borrow().ended
    }
}

impl ResultsWriter for MemoryResults {
    fn open(&mut self) -> SystemResult<()> {
        let mut stream = self.stream.borrow_mut();
        stream.snapshots.clear();
        stream.open = true;
        stream.ended = false;
        Ok(())
    }

    fn save(&mut self, instant: Time) -> SystemResult<()> {
        let mut stream = self.stream.borrow_mut();
        if !stream.open {
            return Err("result stream is not open".into());
        }
        stream.snapshots.push(instant);
        Ok(())
    }

    fn end(&mut self) -> SystemResult<()> {
        self.stream.borrow_mut().ended = true;
        Ok(())
    }

    fn check_size(&mut self) -> SystemResult<()> {
        Ok(())
    }

    fn close(&mut self) {
        self.stream.borrow_mut().open = false;
    }
}
