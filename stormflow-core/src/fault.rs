//! Best-effort isolation of low-level arithmetic faults.
//!
//! The numeric collaborators (runoff kernels, routing matrix solves) operate
//! near the edge of numerical stability, and a rare arithmetic fault should
//! not abort an otherwise-valid multi-hour run. Hardware-level exception
//! filtering is not portable, so this boundary catches unwinding panics
//! instead: a continuable fault is logged with the simulated time and step
//! count and the phase body is re-run, while memory-safety and unclassified
//! panics escalate to a fatal system error. Persistent faulting indicates
//! real divergence, so once [`MAX_FAULTS`] have been absorbed in a run the
//! next fault halts it regardless of class.
//!
//! Limitations: with `panic = "abort"` nothing can be absorbed, and the
//! boundary re-runs the whole phase body rather than resuming at the
//! faulting instruction. Numeric collaborators should prefer returning
//! explicit divergence errors; [`NumericFault`] exists for deep kernels
//! where threading a `Result` out is impractical.

use std::{
    any::Any,
    fmt,
    panic::{self, AssertUnwindSafe},
};

use uom::si::{f64::Time, time::hour};

use crate::error::EngineError;

/// Maximum number of continuable faults absorbed per run.
pub const MAX_FAULTS: u32 = 100;

/// Classification of an absorbed fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Floating-point overflow, underflow, division by zero, or an
    /// otherwise invalid operation.
    FloatingPoint,
    /// Integer overflow or division by zero.
    IntegerArithmetic,
    /// Anything that cannot be identified as a recoverable arithmetic
    /// fault, including memory-safety panics.
    Unclassified,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FloatingPoint => "floating-point fault",
            Self::IntegerArithmetic => "integer arithmetic fault",
            Self::Unclassified => "unclassified fault",
        };
        f.write_str(name)
    }
}

/// Panic payload a numeric collaborator may raise via
/// [`std::panic::panic_any`] to signal a recoverable arithmetic fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericFault {
    pub kind: FaultKind,
}

enum FaultClass {
    Continuable(FaultKind),
    Fatal(FaultKind),
}

fn classify(payload: &(dyn Any + Send)) -> FaultClass {
    if let Some(fault) = payload.downcast_ref::<NumericFault>() {
        return match fault.kind {
            FaultKind::Unclassified => FaultClass::Fatal(FaultKind::Unclassified),
            kind => FaultClass::Continuable(kind),
        };
    }

    // Rust's own checked integer arithmetic panics with fixed messages.
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str));
    match message {
        Some(m) if m.contains("divide by zero") || m.contains("with overflow") => {
            FaultClass::Continuable(FaultKind::IntegerArithmetic)
        }
        _ => FaultClass::Fatal(FaultKind::Unclassified),
    }
}

/// Per-run fault accounting for the isolation boundary.
#[derive(Debug, Default)]
pub struct FaultBoundary {
    count: u32,
}

impl FaultBoundary {
    /// Resets the counter at phase entry.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Number of faults absorbed so far in the current run.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Runs a phase body, absorbing continuable faults.
    ///
    /// `elapsed` and `step_count` identify where in the simulation the
    /// fault occurred; they only feed the diagnostic log line.
    ///
    /// # Errors
    ///
    /// Returns the body's own error, or [`EngineError::System`] when a
    /// fatal fault is caught or the fault ceiling is reached.
    pub fn isolate<T>(
        &mut self,
        elapsed: Time,
        step_count: u64,
        mut body: impl FnMut() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        loop {
            match panic::catch_unwind(AssertUnwindSafe(&mut body)) {
                Ok(result) => return result,
                Err(payload) => {
                    let hours = elapsed.get::<hour>();
                    match classify(payload.as_ref()) {
                        FaultClass::Continuable(fault) => {
                            self.count += 1;
                            if self.count >= MAX_FAULTS {
                                tracing::error!(
                                    %fault,
                                    step = step_count,
                                    elapsed_hours = hours,
                                    absorbed = self.count,
                                    "fault ceiling reached, halting run"
                                );
                                return Err(EngineError::System { fault });
                            }
                            tracing::warn!(
                                %fault,
                                step = step_count,
                                elapsed_hours = hours,
                                absorbed = self.count,
                                "continuable fault absorbed, re-running phase"
                            );
                        }
                        FaultClass::Fatal(fault) => {
                            tracing::error!(
                                %fault,
                                step = step_count,
                                elapsed_hours = hours,
                                "fatal fault, halting run"
                            );
                            return Err(EngineError::System { fault });
                        }
                    }
                }
            }
        }
    }
}
