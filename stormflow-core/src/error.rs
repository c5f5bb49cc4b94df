use std::{error::Error as StdError, fmt, sync::Arc};

use thiserror::Error;

use crate::fault::FaultKind;

/// Boxed failure surfaced by a collaborator subsystem.
pub type SystemError = Box<dyn StdError + Send + Sync>;

/// Convenience alias for collaborator results.
pub type SystemResult<T> = Result<T, SystemError>;

/// Lifecycle stage a collaborator failure was raised from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Project,
    Rainfall,
    Runoff,
    Routing,
    HotStart,
    MassBalance,
    Statistics,
    Results,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Project => "project",
            Self::Rainfall => "rainfall",
            Self::Runoff => "runoff",
            Self::Routing => "routing",
            Self::HotStart => "hot start",
            Self::MassBalance => "mass balance",
            Self::Statistics => "statistics",
            Self::Results => "results",
        };
        f.write_str(name)
    }
}

/// Errors reported by the simulation engine.
///
/// One of these becomes the run's sticky error the moment it is returned:
/// every later phase call short-circuits with a clone of it, except for
/// [`Engine::end`] and [`Engine::close`], which still perform best-effort
/// teardown.
///
/// Collaborator sources are held in an [`Arc`] so the sticky value can be
/// cloned and re-returned without losing the error chain.
///
/// [`Engine::end`]: crate::Engine::end
/// [`Engine::close`]: crate::Engine::close
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A phase was called out of sequence, or a run was started twice.
    #[error("project not open, or the call is out of lifecycle order")]
    NotOpen,

    /// The run configuration failed validation before any subsystem opened.
    #[error("invalid run configuration: {reason}")]
    InputData { reason: &'static str },

    /// The routing step length came back non-positive or non-finite.
    #[error("invalid routing time step: {seconds} s")]
    InvalidTimeStep { seconds: f64 },

    /// A coupling accessor was given an out-of-range object index.
    #[error("object index {index} is out of range (object count: {count})")]
    ObjectIndex { index: usize, count: usize },

    /// A collaborator that must advance its clock failed to do so.
    #[error("{clock} clock failed to advance")]
    StalledClock { clock: &'static str },

    /// A fatal fault escaped the isolation boundary, or the continuable
    /// fault ceiling was reached.
    #[error("system fault: {fault}")]
    System { fault: FaultKind },

    /// A collaborator subsystem reported a failure.
    #[error("{stage} subsystem failed")]
    Collaborator {
        stage: Stage,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },
}

impl EngineError {
    pub(crate) fn collaborator(stage: Stage, source: SystemError) -> Self {
        Self::Collaborator {
            stage,
            source: Arc::from(source),
        }
    }
}

// Source chains are not comparable; collaborator errors compare by stage.
impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotOpen, Self::NotOpen) => true,
            (Self::InputData { reason: a }, Self::InputData { reason: b }) => a == b,
            (Self::InvalidTimeStep { seconds: a }, Self::InvalidTimeStep { seconds: b }) => a == b,
            (
                Self::ObjectIndex { index: a, count: b },
                Self::ObjectIndex { index: c, count: d },
            ) => a == c && b == d,
            (Self::StalledClock { clock: a }, Self::StalledClock { clock: b }) => a == b,
            (Self::System { fault: a }, Self::System { fault: b }) => a == b,
            (Self::Collaborator { stage: a, .. }, Self::Collaborator { stage: b, .. }) => a == b,
            _ => false,
        }
    }
}
