//! Error types for the supervisor and its collaborators.

use std::time::Duration;
use thiserror::Error;

/// Opaque error produced by caller-supplied work.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal outcome of a failed supervisor run.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The work could not begin, or crashed while running.
    #[error("{0}")]
    Startup(#[source] BoxError),

    /// The graceful drain after a termination signal failed.
    #[error("{0}")]
    Shutdown(#[from] ShutdownError),
}

impl SupervisorError {
    /// Whether the work failed before any termination signal.
    pub fn is_startup(&self) -> bool {
        matches!(self, SupervisorError::Startup(_))
    }

    /// Whether the drain after a termination signal failed.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, SupervisorError::Shutdown(_))
    }
}

/// Failure of the shutdown routine.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("graceful shutdown did not finish within {0:?}")]
    Deadline(Duration),

    #[error("{0}")]
    Drain(#[source] BoxError),
}
