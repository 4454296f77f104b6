//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor::start (supervisor.rs):
//!     Arm signals → Launch work → Log "started" → Wait
//!
//! Work (work.rs):
//!     start() returns immediately → fatal error reported once via ErrorReporter
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → first one becomes the stop event
//!
//! Outcome:
//!     error first  → log "failed" → Err(Startup)
//!     signal first → drain within grace period → log "stopped" | Err(Shutdown)
//! ```
//!
//! # Design Decisions
//! - Exactly one terminal outcome per run
//! - No retries: restarting belongs to whoever calls `start`
//! - Shutdown has a deadline: overrunning it is an error, not a crash

pub mod signals;
pub mod supervisor;
pub mod work;

pub use signals::{manual, ManualSignals, OsSignals, SignalTrigger, SignalWatcher, Termination};
pub use supervisor::Supervisor;
pub use work::{BackgroundTask, DrainSignal, ErrorReporter, WorkStarter};
