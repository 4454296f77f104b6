//! Lifecycle supervisor.
//!
//! # State Machine
//! ```text
//! Idle ──start()──▶ Running ──error / panic──────────▶ Terminated(err: Startup)
//!                      │
//!                      ├──signal──▶ Stopping ──drain ok──▶ Terminated(ok)
//!                      │               └──drain failed/late──▶ Terminated(err: Shutdown)
//!                      │
//!                      └──work done + signal source ended──▶ Terminated(ok, reason=completed)
//! ```
//!
//! The `completed` edge needs a signal source that can end; `OsSignals` never
//! does, so in production only the first two edges occur.
//!
//! # Design Decisions
//! - The signal watcher is armed before the work is launched
//! - "started" is logged before waiting; the terminal event is the last action
//! - A startup error skips shutdown entirely; the watcher task is aborted
//! - Both channels are one-shot: the losing producer never blocks

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::schema::DEFAULT_GRACE_PERIOD;
use crate::error::{BoxError, ShutdownError, SupervisorError};
use crate::lifecycle::signals::{OsSignals, SignalWatcher, Termination};
use crate::lifecycle::work::{ErrorReporter, WorkStarter};
use crate::observability::{attr, LogSink, TracingSink};

/// Reason logged when the work ended cleanly and no signal can arrive anymore.
pub const REASON_COMPLETED: &str = "completed";

/// What won the race in the wait loop.
enum Outcome {
    Failed(BoxError),
    Signalled(Termination),
    Exhausted,
}

/// Aborts the watcher task when the supervisor returns.
struct WatcherGuard(JoinHandle<()>);

impl Drop for WatcherGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Runs one unit of work until it fails or a termination signal drains it.
///
/// Consumed by [`Supervisor::start`]; one supervisor serves exactly one run.
pub struct Supervisor {
    log: Arc<dyn LogSink>,
    work: Box<dyn WorkStarter>,
    signals: Box<dyn SignalWatcher>,
    grace_period: Duration,
    name: String,
}

impl Supervisor {
    /// Supervise `work` with OS signals, the tracing sink and default grace period.
    pub fn new(work: impl WorkStarter + 'static) -> Self {
        Self {
            log: Arc::new(TracingSink::new()),
            work: Box::new(work),
            signals: Box::new(OsSignals::new()),
            grace_period: DEFAULT_GRACE_PERIOD,
            name: "Server".to_string(),
        }
    }

    /// Replace the log sink.
    pub fn with_logger(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Replace the signal source.
    pub fn with_signals(mut self, signals: impl SignalWatcher + 'static) -> Self {
        self.signals = Box::new(signals);
        self
    }

    /// Bound on the graceful drain. Zero keeps the default.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        if !grace_period.is_zero() {
            self.grace_period = grace_period;
        }
        self
    }

    /// Name used in log messages, e.g. "Server" or "Service".
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Effective bound on the graceful drain.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Name used in log messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Launch the work and block until exactly one terminal outcome.
    ///
    /// Returns `Ok(())` after a clean drain, `Startup` if the work reported a
    /// fatal error first, `Shutdown` if the drain failed or overran the grace
    /// period.
    pub async fn start(self) -> Result<(), SupervisorError> {
        let Self {
            log,
            mut work,
            signals,
            grace_period,
            name,
        } = self;
        let noun = name.to_lowercase();
        let failed_start = format!("Failed to start {}.", noun);

        let pending = match signals.arm() {
            Ok(pending) => pending,
            Err(err) => {
                log.error(&err, &failed_start, &[]);
                return Err(SupervisorError::Startup(Box::new(err)));
            }
        };

        let (err_tx, mut err_rx) = oneshot::channel::<BoxError>();
        let (stop_tx, mut stop_rx) = oneshot::channel::<Termination>();

        let watcher = WatcherGuard(tokio::spawn(async move {
            if let Some(signal) = pending.await {
                let _ = stop_tx.send(signal);
            }
        }));

        work.start(ErrorReporter::new(err_tx));
        log.info(&format!("{} started.", name), &work.identity());

        let mut errors_open = true;
        let mut signals_open = true;
        let outcome = loop {
            tokio::select! {
                received = &mut err_rx, if errors_open => match received {
                    Ok(err) => break Outcome::Failed(err),
                    Err(_) => {
                        tracing::debug!("Work finished without a fatal error");
                        errors_open = false;
                    }
                },
                received = &mut stop_rx, if signals_open => match received {
                    Ok(signal) => break Outcome::Signalled(signal),
                    Err(_) => {
                        tracing::debug!("Signal source ended without a signal");
                        signals_open = false;
                    }
                },
                else => break Outcome::Exhausted,
            }
        };
        drop(err_rx);
        drop(stop_rx);
        drop(watcher);

        match outcome {
            Outcome::Failed(err) => {
                log.error(&*err, &failed_start, &[]);
                Err(SupervisorError::Startup(err))
            }
            Outcome::Signalled(signal) => {
                tracing::debug!(signal = %signal, grace_period = ?grace_period, "Draining work");
                match drain(work.as_mut(), grace_period).await {
                    Ok(()) => {
                        log.info(&format!("{} stopped.", name), &[attr("reason", signal.reason())]);
                        Ok(())
                    }
                    Err(err) => {
                        log.error(&err, &format!("Failed to shutdown {} gracefully.", noun), &[]);
                        Err(SupervisorError::Shutdown(err))
                    }
                }
            }
            Outcome::Exhausted => {
                log.info(&format!("{} stopped.", name), &[attr("reason", REASON_COMPLETED)]);
                Ok(())
            }
        }
    }
}

/// Run the work's shutdown routine within `grace_period`.
async fn drain(work: &mut dyn WorkStarter, grace_period: Duration) -> Result<(), ShutdownError> {
    match tokio::time::timeout(grace_period, work.shutdown()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(ShutdownError::Drain(err)),
        Err(_) => Err(ShutdownError::Deadline(grace_period)),
    }
}
