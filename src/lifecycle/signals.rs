//! OS signal handling.
//!
//! # Responsibilities
//! - Subscribe to termination signals (SIGINT, SIGTERM) before work launches
//! - Translate the first received signal into a single `Termination`
//! - Offer a programmatic source for tests and embedders
//!
//! # Design Decisions
//! - Arming is synchronous so no signal can slip in before the subscription
//! - One signal per lifetime: the pending future resolves once and is done
//! - The OS subscription lapses when the pending future is dropped

use std::fmt;
use std::io;

use futures_util::future::BoxFuture;
use tokio::sync::oneshot;

/// A termination request delivered from outside the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGINT, Ctrl-C.
    Interrupt,
    /// SIGTERM, console close.
    Terminate,
}

impl Termination {
    /// Human-readable reason, used only for logging.
    pub fn reason(&self) -> &'static str {
        match self {
            Termination::Interrupt => "interrupt",
            Termination::Terminate => "terminated",
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Resolves to the first termination signal, or `None` if the source ended
/// without delivering one.
pub type PendingSignal = BoxFuture<'static, Option<Termination>>;

/// Source of termination signals for one supervisor lifetime.
pub trait SignalWatcher: Send {
    /// Subscribe now and return the wait for the first signal.
    fn arm(self: Box<Self>) -> io::Result<PendingSignal>;
}

/// Watches the operating system's termination signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsSignals;

impl OsSignals {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
impl SignalWatcher for OsSignals {
    fn arm(self: Box<Self>) -> io::Result<PendingSignal> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        Ok(Box::pin(async move {
            let received = tokio::select! {
                Some(()) = sigint.recv() => Termination::Interrupt,
                Some(()) = sigterm.recv() => Termination::Terminate,
                else => return None,
            };
            tracing::debug!(signal = %received, "Termination signal received");
            Some(received)
        }))
    }
}

#[cfg(windows)]
impl SignalWatcher for OsSignals {
    fn arm(self: Box<Self>) -> io::Result<PendingSignal> {
        use tokio::signal::windows::{ctrl_c, ctrl_close};

        let mut interrupt = ctrl_c()?;
        let mut close = ctrl_close()?;

        Ok(Box::pin(async move {
            let received = tokio::select! {
                Some(()) = interrupt.recv() => Termination::Interrupt,
                Some(()) = close.recv() => Termination::Terminate,
                else => return None,
            };
            tracing::debug!(signal = %received, "Termination signal received");
            Some(received)
        }))
    }
}

/// Create a programmatic signal source and its trigger.
pub fn manual() -> (ManualSignals, SignalTrigger) {
    let (tx, rx) = oneshot::channel();
    (ManualSignals { rx }, SignalTrigger { tx })
}

/// Signal source fed by a [`SignalTrigger`].
#[derive(Debug)]
pub struct ManualSignals {
    rx: oneshot::Receiver<Termination>,
}

impl SignalWatcher for ManualSignals {
    fn arm(self: Box<Self>) -> io::Result<PendingSignal> {
        let rx = self.rx;
        Ok(Box::pin(async move { rx.await.ok() }))
    }
}

/// Delivers one termination to a [`ManualSignals`]. Dropping it unfired ends
/// the source without a signal.
#[derive(Debug)]
pub struct SignalTrigger {
    tx: oneshot::Sender<Termination>,
}

impl SignalTrigger {
    /// Deliver `signal`. Returns `false` if the watcher is already gone.
    pub fn fire(self, signal: Termination) -> bool {
        self.tx.send(signal).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reasons() {
        assert_eq!(Termination::Interrupt.reason(), "interrupt");
        assert_eq!(Termination::Terminate.reason(), "terminated");
        assert_eq!(Termination::Terminate.to_string(), "terminated");
    }

    #[tokio::test]
    async fn test_manual_delivers_fired_signal() {
        let (signals, trigger) = manual();
        let pending = Box::new(signals).arm().unwrap();
        assert!(trigger.fire(Termination::Interrupt));
        assert_eq!(pending.await, Some(Termination::Interrupt));
    }

    #[tokio::test]
    async fn test_manual_signal_fired_before_arming_is_kept() {
        let (signals, trigger) = manual();
        trigger.fire(Termination::Terminate);
        let pending = Box::new(signals).arm().unwrap();
        assert_eq!(pending.await, Some(Termination::Terminate));
    }

    #[tokio::test]
    async fn test_manual_dropped_trigger_ends_source() {
        let (signals, trigger) = manual();
        drop(trigger);
        let pending = Box::new(signals).arm().unwrap();
        assert_eq!(pending.await, None);
    }

    #[tokio::test]
    async fn test_fire_after_watcher_dropped() {
        let (signals, trigger) = manual();
        drop(signals);
        assert!(!trigger.fire(Termination::Interrupt));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_os_signals_arm_inside_runtime() {
        let pending = Box::new(OsSignals::new()).arm();
        assert!(pending.is_ok());
    }
}
