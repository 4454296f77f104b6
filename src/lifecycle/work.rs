//! Work starter contract.
//!
//! # Responsibilities
//! - Define what the supervisor launches (`WorkStarter`)
//! - Carry the single fatal error from the work to the supervisor
//! - Provide `BackgroundTask`, a ready-made starter around an async closure
//!
//! # Design Decisions
//! - `ErrorReporter::report` consumes the reporter: at most one error per run
//! - Dropping the reporter means the work ended without a fatal error
//! - Reports after the supervisor returned are discarded, never blocked on
//! - A panic inside `BackgroundTask` work is an error, never a clean exit

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::future::{self, BoxFuture, FutureExt};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::BoxError;
use crate::observability::Attr;

/// Unit of work launched by the supervisor.
pub trait WorkStarter: Send {
    /// Begin the work. Must return immediately; fatal errors go to `errors`.
    fn start(&mut self, errors: ErrorReporter);

    /// Ask the work to finish in-flight operations and stop.
    ///
    /// Called at most once, only after a termination signal and only if
    /// `start` ran. The supervisor bounds it with the grace period.
    fn shutdown(&mut self) -> BoxFuture<'_, Result<(), BoxError>> {
        Box::pin(future::ready(Ok(())))
    }

    /// Attributes describing the work on the "started" event.
    fn identity(&self) -> Vec<Attr> {
        Vec::new()
    }
}

/// Write half of the supervisor's error channel.
#[derive(Debug)]
pub struct ErrorReporter {
    tx: oneshot::Sender<BoxError>,
}

impl ErrorReporter {
    pub(crate) fn new(tx: oneshot::Sender<BoxError>) -> Self {
        Self { tx }
    }

    /// Create a reporter and the receiver it feeds.
    pub fn channel() -> (Self, oneshot::Receiver<BoxError>) {
        let (tx, rx) = oneshot::channel();
        (Self::new(tx), rx)
    }

    /// Report the fatal error. Never blocks; dropped if nobody listens anymore.
    pub fn report(self, err: impl Into<BoxError>) {
        if self.tx.send(err.into()).is_err() {
            tracing::debug!("Fatal error reported after the supervisor stopped listening");
        }
    }

    /// Whether the supervisor has stopped listening.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Raised when the work is asked to drain.
#[derive(Debug, Clone)]
pub struct DrainSignal {
    rx: watch::Receiver<bool>,
}

impl DrainSignal {
    /// Whether a drain has been requested.
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until a drain is requested.
    ///
    /// Also completes if the owning task handle is dropped, since no drain
    /// request can arrive after that.
    pub async fn requested(&mut self) {
        let _ = self.rx.wait_for(|draining| *draining).await;
    }
}

/// Turn a caught panic payload into an error.
fn panic_error(payload: Box<dyn Any + Send>) -> BoxError {
    let detail = if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    };
    format!("background task panicked: {}", detail).into()
}

type Launch = Box<dyn FnOnce(DrainSignal) -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// A work starter running one async closure on the runtime.
///
/// An `Err` returned before a drain was requested is reported as fatal.
/// Once draining, the closure's result becomes the shutdown result.
pub struct BackgroundTask {
    launch: Option<Launch>,
    drain_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<Result<(), BoxError>>>,
    identity: Vec<Attr>,
}

impl BackgroundTask {
    pub fn new<F, Fut>(work: F) -> Self
    where
        F: FnOnce(DrainSignal) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let (drain_tx, _) = watch::channel(false);
        Self {
            launch: Some(Box::new(move |drain| work(drain).boxed())),
            drain_tx,
            handle: None,
            identity: Vec::new(),
        }
    }

    /// Attributes reported on the "started" event.
    pub fn with_identity(mut self, identity: Vec<Attr>) -> Self {
        self.identity = identity;
        self
    }
}

impl WorkStarter for BackgroundTask {
    fn start(&mut self, errors: ErrorReporter) {
        let Some(launch) = self.launch.take() else {
            errors.report("background task already started");
            return;
        };

        let drain = DrainSignal {
            rx: self.drain_tx.subscribe(),
        };
        let work = launch(drain.clone());

        self.handle = Some(tokio::spawn(async move {
            let result = AssertUnwindSafe(work)
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(panic_error(payload)));
            match result {
                Err(err) if !drain.is_requested() => {
                    errors.report(err);
                    Ok(())
                }
                result => result,
            }
        }));
    }

    fn shutdown(&mut self) -> BoxFuture<'_, Result<(), BoxError>> {
        self.drain_tx.send_replace(true);
        let handle = self.handle.take();
        Box::pin(async move {
            match handle {
                Some(handle) => handle.await?,
                None => Ok(()),
            }
        })
    }

    fn identity(&self) -> Vec<Attr> {
        self.identity.clone()
    }
}
