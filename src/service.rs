//! Background service work starter.
//!
//! A `Service` is a long-running worker with no listener: it runs one async
//! closure until the supervisor asks it to drain. Its "started" event carries
//! the process id.

use std::future::Future;

use futures_util::future::BoxFuture;

use crate::error::BoxError;
use crate::lifecycle::{BackgroundTask, DrainSignal, ErrorReporter, Supervisor, WorkStarter};
use crate::observability::{attr, Attr};

/// Name the supervisor uses in log messages for services.
pub const SERVICE_NAME: &str = "Service";

pub struct Service {
    task: BackgroundTask,
}

impl Service {
    /// Wrap `work`. It should return once `drain` is requested.
    pub fn new<F, Fut>(work: F) -> Self
    where
        F: FnOnce(DrainSignal) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let identity = vec![attr("pid", std::process::id())];
        Self {
            task: BackgroundTask::new(work).with_identity(identity),
        }
    }

    /// A supervisor that logs "Service started." / "Service stopped.".
    pub fn supervisor(self) -> Supervisor {
        Supervisor::new(self).with_name(SERVICE_NAME)
    }
}

impl WorkStarter for Service {
    fn start(&mut self, errors: ErrorReporter) {
        self.task.start(errors);
    }

    fn shutdown(&mut self) -> BoxFuture<'_, Result<(), BoxError>> {
        self.task.shutdown()
    }

    fn identity(&self) -> Vec<Attr> {
        self.task.identity()
    }
}
