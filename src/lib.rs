//! Process lifecycle supervisor and HTTP/service scaffold.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod service;

pub use config::{Options, Settings};
pub use error::{BoxError, ShutdownError, SupervisorError};
pub use http::{HttpServer, Routes};
pub use lifecycle::{BackgroundTask, DrainSignal, ErrorReporter, Supervisor, WorkStarter};
pub use observability::LogSink;
pub use service::Service;
