//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Supervisor / HTTP server / caller code
//!     → logging.rs (LogSink contract, attributes, wire rendering)
//!     → sinks.rs (tracing, line writer, JSON, in-memory)
//!     → subscriber.rs (tracing output for the default sink)
//! ```
//!
//! # Design Decisions
//! - One explicit `LogSink` capability; `error` always carries the error value
//! - Attribute order is part of the wire format
//! - Logging never fails the caller and never panics

pub mod logging;
pub mod sinks;
pub mod subscriber;

pub use logging::{attr, pairs, render, Attr, Level, LogSink, Value};
pub use sinks::{JsonSink, MemorySink, Record, TracingSink, WriterSink};
