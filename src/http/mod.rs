//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, hyper HTTP/1.1, timeouts, drain)
//!     → middleware/request_logger.rs (one log event per request)
//!     → router.rs (pattern + trailing-slash twin → handler)
//!     → request.rs (client IP for the log event)
//! ```

pub mod middleware;
pub mod request;
pub mod router;
pub mod server;

pub use request::{client_ip, resolve_ip, NOT_AVAILABLE};
pub use router::Routes;
pub use server::{build_app, HttpError, HttpServer};
