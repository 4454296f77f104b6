//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) and/or code
//!     → loader.rs (parse & deserialize into Options)
//!     → validation.rs (semantic checks)
//!     → Settings::resolve(&[Options]) (ordered overlay, then defaults)
//!     → Settings (immutable) handed to supervisor and server
//! ```
//!
//! # Design Decisions
//! - Zero value means "unset"; unset fields take the built-in default
//! - Resolution is a pure function of the option list
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_options, parse_options, ConfigError};
pub use schema::{Options, Settings};
pub use validation::{validate_options, ValidationError};
