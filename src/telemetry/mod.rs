//! Telemetry: logging setup for the command-line front end.
//!
//! The packet engine itself never logs.

mod logging;

pub use logging::{init_logging, LogConfig};
