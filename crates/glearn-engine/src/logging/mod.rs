//! Logging utilities.
//!
//! Centralizes logger initialization. Everything else in the workspace only
//! talks to the `log` facade: resource creation at `debug`, releases at
//! `trace`, recoverable problems at `warn`.

mod init;

pub use init::{init_logging, LoggingConfig};
