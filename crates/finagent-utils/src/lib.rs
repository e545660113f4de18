//! Shared utilities for finagent
//!
//! Logging setup and environment helpers used by the `finagent` binary and
//! the library crates' examples.

pub mod config;
pub mod logging;

pub use config::{env_non_empty, load_dotenv};
pub use logging::{LogConfig, LogFormat, init_tracing};
