//! Seqgraph command-line library
//!
//! This module provides the pieces behind the `seqgraph` binary:
//! - Layered configuration (defaults, file, environment)
//! - CSV log discovery and decoding
//! - Parallel per-file reduction and JSON output

pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;

pub use config::{AppConfig, Grouping, LoggingConfig};
pub use error::{CliError, CliResult};
pub use pipeline::{Pipeline, RunReport, VISUALIZATION_INDEX};
