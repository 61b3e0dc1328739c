//! Configuration for the seqgraph binary

use seqgraph_reducer::ReducerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory scanned for `.csv` logs
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    /// Directory the JSON graphs are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// How input files map to output graphs
    #[serde(default)]
    pub grouping: Grouping,

    /// Fixed output name for per-file runs; all files merge into it
    #[serde(default)]
    pub chosen_filename: Option<String>,

    /// Reduction settings
    #[serde(default)]
    pub reducer: ReducerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
            grouping: Grouping::default(),
            chosen_filename: None,
            reducer: ReducerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Output grouping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// One graph per input log, reduced in the configured focus
    PerFile,
    /// Every log is one team session; graphs merge per experimental condition
    #[default]
    ByCondition,
}

impl Grouping {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().replace('-', "_").as_str() {
            "per_file" | "file" => Some(Self::PerFile),
            "by_condition" | "condition" => Some(Self::ByCondition),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_input_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("data/output")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `SEQGRAPH__*` environment variables.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        // Nested keys use a double underscore: SEQGRAPH__REDUCER__FOCUS=players
        builder = builder.add_source(
            config::Environment::with_prefix("SEQGRAPH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}
