//! Configuration for simulator setup.
//!
//! A configuration picks the simulation approach and its knobs, and may name
//! the top-level module to simulate from a [`ModuleLibrary`].
//!
//! # Configuration File Structure
//!
//! ```yaml
//! simulation:
//!   approach: event-driven
//!   check_connections: true
//!   max_iterations: 10000
//!   log_level: info
//!   collect_stats: true
//!
//! top: adder8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CircuitError;
use crate::registry::ModuleLibrary;
use crate::simulator::{create_simulator, Approach, SimOptions, Simulator, DEFAULT_MAX_ITERATIONS};

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    #[error("Circuit error: {0}")]
    Circuit(#[from] CircuitError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Simulation parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Levelization or event-driven
    #[serde(default)]
    pub approach: Approach,

    /// Run the connection-integrity checker before simulating
    #[serde(default = "default_check_connections")]
    pub check_connections: bool,

    /// Bound on event-driven convergence rounds; `null` never gives up
    #[serde(default = "default_max_iterations")]
    pub max_iterations: Option<usize>,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether [`SimConfig::stats_report`] hands out the run statistics
    #[serde(default)]
    pub collect_stats: bool,
}

fn default_check_connections() -> bool {
    true
}

fn default_max_iterations() -> Option<usize> {
    Some(DEFAULT_MAX_ITERATIONS)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            approach: Approach::default(),
            check_connections: default_check_connections(),
            max_iterations: default_max_iterations(),
            log_level: default_log_level(),
            collect_stats: false,
        }
    }
}

/// Complete simulator configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Simulation parameters
    #[serde(default)]
    pub simulation: SimulationParams,

    /// Type name of the top-level module, looked up in a module library
    #[serde(default)]
    pub top: Option<String>,
}

impl SimConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder.
    pub fn builder() -> SimConfigBuilder {
        SimConfigBuilder::new()
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Loads configuration from a JSON string.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file, auto-detecting format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match ext.to_lowercase().as_str() {
            "yaml" | "yml" => Self::from_yaml_file(path),
            "json" => Self::from_json_file(path),
            _ => Err(ConfigError::UnknownFormat(ext.to_string())),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let sim = &self.simulation;
        if sim.max_iterations == Some(0) {
            return Err(ConfigError::Validation(
                "max_iterations must be positive (use null for no bound)".to_string(),
            ));
        }
        if !LOG_LEVELS.contains(&sim.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "Unknown log level: {}",
                sim.log_level
            )));
        }
        if sim.approach == Approach::Levelization && sim.max_iterations != default_max_iterations() {
            tracing::warn!("max_iterations only applies to the event-driven approach (ignored)");
        }
        if matches!(&self.top, Some(name) if name.trim().is_empty()) {
            return Err(ConfigError::Validation("top module name is empty".to_string()));
        }
        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn to_yaml_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Saves configuration to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Converts to YAML string.
    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Converts to JSON string.
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the simulator options described by this configuration.
    pub fn options(&self) -> SimOptions {
        SimOptions {
            approach: self.simulation.approach,
            check_connections: self.simulation.check_connections,
            max_iterations: self.simulation.max_iterations,
        }
    }

    /// Installs the global tracing subscriber at the configured level.
    ///
    /// `RUST_LOG` still takes precedence when set.
    pub fn init_logging(&self) {
        crate::init_logging(&self.simulation.log_level.to_lowercase());
    }

    /// Returns the simulator's statistics when `collect_stats` is enabled.
    pub fn stats_report(&self, simulator: &dyn Simulator) -> Option<serde_json::Value> {
        self.simulation
            .collect_stats
            .then(|| simulator.export_stats())
    }

    /// Builds a simulator for the configured top module.
    pub fn build_simulator(&self, library: &ModuleLibrary) -> ConfigResult<Box<dyn Simulator>> {
        let name = self
            .top
            .as_deref()
            .ok_or_else(|| ConfigError::Validation("no top module configured".to_string()))?;
        let def = library
            .get(name)
            .ok_or_else(|| ConfigError::Validation(format!("Unknown module type: {name}")))?;
        Ok(create_simulator(def, &self.options())?)
    }
}

/// Builder for creating SimConfig programmatically.
#[derive(Default)]
pub struct SimConfigBuilder {
    config: SimConfig,
}

impl SimConfigBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the simulation approach.
    pub fn approach(mut self, approach: Approach) -> Self {
        self.config.simulation.approach = approach;
        self
    }

    /// Enables or disables the connection-integrity check.
    pub fn check_connections(mut self, enable: bool) -> Self {
        self.config.simulation.check_connections = enable;
        self
    }

    /// Sets the convergence bound.
    pub fn max_iterations(mut self, max: Option<usize>) -> Self {
        self.config.simulation.max_iterations = max;
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.simulation.log_level = level.into();
        self
    }

    /// Enables statistics collection.
    pub fn collect_stats(mut self, enable: bool) -> Self {
        self.config.simulation.collect_stats = enable;
        self
    }

    /// Sets the top-level module type.
    pub fn top(mut self, name: impl Into<String>) -> Self {
        self.config.top = Some(name.into());
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> ConfigResult<SimConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
