//! The core Module Contract trait.

use super::{ModuleConfig, ModuleError, ModuleResult, ModuleStatus};
use std::collections::HashMap;

/// Identity of a module as reported to the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleManifest {
    /// Module name.
    pub name: String,
    /// Human readable description.
    pub description: String,
    /// Module version.
    pub version: String,
}

impl ModuleManifest {
    /// Creates a manifest for the named module.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            version: version.into(),
        }
    }
}

/// Metrics payload containing module-specific metrics.
#[derive(Debug, Clone, Default)]
pub struct MetricsPayload {
    /// Counter metrics (monotonically increasing).
    pub counters: HashMap<String, u64>,

    /// Gauge metrics (can go up and down).
    pub gauges: HashMap<String, f64>,
}

impl MetricsPayload {
    /// Creates a new empty metrics payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a counter metric.
    pub fn counter(&mut self, name: impl Into<String>, value: u64) {
        self.counters.insert(name.into(), value);
    }

    /// Adds a gauge metric.
    pub fn gauge(&mut self, name: impl Into<String>, value: f64) {
        self.gauges.insert(name.into(), value);
    }

    /// Formats metrics in Prometheus text format.
    ///
    /// Lines are sorted by metric name so the output is stable.
    #[must_use]
    pub fn to_prometheus(&self, prefix: &str) -> String {
        let mut lines: Vec<String> = self
            .counters
            .iter()
            .map(|(name, value)| format!("{prefix}_{name} {value}"))
            .chain(
                self.gauges
                    .iter()
                    .map(|(name, value)| format!("{prefix}_{name} {value}")),
            )
            .collect();
        lines.sort();

        let mut output = lines.join("\n");
        if !output.is_empty() {
            output.push('\n');
        }
        output
    }
}

/// The lifecycle contract every gateway module implements.
///
/// # Lifecycle
///
/// 1. `manifest()` - Called to discover the module
/// 2. `init()` - Initialize with configuration
/// 3. `start()` - Begin processing
/// 4. `status()` / `metrics()` - Ongoing monitoring
/// 5. `reload()` - Apply new configuration (optional)
/// 6. `stop()` - Graceful shutdown
pub trait ModuleContract: Send + Sync {
    /// Returns the module's manifest.
    fn manifest(&self) -> ModuleManifest;

    /// Initializes the module with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::ConfigError` if the configuration is invalid.
    /// Returns `ModuleError::InvalidState` if the module is not stopped.
    fn init(&mut self, config: ModuleConfig) -> ModuleResult<()>;

    /// Starts the module's processing.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::InvalidState` if called before `init()`.
    fn start(&mut self) -> ModuleResult<()>;

    /// Stops the module.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::InvalidState` if the module is not running.
    fn stop(&mut self) -> ModuleResult<()>;

    /// Reloads the module's configuration.
    ///
    /// The default implementation reports that hot reload is unsupported.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::ConfigError` if the new configuration is invalid.
    fn reload(&mut self, _config: ModuleConfig) -> ModuleResult<()> {
        Err(ModuleError::ConfigError(
            "hot reload not supported".to_string(),
        ))
    }

    /// Returns the current status of the module.
    fn status(&self) -> ModuleStatus;

    /// Returns the current metrics from the module.
    fn metrics(&self) -> MetricsPayload;

    /// Called periodically for liveness checks.
    fn heartbeat(&self) -> bool {
        self.status().is_operational()
    }
}
