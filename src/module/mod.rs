//! # Module Contract
//!
//! Lifecycle contract implemented by every gateway module, including the
//! inspection handler. The contract covers configuration, start/stop,
//! metrics and health reporting.

mod config;
mod contract;
mod error;
mod status;

pub use config::ModuleConfig;
pub use contract::{MetricsPayload, ModuleContract, ModuleManifest};
pub use error::{ModuleError, ModuleResult};
pub use status::ModuleStatus;
