//! # Configuration System
//!
//! TOML-based configuration loading for the inspection bridge.
//!
//! ## Example Configuration
//!
//! ```toml
//! enabled = true
//! ignore_rules = "920350 942100"
//! force_log = false
//!
//! [audit]
//! enabled = true
//! max_entries = 1000
//! ```

mod error;
mod loader;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::{Validate, ValidationError, ValidationResult};
