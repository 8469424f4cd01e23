//! Inspection configuration types

use crate::config::{Validate, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};

/// Main inspection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionConfig {
    /// Whether new transactions are inspected at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Space-separated rule ids whose interventions bypass the transaction
    #[serde(default)]
    pub ignore_rules: String,

    /// Run the logging phase even for bypassed transactions
    #[serde(default)]
    pub force_log: bool,

    /// Audit log of finished transactions
    #[serde(default)]
    pub audit: AuditConfig,
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    1000
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ignore_rules: String::new(),
            force_log: false,
            audit: AuditConfig::default(),
        }
    }
}

/// Audit log configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether blocked and bypassed transactions are recorded
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entries kept before the oldest is dropped
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Also record transactions that passed untouched
    #[serde(default)]
    pub include_clean: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            include_clean: false,
        }
    }
}

impl Validate for InspectionConfig {
    fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Rule ids are numeric; empty tokens from repeated spaces are tolerated
        for token in self.ignore_rules.split(' ').filter(|t| !t.is_empty()) {
            if !token.bytes().all(|b| b.is_ascii_digit()) {
                result.add_error(ValidationError::new(
                    "ignore_rules",
                    format!("'{token}' is not a numeric rule id"),
                ));
            }
        }

        if self.audit.max_entries == 0 {
            result.add_error(ValidationError::new(
                "audit.max_entries",
                "must be greater than zero",
            ));
        }

        result
    }
}
