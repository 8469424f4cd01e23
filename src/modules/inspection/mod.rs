//! HTTP Transaction Inspection Module
//!
//! Drives each HTTP transaction through an external rule engine and decides
//! whether the engine's interventions are honoured:
//! - Ordered phase calls from connection to logging
//! - Deterministic release of engine contexts and marshalled buffers
//! - Rule id recovery from intervention logs
//! - Ignore lists that bypass the rest of a transaction
//! - Audit log and lifecycle management through [`crate::module::ModuleContract`]

mod audit;
mod buffer;
mod config;
mod engine;
mod error;
mod handler;
mod intervention;
mod phase;
mod policy;
mod transaction;

#[cfg(test)]
mod testing;

pub use audit::{AuditEntry, AuditLog};
pub use buffer::{ResourceTracker, TrackedBuffer};
pub use config::{AuditConfig, InspectionConfig};
pub use engine::{EngineFault, EngineStatus, InspectionEngine, Intervention};
pub use error::{InspectionError, InspectionResult};
pub use handler::{InspectionHandler, InspectionStats};
pub use intervention::{
    extract_rule_id, InterventionLogError, InterventionOutcome, UNKNOWN_RULE_ID,
};
pub use phase::Phase;
pub use policy::{is_ignored, IgnorePolicy};
pub use transaction::Transaction;
