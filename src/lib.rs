//! # R0N Inspection
//!
//! Transaction bridge between the R0N gateway and an external HTTP
//! inspection engine.
//!
//! ## Features
//!
//! - Ordered phase driver (connection, URI, headers, bodies, logging)
//! - Deterministic release of every buffer handed to the engine
//! - Intervention evaluation with rule id recovery from engine logs
//! - Ignore lists that bypass the remainder of a transaction
//! - Bounded audit log of blocked and bypassed transactions
//!
//! ## Architecture
//!
//! The engine is an opaque collaborator behind the
//! [`modules::inspection::InspectionEngine`] trait. Each HTTP request is
//! represented by a [`modules::inspection::Transaction`] that owns the
//! engine's per-transaction context. The
//! [`modules::inspection::InspectionHandler`] implements the
//! [`module::ModuleContract`] trait for uniform lifecycle management.

pub mod config;
pub mod module;
pub mod modules;
