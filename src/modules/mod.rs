//! # Gateway Modules
//!
//! Built-in modules. Each implements the [`crate::module::ModuleContract`]
//! trait for uniform lifecycle management.
//!
//! ## Available Modules
//!
//! - [`inspection`] - HTTP transaction inspection through an external rule engine

pub mod inspection;
