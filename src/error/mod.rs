//! Error module orchestrator.
//!
//! Downstream code imports the crate-wide error and result types from here
//! while the definitions live in the private `types` module.

mod types;

pub use types::{Result, RouterError};
