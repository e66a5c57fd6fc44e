//! # DeskPilot Action Registry
//!
//! Catalog of named automation actions. Each entry pairs a unique name with a
//! free-text description (embedded for retrieval) and an optional ordered list
//! of parameter names.
//!
//! The registry preserves registration order: downstream keyword matching is
//! first-match-wins, so iteration order is part of the contract.

mod error;
mod registry;

pub use error::{RegistryError, Result};
pub use registry::{ActionDescriptor, ActionRegistry};
