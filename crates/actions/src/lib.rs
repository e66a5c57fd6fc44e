//! # DeskPilot Actions
//!
//! The built-in desktop automation catalog and its executor.
//!
//! ## Features
//!
//! - **Catalog**: application launchers, system monitors, shell and file
//!   helpers, each with the description the retrieval index embeds
//! - **Runner**: executes a catalog action by name with positional
//!   arguments, validating arity first
//!
//! Actions registered over the API extend the retrieval catalog but have
//! no executable body here; running one reports an unknown action.

mod catalog;
mod error;
mod runner;

pub use catalog::builtin_catalog;
pub use error::{ActionError, Result};
pub use runner::{run_action, ActionReport};
