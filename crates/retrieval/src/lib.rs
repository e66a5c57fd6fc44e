//! # DeskPilot Retrieval
//!
//! Maps free-text prompts onto registered automation actions.
//!
//! ## Features
//!
//! - **Keyword matching**: action names hit directly, underscores treated
//!   as spaces
//! - **Semantic fallback**: nearest-neighbor search over description
//!   embeddings
//! - **Context carry-over**: anaphoric prompts ("do it again") reuse the
//!   previous prompt
//! - **Parameter inference**: per-action rules fill in argument values from
//!   the prompt
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │              RetrievalService              │
//! │  (registry + embedding index + rebuilds)   │
//! └─────────┬─────────────────────┬────────────┘
//!           │                     │
//!    ┌──────▼──────┐       ┌──────▼──────┐
//!    │   engine    │       │ ActionIndex │
//!    │  (keyword,  │       │ (embedding  │
//!    │  anaphora)  │       │   search)   │
//!    └─────────────┘       └─────────────┘
//! ```

mod engine;
mod error;
mod history;
mod params;
mod service;

pub use engine::{augment_with_context, has_context_marker, keyword_match};
pub use error::{Result, RetrievalError};
pub use history::{ConversationEntry, ConversationHistory};
pub use params::infer_params;
pub use service::RetrievalService;
