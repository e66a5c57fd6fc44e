//! # DeskPilot Vector Index
//!
//! Embedding-based retrieval over action descriptions.
//!
//! ## Features
//!
//! - **Sentence embeddings** via ONNX Runtime (MiniLM-class model, CPU)
//! - **Deterministic stub encoder** for tests and offline runs
//! - **Exact 1-nearest-neighbor** search by squared L2 distance
//! - **Full rebuilds** that keep vectors and action names positionally aligned
//!
//! ## Architecture
//!
//! ```text
//! [(name, description)]
//!     │
//!     ├──> Encoder (ONNX / stub)
//!     │      └─> Vector[384]
//!     │
//!     └──> NearestNeighborIndex (flat L2)
//!            └─> position ──> name
//! ```
//!
//! The index is rebuilt from scratch on every catalog change; there is no
//! incremental insert, so stored positions can never drift from the ordered
//! name list.

mod action_index;
mod encoder;
mod error;
mod flat_index;

pub use action_index::ActionIndex;
pub use encoder::{
    build_encoder, cosine_similarity, encoder_from_env, model_dir, Encoder, EncoderMode,
    OrtEncoder, StubEncoder, MODEL_DIMENSION,
};
pub use error::{Result, VectorIndexError};
pub use flat_index::{FlatL2Index, NearestNeighborIndex};
