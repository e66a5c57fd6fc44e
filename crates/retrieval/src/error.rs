use thiserror::Error;

pub type Result<T> = std::result::Result<T, RetrievalError>;

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("Registry error: {0}")]
    Registry(#[from] deskpilot_registry::RegistryError),

    #[error("Index error: {0}")]
    Index(#[from] deskpilot_vector_index::VectorIndexError),
}
