use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Action '{0}' is already registered")]
    DuplicateName(String),

    #[error("Action name must not be empty")]
    EmptyName,
}
