use thiserror::Error;

pub type Result<T> = std::result::Result<T, ActionError>;

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Unknown action '{0}'")]
    UnknownAction(String),

    #[error("Action '{action}' expects {expected} argument(s), got {given}")]
    WrongArity {
        action: String,
        expected: usize,
        given: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
