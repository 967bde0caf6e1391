use thiserror::Error;

/// Errors raised while touching project files
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path escapes the project root: {0}")]
    OutsideRoot(String),
}
