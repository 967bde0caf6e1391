//! Error types for the workspace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: tandem_parser::ParseError,
    },

    #[error("Editor error: {0}")]
    Editor(#[from] tandem_editor::EditorError),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to write {0}")]
    WriteFailed(String),

    #[error("Commit task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type StateResult<T> = Result<T, StateError>;
