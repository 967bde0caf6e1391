//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] tandem_parser::ParseError),

    #[error("Transform error: {0}")]
    Transform(#[from] crate::mutations::TransformError),
}
