use std::io;

use thiserror::Error;

use crate::ids::ElementKind;

/// Errors raised while building or loading an ADM document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid {kind} id '{text}'")]
    InvalidId { kind: ElementKind, text: String },
    #[error("invalid time value '{0}': expected nanoseconds or hh:mm:ss.fffff")]
    InvalidTime(String),
    #[error("duplicate {kind} '{id}'")]
    Duplicate { kind: ElementKind, id: String },
    #[error("{kind} '{id}' not found")]
    NotFound { kind: ElementKind, id: String },
    #[error("io error while loading scene: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse scene: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
