use std::fmt::{self, Display};

/// Errors produced by model constructors and conversions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnknownMediaType(String),
    UnknownRelationKind(String),
    InvalidMedia(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownMediaType(tag) => {
                write!(f, "unknown media type: {tag}")
            }
            ModelError::UnknownRelationKind(tag) => {
                write!(f, "unknown relation kind: {tag}")
            }
            ModelError::InvalidMedia(msg) => write!(f, "invalid media: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
