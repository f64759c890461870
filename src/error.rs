//! @acp:module "Errors"
//! @acp:summary "Library error type and result alias"
//! @acp:domain metadata
//! @acp:layer model

use std::path::PathBuf;

use thiserror::Error;

/// @acp:summary "Errors raised while resolving class metadata"
#[derive(Debug, Error)]
pub enum MetaError {
    /// The class is unknown to the reflector
    #[error("Class \"{0}\" does not exist or cannot be introspected")]
    ClassNotFound(String),

    /// A doc-comment was bound to a name missing from the class constant table
    #[error("Could not find the constant on the class \"{class}\" based on the name \"{constant}\"")]
    ConstantMismatch { class: String, constant: String },

    /// Malformed annotation syntax, or a payload the requested kind rejects
    #[error("Annotation error in {context}: {message}")]
    Annotation { context: String, message: String },

    /// Cache backend failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source file could not be read
    #[error("Failed to read {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MetaError {
    pub(crate) fn annotation(context: impl Into<String>, message: impl Into<String>) -> Self {
        MetaError::Annotation {
            context: context.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetaError>;
