//! Error types for mail operations

use std::fmt;

use thiserror::Error;

/// The kind of entity a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Folder,
    Message,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Folder => f.write_str("Folder"),
            Entity::Message => f.write_str("Message"),
        }
    }
}

/// Errors surfaced by backends and the result pipeline
///
/// Lookup errors propagate unchanged through search, sort and pagination.
#[derive(Debug, Error)]
pub enum MailError {
    /// Unknown folder path or message id
    #[error("{entity} '{id}' not found")]
    NotFound { entity: Entity, id: String },

    /// Bad sort field or direction, page size, backend selector or filter combination
    #[error("{0}")]
    InvalidArgument(String),

    /// The streaming resource guard tripped
    #[error("{resource} limit exceeded: {observed:.1} > {limit:.1}")]
    ResourceExceeded {
        resource: &'static str,
        observed: f64,
        limit: f64,
    },

    /// Malformed message or folder construction
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem failure in the live adapter
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MailError {
    pub fn folder_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            entity: Entity::Folder,
            id: path.into(),
        }
    }

    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: Entity::Message,
            id: id.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias using [`MailError`]
pub type Result<T> = std::result::Result<T, MailError>;
