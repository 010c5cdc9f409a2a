//! Error types for the neutron-plugin interface
//!
//! This module defines all error types used throughout the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for relation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the neutron-plugin interface
#[derive(Error, Debug)]
pub enum Error {
    /// The relation has no conversation to act on
    #[error("No conversation available on relation {relation}")]
    NoConversation {
        /// Relation name
        relation: String,
    },

    /// More than one conversation could be the current one
    #[error("Cannot pick a single conversation on relation {relation}: {count} candidates")]
    AmbiguousConversation {
        /// Relation name
        relation: String,
        /// Number of candidate conversations
        count: usize,
    },

    /// The RNDC key file could not be read
    #[error("Failed to read key file {}: {source}", path.display())]
    KeyFile {
        /// Path of the key file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed relation-expression pattern
    #[error("Invalid hook pattern: {0}")]
    InvalidPattern(String),

    /// Relation snapshot errors
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a "no conversation" error
    pub fn no_conversation(relation: impl Into<String>) -> Self {
        Self::NoConversation {
            relation: relation.into(),
        }
    }

    /// Create an "ambiguous conversation" error
    pub fn ambiguous_conversation(relation: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousConversation {
            relation: relation.into(),
            count,
        }
    }

    /// Create a key file error
    pub fn key_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::KeyFile {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    /// Create a snapshot error
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
