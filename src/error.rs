//! Typed errors surfaced during ingestion
//!
//! Ring-level errors are recoverable: the ring is emptied and parsing goes on.
//! Integrity errors reject the whole document. Both travel inside
//! `anyhow::Error` where they are fatal and can be recovered with
//! `downcast_ref`.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a ring's point list was discarded
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum RingError {
    #[error("Invalid coordinate token '{token}'")]
    InvalidToken { token: String },

    #[error("Non-finite coordinate token '{token}'")]
    NonFinite { token: String },

    #[error("Wrong number of coordinates: {count} is not divisible by 3")]
    CoordinateCount { count: usize },
}

/// Structural integrity failures in otherwise well-formed documents
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("Object '{object}' references vertex {index} but only {vertex_count} vertices exist")]
    VertexIndexOutOfRange {
        object: String,
        index: usize,
        vertex_count: usize,
    },
}

/// A contained failure reported through the dataset's diagnostic channel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Where the problem was found (object id, element path)
    pub context: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ring_error: Option<RingError>,
}

impl Diagnostic {
    pub fn ring(context: impl Into<String>, error: RingError) -> Self {
        Self {
            context: context.into(),
            message: error.to_string(),
            ring_error: Some(error),
        }
    }

    pub fn message(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            message: message.into(),
            ring_error: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}
