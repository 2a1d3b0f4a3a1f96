//! Engine error types.

use crate::{AttributeType, EternalUid, GraphUid};
use thiserror::Error;

/// Errors raised by storage-engine primitives.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Record not found.
    #[error("Record not found: {0}")]
    NotFound(EternalUid),

    /// A record with this uid is already alive.
    #[error("Record already exists: {0}")]
    AlreadyExists(EternalUid),

    /// An explicit origin uid belongs to another graph.
    #[error("Cannot create {uid} on graph {graph}: origin belongs to another graph")]
    ForeignOrigin { uid: EternalUid, graph: GraphUid },

    /// A relation endpoint lives on another graph.
    #[error("Relation endpoint {uid} is not on graph {graph}")]
    CrossGraph { uid: EternalUid, graph: GraphUid },

    /// Only attributes hold values.
    #[error("Cannot assign a value to {0}: not an attribute")]
    NotAnAttribute(EternalUid),

    /// Type mismatch in assignment.
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: AttributeType,
        actual: &'static str,
    },

    /// Value nodes and delegates are never removed.
    #[error("Cannot remove {0}: content-addressed records are immutable")]
    Immutable(EternalUid),

    /// Invalid operation.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Result type for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Error parsing the text form of an identity.
#[derive(Debug, Error)]
#[error("Invalid id {input:?}: {reason}")]
pub struct ParseIdError {
    pub input: String,
    pub reason: String,
}

impl ParseIdError {
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
