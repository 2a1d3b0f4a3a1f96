//! Transaction error types.

use thiserror::Error;
use wish_compiler::CompileError;
use wish_core::{AnyId, GraphError, SliceMarker};

/// Errors from resolving or applying a wish.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Interpretation, preparation, recombination, culling or ordering failed.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// The graph moved on since the batch was compiled.
    #[error("stale slice: planned against {planned}, graph is at {current}")]
    StaleSlice {
        planned: SliceMarker,
        current: SliceMarker,
    },

    /// A storage primitive failed; the transaction was rolled back.
    #[error("engine error: {0}")]
    Engine(#[from] GraphError),

    /// A command contradicted the graph while executing.
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// A command referred to an identity no earlier command or the graph provides.
    #[error("{0} is not bound to a record")]
    Unbound(AnyId),

    /// A template named an identity the receipt does not hold.
    #[error("{0} is not in the receipt")]
    MissingFromReceipt(AnyId),

    /// A wire message could not be read or written.
    #[error("wire error: {0}")]
    Wire(#[from] serde_json::Error),

    /// The batch holds a command the executor does not run.
    #[error("unexpected command in batch: {0}")]
    UnexpectedCommand(String),
}

impl TransactionError {
    pub fn stale(planned: SliceMarker, current: SliceMarker) -> Self {
        Self::StaleSlice { planned, current }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleSlice { .. })
    }

    pub fn is_engine(&self) -> bool {
        matches!(self, Self::Engine(_))
    }

    /// Returns true for conflicts found while compiling or while executing.
    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Compile(err) => err.is_conflict(),
            _ => false,
        }
    }

    pub fn compile_error(&self) -> Option<&CompileError> {
        match self {
            Self::Compile(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
