//! Compiler error types.

use crate::Command;
use std::fmt;
use thiserror::Error;
use wish_core::AnyId;

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// A command that could not be placed, with what it was waiting for.
#[derive(Debug, Clone, PartialEq)]
pub struct Stranded {
    pub command: Command,
    pub unmet: Vec<AnyId>,
}

impl fmt::Display for Stranded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (waiting for", self.command)?;
        for (i, id) in self.unmet.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{}", sep, id)?;
        }
        write!(f, ")")
    }
}

fn list_stranded(stranded: &[Stranded]) -> String {
    stranded
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that abort a resolution call. Nothing is committed after any of them.
#[derive(Debug, Error)]
pub enum CompileError {
    /// An input item has a shape no handler accepts.
    #[error("Shape error: {message}")]
    Shape { message: String },

    /// Some commands can never be ordered.
    #[error("Dependency error: {}", list_stranded(.stranded))]
    Dependency { stranded: Vec<Stranded> },

    /// Commands contradict each other or the current graph.
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
        commands: Vec<Command>,
    },
}

impl CompileError {
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }

    pub fn dependency(stranded: Vec<Stranded>) -> Self {
        Self::Dependency { stranded }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            commands: Vec::new(),
        }
    }

    pub fn contradiction(message: impl Into<String>, a: &Command, b: &Command) -> Self {
        Self::Conflict {
            message: message.into(),
            commands: vec![a.clone(), b.clone()],
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape { .. })
    }

    pub fn is_dependency(&self) -> bool {
        matches!(self, Self::Dependency { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
