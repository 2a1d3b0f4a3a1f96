//! Scenario error types.

use thiserror::Error;

/// Errors raised while running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// A step's wish failed where the step expected success.
    #[error("step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    /// A step ran but did not meet its assertion.
    #[error("assertion failed in step '{step}': {message}")]
    AssertionFailed { step: String, message: String },

    /// A step referred to a variable no earlier step produced.
    #[error("step '{step}' needs variable '{name}', which no earlier step produced")]
    UnknownVariable { step: String, name: String },
}

impl ScenarioError {
    pub fn step_failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepFailed {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn assertion_failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn unknown_variable(step: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownVariable {
            step: step.into(),
            name: name.into(),
        }
    }
}

/// Result type for scenarios.
pub type ScenarioResult<T> = Result<T, ScenarioError>;
