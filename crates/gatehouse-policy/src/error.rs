//! Policy subsystem errors.

use std::time::Duration;

use thiserror::Error;

use gatehouse_core::error::{AppError, ErrorKind};

/// Errors raised while compiling a model or evaluating a decision.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The model file could not be read.
    #[error("Failed to read model file `{path}`")]
    ModelRead {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The model text is structurally invalid.
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The matcher expression failed to parse or references unknown names.
    #[error("Invalid matcher expression: {0}")]
    InvalidMatcher(String),

    /// The policy effect expression is not one of the supported forms.
    #[error("Unsupported policy effect `{0}`")]
    UnsupportedEffect(String),

    /// A rule does not fit the model's definitions.
    #[error("Invalid policy rule: {0}")]
    InvalidRule(String),

    /// The request tuple has the wrong number of values.
    #[error("Request has {actual} values but the model defines {expected}")]
    RequestArity {
        /// Number of request fields in the model.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// Matcher evaluation hit a type mismatch.
    #[error("Matcher evaluation failed: {0}")]
    Evaluation(String),

    /// Loading rules from the store did not finish in time.
    #[error("Policy load timed out after {0:?}")]
    LoadTimeout(Duration),
}

impl PolicyError {
    /// Whether this error describes a defective model rather than a runtime failure.
    pub fn is_model_defect(&self) -> bool {
        matches!(
            self,
            Self::ModelRead { .. }
                | Self::InvalidModel(_)
                | Self::InvalidMatcher(_)
                | Self::UnsupportedEffect(_)
        )
    }
}

impl From<PolicyError> for AppError {
    fn from(err: PolicyError) -> Self {
        let kind = if err.is_model_defect() {
            ErrorKind::Initialization
        } else {
            ErrorKind::Enforcement
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}
