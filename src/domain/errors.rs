//! Domain errors for the ADA pipeline.

use thiserror::Error;

/// Domain-level errors that can occur in the ADA pipeline.
///
/// Individual subtask failures never surface as a `DomainError`; the
/// coordinator folds them into failed executor outputs. These variants cover
/// the collaborators and services that sit around the pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Executor not found: {0}")]
    ExecutorNotFound(String),

    #[error("Invocation of '{executor}' failed: {reason}")]
    InvocationFailed { executor: String, reason: String },

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Unknown workflow: {name}. Available: {}", .available.join(", "))]
    UnknownWorkflow { name: String, available: Vec<String> },

    #[error("Missing required parameters for {workflow}: {}", .missing.join(", "))]
    MissingParameters { workflow: String, missing: Vec<String> },

    #[error("Invalid rating: {0}. Must be between 1 and 5")]
    InvalidRating(u8),

    #[error("Plan queue is full ({0} plans in flight)")]
    QueueFull(usize),

    #[error("Plan queue is shut down")]
    QueueClosed,

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_workflow_lists_available() {
        let err = DomainError::UnknownWorkflow {
            name: "nope".to_string(),
            available: vec!["analyze-code".to_string(), "create-quiz".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown workflow: nope. Available: analyze-code, create-quiz"
        );
    }

    #[test]
    fn test_missing_parameters_message() {
        let err = DomainError::MissingParameters {
            workflow: "create-quiz".to_string(),
            missing: vec!["topic".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required parameters for create-quiz: topic"
        );
    }

    #[test]
    fn test_from_serde_json() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: DomainError = parse.unwrap_err().into();
        assert!(matches!(err, DomainError::SerializationError(_)));
    }
}
