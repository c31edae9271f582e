//! Errors raised by readers and the execution context.

use super::state::StreamState;

/// ErrorKind groups `ReaderError` variants by who has to react.
///
/// - Configuration: the assembly layer wired the reader wrong; do not open it.
/// - Usage: a lifecycle call arrived in the wrong state.
/// - Context: the checkpoint store holds a value of an unexpected kind or range.
/// - Source: the concrete source failed (I/O, decoding, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Usage,
    Context,
    Source,
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("{component}: missing required collaborator '{collaborator}'")]
    MissingCollaborator {
        component: &'static str,
        collaborator: &'static str,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("delegate is already set and cannot be rebound")]
    DelegateAlreadySet,

    #[error("cannot {operation} while reader is {state:?}")]
    IllegalState {
        operation: &'static str,
        state: StreamState,
    },

    #[error("context key '{key}' holds a {found} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("context key '{key}' holds an unusable checkpoint: {reason}")]
    InvalidCheckpoint { key: String, reason: String },

    #[error("source failure: {0}")]
    Source(String),
}

impl ReaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReaderError::MissingCollaborator { .. }
            | ReaderError::InvalidConfiguration(_)
            | ReaderError::DelegateAlreadySet => ErrorKind::Configuration,
            ReaderError::IllegalState { .. } => ErrorKind::Usage,
            ReaderError::TypeMismatch { .. } | ReaderError::InvalidCheckpoint { .. } => {
                ErrorKind::Context
            }
            ReaderError::Source(_) => ErrorKind::Source,
        }
    }

    /// Shorthand for a lifecycle violation.
    pub fn illegal_state(operation: &'static str, state: StreamState) -> Self {
        tracing::warn!(operation, ?state, "reader used outside its lifecycle");
        ReaderError::IllegalState { operation, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::missing(
        ReaderError::MissingCollaborator { component: "c", collaborator: "delegate" },
        ErrorKind::Configuration
    )]
    #[case::invalid(ReaderError::InvalidConfiguration("x".into()), ErrorKind::Configuration)]
    #[case::rebind(ReaderError::DelegateAlreadySet, ErrorKind::Configuration)]
    #[case::usage(
        ReaderError::IllegalState { operation: "read", state: StreamState::Closed },
        ErrorKind::Usage
    )]
    #[case::mismatch(
        ReaderError::TypeMismatch { key: "k".into(), expected: "long", found: "string" },
        ErrorKind::Context
    )]
    #[case::checkpoint(
        ReaderError::InvalidCheckpoint { key: "k".into(), reason: "negative".into() },
        ErrorKind::Context
    )]
    #[case::source(ReaderError::Source("boom".into()), ErrorKind::Source)]
    fn kind_classifies_variants(#[case] err: ReaderError, #[case] kind: ErrorKind) {
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn missing_collaborator_message_names_the_collaborator() {
        let err = ReaderError::MissingCollaborator {
            component: "DelegatingItemReader",
            collaborator: "delegate",
        };
        assert_eq!(
            err.to_string(),
            "DelegatingItemReader: missing required collaborator 'delegate'"
        );
    }
}
