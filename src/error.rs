use thiserror::Error;

/// Failure reasons of the editing engine.
///
/// None of these reach the user: the public editing operations degrade every
/// failure to a no-op and leave tree and cursor untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("position refers to a detached or missing node")]
    InvalidPosition,
    #[error("operation does not apply here: {0}")]
    UnsupportedContext(&'static str),
    #[error("document invariant violated: {0}")]
    StructuralInconsistency(String),
}

pub type EditResult<T> = Result<T, EditError>;

pub(crate) fn inconsistent(message: impl Into<String>) -> EditError {
    EditError::StructuralInconsistency(message.into())
}
