use thiserror::Error;

/// Rejection raised by the progress transformations.
///
/// Inputs are never clamped into range: a bad value would corrupt the running
/// means, so the caller gets this error and the record stays as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressError {
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl ProgressError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInput { field, .. } => field,
        }
    }
}

pub type ProgressResult<T> = Result<T, ProgressError>;
