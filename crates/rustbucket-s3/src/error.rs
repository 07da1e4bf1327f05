//! Storage backend error types.
//!
//! Backend diagnostics are preserved verbatim: service errors keep the
//! code and message the backend produced, and everything else keeps the
//! SDK's own rendering of the failure. The tool layer wraps these in its
//! `Failed to ...` contexts, so a caller sees both what was attempted and
//! exactly what the backend said.

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

/// Errors returned by an [`ObjectStore`](crate::ObjectStore).
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The backend rejected the call; code and message are verbatim.
    #[error("{code}: {message}")]
    Service {
        /// The backend's error code (e.g. `NoSuchBucket`).
        code: String,
        /// The backend's error message.
        message: String,
    },

    /// The call never produced a backend response (connection, build, or
    /// timeout failure). Carries the SDK's rendered diagnostic.
    #[error("{0}")]
    Transport(String),
}

impl BackendError {
    /// Build a transport error from any displayable cause.
    #[must_use]
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// The backend error code, when the backend reported one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            Self::Transport(_) => None,
        }
    }
}

/// Convert an SDK operation error, keeping the backend's diagnostics.
pub(crate) fn from_sdk_error<E, R>(err: SdkError<E, R>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    match err.as_service_error() {
        Some(service) => BackendError::Service {
            code: service.code().unwrap_or("UnknownError").to_owned(),
            message: service
                .message()
                .map_or_else(|| service.to_string(), ToOwned::to_owned),
        },
        None => BackendError::Transport(format!("{}", DisplayErrorContext(&err))),
    }
}

/// Convenience result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
