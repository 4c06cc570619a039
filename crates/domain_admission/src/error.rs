//! Account assurance errors

use std::time::Duration;
use thiserror::Error;

use core_kernel::{EpisodeId, PortError};

/// Errors that can occur while assuring an episode's billing account
///
/// A settlement refusal is not an error; it is reported as
/// `AssuranceResult::Failed`.
#[derive(Debug, Error)]
pub enum AssuranceError {
    /// Required input missing or malformed; raised before any storage access
    #[error("Validation error: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The episode does not exist
    #[error("Hospitalization episode not found: {0}")]
    EpisodeNotFound(EpisodeId),

    /// Storage or procedure fault; the transaction was rolled back
    #[error("Account assurance failed")]
    OperationFailed {
        #[source]
        source: PortError,
    },

    /// The transaction exceeded its time budget and was rolled back
    #[error("Account assurance timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),
}

impl AssuranceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AssuranceError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn storage(source: PortError) -> Self {
        AssuranceError::OperationFailed { source }
    }

    /// Returns true if the caller's input caused the error
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AssuranceError::Validation { .. } | AssuranceError::EpisodeNotFound(_)
        )
    }
}
