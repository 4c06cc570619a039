//! Core error types used across the system

use thiserror::Error;
use crate::identifiers::IdentifierError;

/// Core error type for the kernel
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// A configured value could not be interpreted
    #[error("Configuration error: {0}")]
    Configuration(String),
}
