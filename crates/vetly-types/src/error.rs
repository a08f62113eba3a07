//! Common error types

use thiserror::Error;

/// Common errors across Vetly
#[derive(Error, Debug)]
pub enum VetlyError {
    /// Unknown subscription record status in stored data
    #[error("invalid subscription status: {0}")]
    InvalidStatus(String),

    /// Malformed identifier
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}
