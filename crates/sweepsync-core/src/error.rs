//! Error types for the pure core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown run state: {0}")]
    InvalidRunState(String),

    #[error("malformed status payload: {0}")]
    MalformedStatus(String),
}
