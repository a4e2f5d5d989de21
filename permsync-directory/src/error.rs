// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Errors surfaced by directory clients.
///
/// Concrete clients map their transport failures onto these variants. Callers only ever
/// distinguish "not found" from everything else, the remaining variants exist for diagnostics.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("credential was rejected by the code host")]
    Unauthorized,

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected response status {status}: {message}")]
    Http { status: u16, message: String },

    /// The request was cancelled or timed out before a response arrived.
    #[error("request cancelled: {0}")]
    Cancelled(String),

    #[error("{0}")]
    Other(String),
}

impl DirectoryError {
    /// Returns `true` if the code host reported the requested resource as absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            DirectoryError::NotFound(_) => true,
            DirectoryError::Http { status, .. } => *status == 404,
            _ => false,
        }
    }
}
