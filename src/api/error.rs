//! Typed errors for PidginHost API calls

use thiserror::Error;

/// Error taxonomy for API interactions.
///
/// Mutating modules rely on the distinction between `NotFound` (often an
/// idempotent no-op) and the fatal variants, so the HTTP layer maps status
/// codes here instead of collapsing everything into one failure.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401/403 - bad or missing token. Never retried.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// 404 - the target resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Other 4xx, or a client-side parameter problem detected before any
    /// network call. Carries the provider error body when one was returned.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A name resolved to more than one resource under a uniqueness policy.
    #[error("ambiguous resource: {0}")]
    Ambiguous(String),

    /// 5xx from the provider.
    #[error("provider error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Connection failure or timeout below the HTTP layer.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl ApiError {
    /// Map a non-success HTTP status and its (already sanitized) body.
    pub fn from_status(status: u16, body: &str, url: &str) -> Self {
        match status {
            401 | 403 => ApiError::Auth(format!("{} ({})", body, url)),
            404 => ApiError::NotFound(url.to_string()),
            400..=499 => ApiError::Validation(format!("{} ({})", body, url)),
            _ => ApiError::Server {
                status,
                message: format!("{} ({})", body, url),
            },
        }
    }

    /// True for the variants a locator treats as "absent" rather than fatal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}
