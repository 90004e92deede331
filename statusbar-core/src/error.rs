//! Error types for upstream fetches

use thiserror::Error;

/// Errors raised while signing, sending or decoding an upstream request
///
/// Everything except `SigningPrecondition` is a soft failure: the poller logs
/// it, keeps the previous value and waits for the next tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Signing precondition violated: {0}")]
    SigningPrecondition(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn signing(msg: impl Into<String>) -> Self {
        FetchError::SigningPrecondition(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        FetchError::Transport(msg.into())
    }

    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        FetchError::HttpStatus {
            status,
            body: body.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        FetchError::Decode(msg.into())
    }

    /// Whether the polling loop should shrug this off and try again next tick
    pub fn is_soft(&self) -> bool {
        !matches!(self, FetchError::SigningPrecondition(_))
    }
}

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_errors_are_not_soft() {
        assert!(!FetchError::signing("empty secret").is_soft());
        assert!(FetchError::transport("connection refused").is_soft());
        assert!(FetchError::http_status(500, "oops").is_soft());
        assert!(FetchError::decode("eof").is_soft());
    }

    #[test]
    fn test_http_status_display() {
        let err = FetchError::http_status(401, "bad signature");
        assert_eq!(err.to_string(), "HTTP status 401: bad signature");
    }
}
