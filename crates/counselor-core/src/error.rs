//! Error taxonomy for a chat request.
//!
//! Every failure a caller can observe maps to one [`ErrorKind`]. The message
//! carries the upstream detail for operators; callers only need the kind.

/// Errors raised while handling a chat request.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Message is required")]
    EmptyQuery,

    #[error("Unsupported attachment format: {0}")]
    UnsupportedFormat(String),

    #[error("Attachment extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Inference unavailable: {0}")]
    InferenceUnavailable(String),

    #[error("Request deadline of {0:?} exceeded")]
    DeadlineExceeded(std::time::Duration),
}

/// Caller-facing classification of a [`ChatError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    EmptyQuery,
    UnsupportedFormat,
    ExtractionFailed,
    InferenceUnavailable,
    DeadlineExceeded,
}

impl ErrorKind {
    /// Stable upper-case code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "INVALID_REQUEST",
            ErrorKind::EmptyQuery => "EMPTY_QUERY",
            ErrorKind::UnsupportedFormat => "UNSUPPORTED_FORMAT",
            ErrorKind::ExtractionFailed => "EXTRACTION_FAILED",
            ErrorKind::InferenceUnavailable => "INFERENCE_UNAVAILABLE",
            ErrorKind::DeadlineExceeded => "DEADLINE_EXCEEDED",
        }
    }

    /// Whether the caller sent something wrong (as opposed to a server-side failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidRequest | ErrorKind::EmptyQuery | ErrorKind::UnsupportedFormat
        )
    }
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ChatError::EmptyQuery => ErrorKind::EmptyQuery,
            ChatError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            ChatError::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            ChatError::InferenceUnavailable(_) => ErrorKind::InferenceUnavailable,
            ChatError::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChatError::InferenceUnavailable("429 Too Many Requests".into());
        assert_eq!(err.to_string(), "Inference unavailable: 429 Too Many Requests");
        assert_eq!(ChatError::EmptyQuery.to_string(), "Message is required");
    }

    #[test]
    fn test_kind_classification() {
        assert!(ChatError::EmptyQuery.kind().is_client_error());
        assert!(ChatError::UnsupportedFormat("x".into()).kind().is_client_error());
        assert!(!ChatError::ExtractionFailed("x".into()).kind().is_client_error());
        assert!(!ChatError::InferenceUnavailable("x".into()).kind().is_client_error());
        assert_eq!(
            ChatError::DeadlineExceeded(std::time::Duration::from_secs(1)).kind().code(),
            "DEADLINE_EXCEEDED"
        );
    }
}
