use thiserror::Error;

/// Failures of a single labeling invocation.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("malformed storage event: {0}")]
    InvalidEvent(String),

    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("{service} denied access: {message}")]
    PermissionDenied {
        service: &'static str,
        message: String,
    },

    #[error("object {bucket}/{key} cannot be read in its current state: {reason}")]
    Unavailable {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("object {bucket}/{key} is not a usable image: {reason}")]
    Decode {
        bucket: String,
        key: String,
        reason: String,
    },

    #[error("image rejected by label detection: {0}")]
    InvalidImage(String),

    #[error("label detection quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("{service} request failed: {message}")]
    Transient {
        service: &'static str,
        message: String,
    },

    #[error("invocation deadline reached before {bucket}/{key} was labeled")]
    DeadlineExceeded { bucket: String, key: String },
}

impl LabelError {
    /// Whether redelivering the same event could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LabelError::QuotaExceeded(_)
                | LabelError::Transient { .. }
                | LabelError::DeadlineExceeded { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LabelError::InvalidEvent(_) => "invalid_event",
            LabelError::NotFound { .. } => "not_found",
            LabelError::PermissionDenied { .. } => "permission_denied",
            LabelError::Unavailable { .. } => "unavailable",
            LabelError::Decode { .. } => "decode",
            LabelError::InvalidImage(_) => "invalid_image",
            LabelError::QuotaExceeded(_) => "quota_exceeded",
            LabelError::Transient { .. } => "transient",
            LabelError::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }
}

/// Invalid handler configuration, reported at cold start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be an integer, got {value:?}")]
    NotANumber { var: &'static str, value: String },

    #[error("{var} must be at least {min}, got {value}")]
    OutOfRange {
        var: &'static str,
        value: u64,
        min: u64,
    },
}
