use thiserror::Error;

/// Errors surfaced by every caller-facing operation.
///
/// `NotFound` is also returned when the caller is not allowed to see the resource at all,
/// so that the existence of a record is never confirmed to someone who cannot read it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(
        "Insufficient allocation: collaboration '{collaboration}' has no remaining quota on platform '{platform}'"
    )]
    QuotaExhausted {
        collaboration: String,
        platform: String,
    },
    #[error("Usage on platform '{platform}' must be reported in '{expected}', got '{actual}'")]
    UnitMismatch {
        platform: String,
        expected: String,
        actual: String,
    },
    #[error(
        "Provider '{provider}' cannot act on platform '{platform}' (allowed platforms: {})",
        format_allowed(.allowed)
    )]
    PlatformMismatch {
        provider: String,
        platform: String,
        allowed: Vec<String>,
    },
    #[error("Invalid {kind} status transition: {from} -> {to}")]
    InvalidTransition {
        kind: &'static str,
        from: String,
        to: String,
    },
    #[error("Upstream service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Invalid credential")]
    Unauthenticated,
    #[error("Validation error: {0}")]
    Validation(String),
}

fn format_allowed(allowed: &[String]) -> String {
    if allowed.is_empty() {
        "none".to_string()
    } else {
        allowed.join(", ")
    }
}

impl CoreError {
    pub fn not_found<T: ToString>(kind: &'static str, id: T) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn forbidden<T: Into<String>>(reason: T) -> Self {
        CoreError::Forbidden(reason.into())
    }

    pub fn validation<T: Into<String>>(reason: T) -> Self {
        CoreError::Validation(reason.into())
    }

    /// Only failures of the identity resolver or of the record store may succeed when retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::UpstreamUnavailable(_))
    }
}

pub fn validation_error<T>(message: String) -> crate::Result<T> {
    Err(CoreError::Validation(message))
}
