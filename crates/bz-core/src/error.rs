//! # ClientError
//!
//! Every call that crosses the backend boundary resolves to `Ok` or to one of
//! these. Callers branch on [`ErrorKind`], never on message text.

use thiserror::Error;

/// Coarse classification used by views to pick a placeholder or notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    /// Any other failure the backend reported in its envelope.
    Rejected,
    /// Malformed body or the network call itself failed.
    Transport,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Missing, invalid or expired credential (HTTP 401).
    #[error("{}", or_default(.message, "Unauthorized"))]
    Unauthenticated { message: String, code: Option<String> },

    #[error("{}", or_default(.message, "Forbidden"))]
    Forbidden { message: String },

    #[error("{}", or_default(.message, "Not found"))]
    NotFound { message: String },

    /// Input rejected. `status` is `None` when the check ran locally and no
    /// request was sent.
    #[error("{}", or_default(.message, "Invalid input"))]
    Validation {
        field: Option<String>,
        message: String,
        status: Option<u16>,
    },

    #[error("{}", or_default(.message, "Conflict"))]
    Conflict { message: String },

    #[error("{}", or_default(.message, default_message(.status)))]
    Rejected {
        message: String,
        status: u16,
        code: Option<String>,
    },

    #[error("{message}")]
    Transport { message: String, status: Option<u16> },
}

impl ClientError {
    /// A client-side check failed before anything was sent.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Validation {
            field: Some(field.into()),
            message: message.into(),
            status: None,
        }
    }

    pub fn transport(message: impl Into<String>, status: Option<u16>) -> Self {
        ClientError::Transport {
            message: message.into(),
            status,
        }
    }

    /// Classifies a failure the backend reported. HTTP status wins over the
    /// backend's error code. A missing message is kept empty so views can
    /// fall back to their own wording.
    pub fn from_backend(status: u16, code: Option<String>, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .unwrap_or_default();

        let tag = code.clone().unwrap_or_default();
        match (status, tag.as_str()) {
            (401, _) | (_, "unauthorized" | "invalid_token" | "expired_token") => {
                ClientError::Unauthenticated { message, code }
            }
            (403, _) | (_, "forbidden") => ClientError::Forbidden { message },
            (404, _) | (_, "not_found") => ClientError::NotFound { message },
            (409, _) | (_, "exists") => ClientError::Conflict { message },
            (422, _) | (_, "validation_failed") => ClientError::Validation {
                field: None,
                message,
                status: Some(status),
            },
            _ => ClientError::Rejected {
                message,
                status,
                code,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            ClientError::Forbidden { .. } => ErrorKind::Forbidden,
            ClientError::NotFound { .. } => ErrorKind::NotFound,
            ClientError::Validation { .. } => ErrorKind::Validation,
            ClientError::Conflict { .. } => ErrorKind::Conflict,
            ClientError::Rejected { .. } => ErrorKind::Rejected,
            ClientError::Transport { .. } => ErrorKind::Transport,
        }
    }

    /// Human-readable text, with a generic default when the backend sent none.
    pub fn message(&self) -> &str {
        match self {
            ClientError::Unauthenticated { message, .. } => or_default(message, "Unauthorized"),
            ClientError::Forbidden { message } => or_default(message, "Forbidden"),
            ClientError::NotFound { message } => or_default(message, "Not found"),
            ClientError::Validation { message, .. } => or_default(message, "Invalid input"),
            ClientError::Conflict { message } => or_default(message, "Conflict"),
            ClientError::Rejected { message, status, .. } => {
                or_default(message, default_message(status))
            }
            ClientError::Transport { message, .. } => message,
        }
    }

    /// Text the backend reported with a domain failure, if it sent any.
    pub fn backend_message(&self) -> Option<&str> {
        if !self.is_domain() {
            return None;
        }
        match self {
            ClientError::Unauthenticated { message, .. }
            | ClientError::Forbidden { message }
            | ClientError::NotFound { message }
            | ClientError::Validation { message, .. }
            | ClientError::Conflict { message }
            | ClientError::Rejected { message, .. } => {
                Some(message.as_str()).filter(|m| !m.is_empty())
            }
            ClientError::Transport { .. } => None,
        }
    }

    /// HTTP status the failure came with, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthenticated { .. } => Some(401),
            ClientError::Forbidden { .. } => Some(403),
            ClientError::NotFound { .. } => Some(404),
            ClientError::Conflict { .. } => Some(409),
            ClientError::Validation { status, .. } | ClientError::Transport { status, .. } => {
                *status
            }
            ClientError::Rejected { status, .. } => Some(*status),
        }
    }

    /// Backend-reported failure, as opposed to a transport or local one.
    pub fn is_domain(&self) -> bool {
        !matches!(
            self,
            ClientError::Transport { .. } | ClientError::Validation { status: None, .. }
        )
    }

    /// Whether the backend asked for a token refresh.
    pub fn is_expired_token(&self) -> bool {
        matches!(
            self,
            ClientError::Unauthenticated { code: Some(code), .. } if code == "expired_token"
        )
    }
}

fn or_default<'a>(message: &'a str, default: &'a str) -> &'a str {
    if message.is_empty() {
        default
    } else {
        message
    }
}

fn default_message(status: &u16) -> &'static str {
    match *status {
        400 => "Bad request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not found",
        409 => "Conflict",
        _ => "Request failed",
    }
}

/// Failure of a client storage backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Persisting the session failed; views report it like any other
/// non-domain failure.
impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        ClientError::transport(err.to_string(), None)
    }
}

/// A specialized Result type for backend calls.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_takes_precedence_over_code() {
        let err = ClientError::from_backend(401, Some("auth_failed".into()), Some("Invalid credentials".into()));
        assert_eq!(err.kind(), ErrorKind::Unauthenticated);
        assert_eq!(err.message(), "Invalid credentials");

        let err = ClientError::from_backend(403, Some("validation_failed".into()), None);
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message(), "Forbidden");
    }

    #[test]
    fn codes_classify_when_status_is_generic() {
        let err = ClientError::from_backend(400, Some("validation_failed".into()), Some("adId and reason required".into()));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), Some(400));
        assert!(err.is_domain());

        let err = ClientError::from_backend(400, Some("exists".into()), None);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Conflict");

        let err = ClientError::from_backend(500, Some("db_error".into()), Some("Database not initialized".into()));
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn missing_backend_text_is_not_reported_as_backend_text() {
        let err = ClientError::from_backend(400, Some("auth_failed".into()), None);
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(err.backend_message(), None);
        assert_eq!(err.message(), "Bad request");
        assert_eq!(err.to_string(), "Bad request");

        let err = ClientError::from_backend(400, None, Some("  Invalid credentials ".into()));
        assert_eq!(err.backend_message(), Some("Invalid credentials"));
        assert_eq!(ClientError::transport("connection refused", None).backend_message(), None);
    }

    #[test]
    fn expired_token_is_detected_by_code() {
        let err = ClientError::from_backend(401, Some("expired_token".into()), Some("Token has expired".into()));
        assert!(err.is_expired_token());
        let err = ClientError::from_backend(401, Some("invalid_token".into()), None);
        assert!(!err.is_expired_token());
    }

    #[test]
    fn local_validation_is_not_domain() {
        let err = ClientError::invalid("reason", "Please enter a reason");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status(), None);
        assert!(!err.is_domain());
        assert!(!ClientError::transport("connection refused", None).is_domain());
    }
}
