use thiserror::Error;

use cupid_types::api::ErrorBody;

/// Every way a remote call (or the local step in front of it) can fail.
///
/// None of these are retried. `AuthenticationMissing` and
/// `AuthorizationDenied` are shown as "Access Denied"; the rest as text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Local input check failed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// No token in the session; nothing was sent.
    #[error("Authentication token not found")]
    AuthenticationMissing,

    /// Server answered 401 or 403.
    #[error("Access Denied. Status: {status}")]
    AuthorizationDenied { status: u16, message: Option<String> },

    /// Server answered with any other failure, or with a body we cannot use.
    /// `from_body` is set when `message` came from the server's error body
    /// rather than the status line or a local decode failure.
    #[error("Server Error: {message}")]
    Server { status: u16, message: String, from_body: bool },

    /// No response was obtained at all.
    #[error("Network error: no response received")]
    Transport { detail: String },
}

impl ApiError {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AuthenticationMissing | Self::AuthorizationDenied { .. })
    }

    /// Reason text taken from the server's error body, when there was one.
    /// Status text and decode failures are not reasons.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::AuthorizationDenied { message, .. } => message.as_deref(),
            Self::Server { message, from_body: true, .. } => Some(message),
            _ => None,
        }
    }

    pub fn invalid_body(status: u16, cause: impl std::fmt::Display) -> Self {
        Self::Server {
            status,
            message: format!("invalid response body: {}", cause),
            from_body: false,
        }
    }
}

/// A failed remote call before classification.
#[derive(Debug, Clone)]
pub enum RawFailure {
    /// The server answered, with a non-success status.
    Response {
        status: u16,
        status_text: String,
        body: String,
    },
    /// The request never produced a response (connect failure, timeout,
    /// reset, or a request that could not be built).
    NoResponse { detail: String },
}

/// Map a raw failure onto the error taxonomy. Shared by list, create and
/// login so every call site agrees on what 401/403 mean.
pub fn classify(raw: RawFailure) -> ApiError {
    match raw {
        RawFailure::Response { status: status @ (401 | 403), body, .. } => {
            ApiError::AuthorizationDenied {
                status,
                message: ErrorBody::parse(&body).and_then(|b| b.reason().map(str::to_string)),
            }
        }
        RawFailure::Response { status, status_text, body } => {
            let reason = ErrorBody::parse(&body).and_then(|b| b.reason().map(str::to_string));
            let from_body = reason.is_some();
            let message = reason
                .or_else(|| Some(status_text.trim().to_string()).filter(|s| !s.is_empty()))
                .unwrap_or_else(|| format!("HTTP {}", status));
            ApiError::Server { status, message, from_body }
        }
        RawFailure::NoResponse { detail } => ApiError::Transport { detail },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, status_text: &str, body: &str) -> RawFailure {
        RawFailure::Response {
            status,
            status_text: status_text.into(),
            body: body.into(),
        }
    }

    #[test]
    fn auth_statuses_are_authorization_denied() {
        for status in [401, 403] {
            let err = classify(response(status, "Forbidden", ""));
            assert!(matches!(err, ApiError::AuthorizationDenied { status: s, message: None } if s == status));
            assert!(err.is_access_denied());
        }
    }

    #[test]
    fn auth_failure_keeps_server_message() {
        let err = classify(response(401, "Unauthorized", r#"{"message":"Invalid credentials"}"#));
        assert_eq!(err.server_message(), Some("Invalid credentials"));
        assert_eq!(err.to_string(), "Access Denied. Status: 401");
    }

    #[test]
    fn server_error_prefers_body_error() {
        let err = classify(response(500, "Internal Server Error", r#"{"error":"database unavailable"}"#));
        assert_eq!(
            err,
            ApiError::Server { status: 500, message: "database unavailable".into(), from_body: true }
        );
        assert_eq!(err.to_string(), "Server Error: database unavailable");
        assert!(!err.is_access_denied());
    }

    #[test]
    fn server_error_falls_back_to_status_text() {
        let err = classify(response(502, "Bad Gateway", "<html>upstream</html>"));
        assert_eq!(err, ApiError::Server { status: 502, message: "Bad Gateway".into(), from_body: false });

        let err = classify(response(599, "", ""));
        assert_eq!(err, ApiError::Server { status: 599, message: "HTTP 599".into(), from_body: false });
    }

    #[test]
    fn only_body_reasons_count_as_server_messages() {
        let err = classify(response(500, "Internal Server Error", r#"{"message":"Bad input"}"#));
        assert_eq!(err.server_message(), Some("Bad input"));

        let err = classify(response(500, "Internal Server Error", ""));
        assert_eq!(err.to_string(), "Server Error: Internal Server Error");
        assert_eq!(err.server_message(), None);

        let err = ApiError::invalid_body(200, "missing field `user`");
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn no_response_is_transport() {
        let err = classify(RawFailure::NoResponse { detail: "connection refused".into() });
        assert_eq!(err.to_string(), "Network error: no response received");
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn local_errors_are_distinct() {
        assert!(ApiError::AuthenticationMissing.is_access_denied());
        assert_eq!(ApiError::AuthenticationMissing.to_string(), "Authentication token not found");
        assert!(!ApiError::Validation("empty".into()).is_access_denied());
    }
}
