use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Helper to create a JSON error response with a standard `{ "error": message }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

/// Errors raised while authorizing a request or touching security state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    /// The principal does not satisfy the access expression.
    AccessDenied(String),

    /// The operation requires an authenticated principal.
    AuthenticationRequired,

    /// A state-changing request carried no CSRF token.
    MissingCsrfToken,

    /// The CSRF token sent by the client does not match the session's token.
    InvalidCsrfToken,

    /// A session or token store operation failed.
    Store(String),
}

impl std::fmt::Display for SecurityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityError::AccessDenied(msg) => write!(f, "Access denied: {msg}"),
            SecurityError::AuthenticationRequired => write!(f, "Authentication required"),
            SecurityError::MissingCsrfToken => write!(f, "Missing CSRF token"),
            SecurityError::InvalidCsrfToken => write!(f, "Invalid CSRF token"),
            SecurityError::Store(msg) => write!(f, "Security store error: {msg}"),
        }
    }
}

impl std::error::Error for SecurityError {}

impl SecurityError {
    /// Message safe to send to clients.
    pub fn public_message(&self) -> &'static str {
        match self {
            SecurityError::AccessDenied(_) => "Forbidden",
            SecurityError::AuthenticationRequired => "Unauthorized",
            SecurityError::MissingCsrfToken | SecurityError::InvalidCsrfToken => {
                "Invalid CSRF token"
            }
            SecurityError::Store(_) => "Internal server error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SecurityError::AccessDenied(_)
            | SecurityError::MissingCsrfToken
            | SecurityError::InvalidCsrfToken => StatusCode::FORBIDDEN,
            SecurityError::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            SecurityError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SecurityError {
    fn into_response(self) -> Response {
        HttpError::from(self).into_response()
    }
}

/// HTTP-facing error with a JSON body.
pub enum HttpError {
    Unauthorized(String),
    Forbidden(String),
    Internal(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            HttpError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        error_response(status, message)
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            HttpError::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
            HttpError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

// Internal details (denial reasons, store failures) stay in the logs.
impl From<SecurityError> for HttpError {
    fn from(err: SecurityError) -> Self {
        let message = err.public_message().to_string();
        match err.status() {
            StatusCode::UNAUTHORIZED => HttpError::Unauthorized(message),
            StatusCode::FORBIDDEN => HttpError::Forbidden(message),
            _ => HttpError::Internal(message),
        }
    }
}
