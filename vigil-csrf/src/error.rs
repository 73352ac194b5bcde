use vigil_core::SecurityError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsrfError {
    /// The request carried no token.
    Missing,
    /// The request's token does not match the session's token.
    Invalid,
    /// The token store failed.
    Store(String),
}

impl std::fmt::Display for CsrfError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CsrfError::Missing => write!(f, "Missing CSRF token"),
            CsrfError::Invalid => write!(f, "Invalid CSRF token"),
            CsrfError::Store(msg) => write!(f, "CSRF token store error: {msg}"),
        }
    }
}

impl std::error::Error for CsrfError {}

impl From<CsrfError> for SecurityError {
    fn from(err: CsrfError) -> Self {
        match err {
            CsrfError::Missing => SecurityError::MissingCsrfToken,
            CsrfError::Invalid => SecurityError::InvalidCsrfToken,
            CsrfError::Store(msg) => SecurityError::Store(msg),
        }
    }
}

impl From<SecurityError> for CsrfError {
    fn from(err: SecurityError) -> Self {
        match err {
            SecurityError::MissingCsrfToken => CsrfError::Missing,
            SecurityError::InvalidCsrfToken => CsrfError::Invalid,
            other => CsrfError::Store(other.to_string()),
        }
    }
}
