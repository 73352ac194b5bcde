use serde::{Deserialize, Serialize};

/// A CSRF token together with the names under which clients must send it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsrfToken {
    header_name: String,
    parameter_name: String,
    token: String,
}

impl CsrfToken {
    pub fn new(
        header_name: impl Into<String>,
        parameter_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            header_name: header_name.into(),
            parameter_name: parameter_name.into(),
            token: token.into(),
        }
    }

    /// HTTP header expected to carry the token, e.g. `X-CSRF-TOKEN`.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// Form parameter expected to carry the token, e.g. `_csrf`.
    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// The value is a bearer secret; keep it out of logs.
impl std::fmt::Debug for CsrfToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfToken")
            .field("header_name", &self.header_name)
            .field("parameter_name", &self.parameter_name)
            .field("token", &"[redacted]")
            .finish()
    }
}
