use axum::http::Method;

use crate::session::SessionId;

/// The per-request view handed to token repositories and logout handlers.
#[derive(Clone, Debug)]
pub struct Exchange {
    session_id: SessionId,
    method: Method,
    path: String,
}

impl Exchange {
    pub fn new(session_id: SessionId, method: Method, path: impl Into<String>) -> Self {
        Self {
            session_id,
            method,
            path: path.into(),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}
