use std::sync::Arc;

use vigil_core::{BoxFuture, Exchange, SessionStore};

use crate::error::CsrfError;
use crate::token::CsrfToken;

/// Session attribute holding the CSRF token.
pub const CSRF_TOKEN_KEY: &str = "VIGIL_CSRF_TOKEN";

/// Storage of the CSRF token bound to an exchange's session.
pub trait CsrfTokenRepository: Send + Sync + 'static {
    /// Create a new token. Does not persist it.
    fn generate_token(&self, exchange: &Exchange) -> CsrfToken;

    /// Persist `token` for the exchange's session; `None` deletes it.
    fn save_token<'a>(
        &'a self,
        token: Option<CsrfToken>,
        exchange: &'a Exchange,
    ) -> BoxFuture<'a, Result<(), CsrfError>>;

    fn load_token<'a>(
        &'a self,
        exchange: &'a Exchange,
    ) -> BoxFuture<'a, Result<Option<CsrfToken>, CsrfError>>;
}

/// Keeps the token as a session attribute.
#[derive(Clone)]
pub struct SessionCsrfTokenRepository {
    sessions: Arc<dyn SessionStore>,
    header_name: String,
    parameter_name: String,
    attribute_name: String,
}

impl SessionCsrfTokenRepository {
    pub const DEFAULT_HEADER_NAME: &'static str = "X-CSRF-TOKEN";
    pub const DEFAULT_PARAMETER_NAME: &'static str = "_csrf";

    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions,
            header_name: Self::DEFAULT_HEADER_NAME.to_string(),
            parameter_name: Self::DEFAULT_PARAMETER_NAME.to_string(),
            attribute_name: CSRF_TOKEN_KEY.to_string(),
        }
    }

    pub fn with_header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = name.into();
        self
    }

    pub fn with_parameter_name(mut self, name: impl Into<String>) -> Self {
        self.parameter_name = name.into();
        self
    }

    pub fn with_attribute_name(mut self, name: impl Into<String>) -> Self {
        self.attribute_name = name.into();
        self
    }

    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }
}

impl CsrfTokenRepository for SessionCsrfTokenRepository {
    fn generate_token(&self, _exchange: &Exchange) -> CsrfToken {
        CsrfToken::new(
            &self.header_name,
            &self.parameter_name,
            uuid::Uuid::new_v4().to_string(),
        )
    }

    fn save_token<'a>(
        &'a self,
        token: Option<CsrfToken>,
        exchange: &'a Exchange,
    ) -> BoxFuture<'a, Result<(), CsrfError>> {
        Box::pin(async move {
            let session = exchange.session_id();
            match token {
                Some(token) => {
                    let value = serde_json::to_value(&token)
                        .map_err(|e| CsrfError::Store(e.to_string()))?;
                    self.sessions
                        .set_attribute(session, &self.attribute_name, value)
                        .await?;
                }
                None => {
                    self.sessions
                        .remove_attribute(session, &self.attribute_name)
                        .await?;
                }
            }
            Ok(())
        })
    }

    fn load_token<'a>(
        &'a self,
        exchange: &'a Exchange,
    ) -> BoxFuture<'a, Result<Option<CsrfToken>, CsrfError>> {
        Box::pin(async move {
            let value = self
                .sessions
                .get_attribute(exchange.session_id(), &self.attribute_name)
                .await?;
            match value {
                Some(value) => serde_json::from_value(value)
                    .map(Some)
                    .map_err(|e| CsrfError::Store(e.to_string())),
                None => Ok(None),
            }
        })
    }
}
