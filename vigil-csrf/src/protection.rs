use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use subtle::ConstantTimeEq;
use vigil_core::Exchange;

use crate::error::CsrfError;
use crate::repository::CsrfTokenRepository;
use crate::token::CsrfToken;

/// Issues and verifies the per-session CSRF token.
#[derive(Clone)]
pub struct CsrfProtection {
    repository: Arc<dyn CsrfTokenRepository>,
}

impl CsrfProtection {
    pub fn new(repository: Arc<dyn CsrfTokenRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<dyn CsrfTokenRepository> {
        &self.repository
    }

    /// Whether requests with `method` must carry the token.
    pub fn requires_protection(method: &Method) -> bool {
        !(method == Method::GET
            || method == Method::HEAD
            || method == Method::OPTIONS
            || method == Method::TRACE)
    }

    /// Return the session's token, generating and saving one if absent.
    pub async fn load_or_generate(&self, exchange: &Exchange) -> Result<CsrfToken, CsrfError> {
        if let Some(token) = self.repository.load_token(exchange).await? {
            return Ok(token);
        }
        let token = self.repository.generate_token(exchange);
        self.repository
            .save_token(Some(token.clone()), exchange)
            .await?;
        tracing::debug!(session = %exchange.session_id(), "CSRF token generated");
        Ok(token)
    }

    /// Verify `provided` against the session's token when the exchange's
    /// method is state-changing, and return the token to expose downstream.
    pub async fn verify(
        &self,
        exchange: &Exchange,
        provided: Option<&str>,
    ) -> Result<CsrfToken, CsrfError> {
        let token = self.load_or_generate(exchange).await?;
        check(exchange, &token, provided)?;
        Ok(token)
    }

    /// Like [`verify`](Self::verify), reading the client's token from the
    /// header named by the session's token.
    pub async fn verify_headers(
        &self,
        exchange: &Exchange,
        headers: &HeaderMap,
    ) -> Result<CsrfToken, CsrfError> {
        let token = self.load_or_generate(exchange).await?;
        let provided = headers
            .get(token.header_name())
            .and_then(|value| value.to_str().ok());
        check(exchange, &token, provided)?;
        Ok(token)
    }
}

fn check(exchange: &Exchange, token: &CsrfToken, provided: Option<&str>) -> Result<(), CsrfError> {
    if !CsrfProtection::requires_protection(exchange.method()) {
        return Ok(());
    }

    let Some(provided) = provided else {
        tracing::warn!(
            method = %exchange.method(),
            path = exchange.path(),
            "Missing CSRF token"
        );
        return Err(CsrfError::Missing);
    };

    if !tokens_match(token.token(), provided) {
        tracing::warn!(
            method = %exchange.method(),
            path = exchange.path(),
            "Invalid CSRF token"
        );
        return Err(CsrfError::Invalid);
    }
    Ok(())
}

fn tokens_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).unwrap_u8() == 1
}
