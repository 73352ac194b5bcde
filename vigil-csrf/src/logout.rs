use std::sync::Arc;

use vigil_core::{Authentication, BoxFuture, Exchange, LogoutHandler, SecurityError};

use crate::repository::CsrfTokenRepository;

/// Deletes the session's CSRF token on logout.
///
/// After it runs, loading the token for the same session yields `None`
/// until a later request generates a fresh one. Running it on a session
/// without a token succeeds.
pub struct CsrfLogoutHandler {
    repository: Arc<dyn CsrfTokenRepository>,
}

impl CsrfLogoutHandler {
    pub fn new(repository: Arc<dyn CsrfTokenRepository>) -> Self {
        Self { repository }
    }
}

impl LogoutHandler for CsrfLogoutHandler {
    fn logout<'a>(
        &'a self,
        exchange: &'a Exchange,
        _authentication: Option<&'a Authentication>,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move {
            self.repository
                .save_token(None, exchange)
                .await
                .map_err(|e| {
                    tracing::error!(session = %exchange.session_id(), error = %e, "Failed to delete CSRF token");
                    SecurityError::from(e)
                })?;
            tracing::debug!(session = %exchange.session_id(), "CSRF token deleted");
            Ok(())
        })
    }
}
