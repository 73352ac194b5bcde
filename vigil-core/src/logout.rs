use std::sync::Arc;

use crate::authority::Authentication;
use crate::context::SecurityContextRepository;
use crate::error::SecurityError;
use crate::exchange::Exchange;
use crate::session::SessionStore;
use crate::BoxFuture;

/// A step performed when a principal logs out.
///
/// Handlers must be idempotent: logging out twice is not an error.
pub trait LogoutHandler: Send + Sync + 'static {
    fn logout<'a>(
        &'a self,
        exchange: &'a Exchange,
        authentication: Option<&'a Authentication>,
    ) -> BoxFuture<'a, Result<(), SecurityError>>;
}

/// Removes the security context bound to the exchange's session.
pub struct SecurityContextLogoutHandler {
    repository: Arc<dyn SecurityContextRepository>,
}

impl SecurityContextLogoutHandler {
    pub fn new(repository: Arc<dyn SecurityContextRepository>) -> Self {
        Self { repository }
    }
}

impl LogoutHandler for SecurityContextLogoutHandler {
    fn logout<'a>(
        &'a self,
        exchange: &'a Exchange,
        _authentication: Option<&'a Authentication>,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move { self.repository.clear(exchange.session_id()).await })
    }
}

/// Destroys the exchange's session, so its id is no longer honored.
///
/// Register it after handlers that still read session attributes.
pub struct SessionInvalidatingLogoutHandler {
    sessions: Arc<dyn SessionStore>,
}

impl SessionInvalidatingLogoutHandler {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }
}

impl LogoutHandler for SessionInvalidatingLogoutHandler {
    fn logout<'a>(
        &'a self,
        exchange: &'a Exchange,
        _authentication: Option<&'a Authentication>,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move { self.sessions.invalidate(exchange.session_id()).await })
    }
}

/// Runs several handlers in registration order, stopping at the first failure.
#[derive(Clone, Default)]
pub struct DelegatingLogoutHandler {
    handlers: Vec<Arc<dyn LogoutHandler>>,
}

impl DelegatingLogoutHandler {
    pub fn new(handlers: Vec<Arc<dyn LogoutHandler>>) -> Self {
        Self { handlers }
    }

    /// Append a handler.
    pub fn with(mut self, handler: impl LogoutHandler) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl LogoutHandler for DelegatingLogoutHandler {
    fn logout<'a>(
        &'a self,
        exchange: &'a Exchange,
        authentication: Option<&'a Authentication>,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move {
            for handler in &self.handlers {
                handler.logout(exchange, authentication).await?;
            }
            Ok(())
        })
    }
}
