use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::authority::Authentication;
use crate::error::SecurityError;
use crate::session::{SessionId, SessionStore};
use crate::BoxFuture;

/// Session attribute under which the security context is stored.
pub const SECURITY_CONTEXT_KEY: &str = "VIGIL_SECURITY_CONTEXT";

/// The security state of a request: the current authentication, if any.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SecurityContext {
    authentication: Option<Authentication>,
}

impl SecurityContext {
    pub fn new(authentication: Authentication) -> Self {
        Self {
            authentication: Some(authentication),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }

    pub fn set_authentication(&mut self, authentication: Option<Authentication>) {
        self.authentication = authentication;
    }

    pub fn is_empty(&self) -> bool {
        self.authentication.is_none()
    }
}

/// Loads and stores the [`SecurityContext`] bound to a session.
pub trait SecurityContextRepository: Send + Sync + 'static {
    /// Load the context for `session`. Returns an empty context when none is stored.
    fn load<'a>(&'a self, session: &'a SessionId) -> BoxFuture<'a, Result<SecurityContext, SecurityError>>;

    fn save<'a>(
        &'a self,
        session: &'a SessionId,
        context: &'a SecurityContext,
    ) -> BoxFuture<'a, Result<(), SecurityError>>;

    fn clear<'a>(&'a self, session: &'a SessionId) -> BoxFuture<'a, Result<(), SecurityError>>;
}

/// Stores the context as a session attribute under [`SECURITY_CONTEXT_KEY`].
///
/// Credentials are never written to the session.
#[derive(Clone)]
pub struct SessionSecurityContextRepository {
    sessions: Arc<dyn SessionStore>,
}

impl SessionSecurityContextRepository {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }
}

impl SecurityContextRepository for SessionSecurityContextRepository {
    fn load<'a>(&'a self, session: &'a SessionId) -> BoxFuture<'a, Result<SecurityContext, SecurityError>> {
        Box::pin(async move {
            let Some(value) = self
                .sessions
                .get_attribute(session, SECURITY_CONTEXT_KEY)
                .await?
            else {
                return Ok(SecurityContext::empty());
            };
            serde_json::from_value(value).map_err(|e| SecurityError::Store(e.to_string()))
        })
    }

    fn save<'a>(
        &'a self,
        session: &'a SessionId,
        context: &'a SecurityContext,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move {
            if context.is_empty() {
                return self
                    .sessions
                    .remove_attribute(session, SECURITY_CONTEXT_KEY)
                    .await;
            }
            let value =
                serde_json::to_value(context).map_err(|e| SecurityError::Store(e.to_string()))?;
            self.sessions
                .set_attribute(session, SECURITY_CONTEXT_KEY, value)
                .await
        })
    }

    fn clear<'a>(&'a self, session: &'a SessionId) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move {
            self.sessions
                .remove_attribute(session, SECURITY_CONTEXT_KEY)
                .await
        })
    }
}

tokio::task_local! {
    static CURRENT_CONTEXT: SecurityContext;
}

/// Access to the security context of the request being processed.
///
/// The filter chain runs downstream handlers inside [`SecurityContextHolder::scope`],
/// so code reached from a handler (including [`MethodGuard`](crate::method::MethodGuard))
/// can read the current principal without it being passed around.
pub struct SecurityContextHolder;

impl SecurityContextHolder {
    /// Run `future` with `context` installed as the current context.
    pub async fn scope<F: Future>(context: SecurityContext, future: F) -> F::Output {
        CURRENT_CONTEXT.scope(context, future).await
    }

    /// The current context, or `None` outside of a scope.
    pub fn context() -> Option<SecurityContext> {
        CURRENT_CONTEXT.try_with(|ctx| ctx.clone()).ok()
    }

    /// The current authentication, or `None` outside of a scope or for an empty context.
    pub fn authentication() -> Option<Authentication> {
        CURRENT_CONTEXT
            .try_with(|ctx| ctx.authentication().cloned())
            .ok()
            .flatten()
    }
}
