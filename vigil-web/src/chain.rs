use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use vigil_core::{
    AccessExpression, Decision, Exchange, GrantedAuthorityDefaults, LogoutHandler,
    SecurityContextHolder, SecurityContextRepository, SecurityError, SessionId, SessionStore,
};
use vigil_csrf::CsrfProtection;

use crate::cookie;
use crate::extract::RequestSecurity;
use crate::matcher::RequestMatcher;

/// A request matcher paired with the expression guarding it.
#[derive(Clone, Debug)]
pub struct AccessRule {
    pub matcher: RequestMatcher,
    pub access: AccessExpression,
}

pub(crate) struct ChainInner {
    pub(crate) rules: Vec<AccessRule>,
    pub(crate) default_access: Option<AccessExpression>,
    pub(crate) defaults: GrantedAuthorityDefaults,
    pub(crate) sessions: Arc<dyn SessionStore>,
    pub(crate) contexts: Arc<dyn SecurityContextRepository>,
    pub(crate) csrf: Option<CsrfProtection>,
    pub(crate) logout_path: String,
    pub(crate) logout_handler: Arc<dyn LogoutHandler>,
    pub(crate) cookie_name: String,
    pub(crate) cookie_secure: bool,
}

/// The assembled security pipeline, produced by [`HttpSecurity::build`](crate::HttpSecurity::build).
///
/// For each request it resolves the session, loads the security context,
/// enforces CSRF protection, evaluates the access rules in order, and runs
/// the downstream handler inside a [`SecurityContextHolder`] scope.
#[derive(Clone)]
pub struct SecurityFilterChain {
    inner: Arc<ChainInner>,
}

impl SecurityFilterChain {
    pub(crate) fn new(inner: ChainInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Install the chain and the logout endpoint on `router`.
    ///
    /// Call after all routes are registered.
    pub fn apply<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let logout_chain = self.clone();
        router
            .route(
                &self.inner.logout_path,
                post(move |security: RequestSecurity| {
                    let chain = logout_chain.clone();
                    async move { chain.logout(&security).await }
                }),
            )
            .layer(middleware::from_fn_with_state(self, security_filter))
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.inner.rules
    }

    pub fn authority_defaults(&self) -> &GrantedAuthorityDefaults {
        &self.inner.defaults
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.inner.sessions
    }

    pub fn context_repository(&self) -> &Arc<dyn SecurityContextRepository> {
        &self.inner.contexts
    }

    pub fn csrf(&self) -> Option<&CsrfProtection> {
        self.inner.csrf.as_ref()
    }

    pub fn logout_path(&self) -> &str {
        &self.inner.logout_path
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.inner.cookie_name
    }

    pub fn session_cookie_secure(&self) -> bool {
        self.inner.cookie_secure
    }

    /// The expression guarding `method path`: the first matching rule, then
    /// the default. `None` means the request is not restricted.
    pub fn access_for(&self, method: &Method, path: &str) -> Option<&AccessExpression> {
        self.inner
            .rules
            .iter()
            .find(|rule| rule.matcher.matches(method, path))
            .map(|rule| &rule.access)
            .or(self.inner.default_access.as_ref())
    }

    fn is_logout(&self, method: &Method, path: &str) -> bool {
        method == Method::POST && path == self.inner.logout_path
    }

    /// Run the logout handlers for the request's session.
    pub async fn logout(&self, security: &RequestSecurity) -> Response {
        let exchange = security.exchange();
        match self
            .inner
            .logout_handler
            .logout(exchange, security.authentication())
            .await
        {
            Ok(()) => {
                tracing::debug!(
                    session = %exchange.session_id(),
                    principal = security.remote_user().unwrap_or("anonymous"),
                    "Logged out"
                );
                StatusCode::NO_CONTENT.into_response()
            }
            Err(e) => {
                tracing::error!(session = %exchange.session_id(), error = %e, "Logout failed");
                e.into_response()
            }
        }
    }
}

async fn security_filter(
    State(chain): State<SecurityFilterChain>,
    mut request: Request,
    next: Next,
) -> Response {
    let inner = &chain.inner;
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let (session_id, new_session) = match resolve_session(&chain, request.headers()).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve session");
            return e.into_response();
        }
    };
    let exchange = Exchange::new(session_id.clone(), method.clone(), path.clone());

    let context = match inner.contexts.load(&session_id).await {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(session = %session_id, error = %e, "Failed to load security context");
            return e.into_response();
        }
    };

    let csrf_token = match &inner.csrf {
        Some(csrf) => match csrf.verify_headers(&exchange, request.headers()).await {
            Ok(token) => Some(token),
            Err(e) => {
                let rejected = SecurityError::from(e).into_response();
                return with_cookie(rejected, &chain, &session_id, new_session);
            }
        },
        None => None,
    };

    // Logout is reachable by any principal; only CSRF guards it.
    if !chain.is_logout(&method, &path) {
        if let Some(expression) = chain.access_for(&method, &path) {
            let decision = expression.evaluate(context.authentication(), &inner.defaults);
            let principal = context
                .authentication()
                .map(|a| a.name())
                .unwrap_or("anonymous");
            if decision == Decision::Deny {
                tracing::debug!(%method, %path, principal, %expression, "Access denied");
                let denied =
                    SecurityError::AccessDenied(format!("{method} {path} requires {expression}"));
                return with_cookie(denied.into_response(), &chain, &session_id, new_session);
            }
            tracing::debug!(%method, %path, principal, %expression, "Access granted");
        }
    }

    let security = RequestSecurity::new(
        exchange,
        context.authentication().cloned(),
        inner.defaults.clone(),
        csrf_token.clone(),
    );
    request.extensions_mut().insert(security);
    if let Some(token) = csrf_token {
        request.extensions_mut().insert(token);
    }

    let response = SecurityContextHolder::scope(context, next.run(request)).await;
    with_cookie(response, &chain, &session_id, new_session)
}

/// The request's session id, or a freshly generated one. Ids the store does
/// not know, including expired and invalidated ones, are never adopted.
async fn resolve_session(
    chain: &SecurityFilterChain,
    headers: &HeaderMap,
) -> Result<(SessionId, bool), SecurityError> {
    let inner = &chain.inner;
    if let Some(id) = cookie::session_from_headers(headers, &inner.cookie_name) {
        if inner.sessions.exists(&id).await? {
            return Ok((id, false));
        }
        tracing::debug!(session = %id, "Unknown session id, issuing a new one");
    }
    Ok((SessionId::generate(), true))
}

fn with_cookie(
    mut response: Response,
    chain: &SecurityFilterChain,
    session_id: &SessionId,
    new_session: bool,
) -> Response {
    if new_session {
        cookie::append_session_cookie(
            response.headers_mut(),
            &chain.inner.cookie_name,
            session_id,
            chain.inner.cookie_secure,
        );
    }
    response
}
