use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use vigil_core::{
    AccessExpression, Authentication, Exchange, GrantedAuthorityDefaults, HttpError,
    SecurityError, SessionId,
};
use vigil_csrf::CsrfToken;

/// Per-request security view, inserted by the [`SecurityFilterChain`](crate::SecurityFilterChain).
///
/// ```ignore
/// async fn hello(security: RequestSecurity) -> String {
///     if security.is_user_in_role("USER") {
///         format!("Hello {}", security.remote_user().unwrap_or_default())
///     } else {
///         "Hello stranger".into()
///     }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct RequestSecurity {
    exchange: Exchange,
    authentication: Option<Authentication>,
    defaults: GrantedAuthorityDefaults,
    csrf_token: Option<CsrfToken>,
}

impl RequestSecurity {
    pub(crate) fn new(
        exchange: Exchange,
        authentication: Option<Authentication>,
        defaults: GrantedAuthorityDefaults,
        csrf_token: Option<CsrfToken>,
    ) -> Self {
        Self {
            exchange,
            authentication,
            defaults,
            csrf_token,
        }
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    pub fn session_id(&self) -> &SessionId {
        self.exchange.session_id()
    }

    /// The session's principal, if one is stored.
    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }

    /// Name of the authenticated principal.
    pub fn remote_user(&self) -> Option<&str> {
        self.authentication
            .as_ref()
            .filter(|a| a.is_authenticated())
            .map(|a| a.name())
    }

    pub fn is_authenticated(&self) -> bool {
        self.remote_user().is_some()
    }

    /// Whether the principal holds `role`, with the configured prefix applied.
    pub fn is_user_in_role(&self, role: &str) -> bool {
        self.authentication
            .as_ref()
            .is_some_and(|a| a.has_role(role, &self.defaults))
    }

    /// Evaluate an ad-hoc expression against the principal.
    pub fn authorize(&self, expression: &AccessExpression) -> Result<(), SecurityError> {
        expression
            .evaluate(self.authentication.as_ref(), &self.defaults)
            .into_result()
    }

    /// The session's CSRF token, when protection is enabled.
    pub fn csrf_token(&self) -> Option<&CsrfToken> {
        self.csrf_token.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestSecurity {
    type Rejection = HttpError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestSecurity>().cloned().ok_or_else(|| {
            tracing::error!(uri = %parts.uri, "RequestSecurity requested outside of the security filter chain");
            HttpError::Internal("Internal server error".into())
        })
    }
}
