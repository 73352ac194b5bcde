use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use vigil_core::{
    AccessExpression, ConfigError, DelegatingLogoutHandler, GrantedAuthorityDefaults,
    InMemorySessionStore, LogoutHandler, SecurityContextLogoutHandler, SecurityContextRepository,
    SecuritySettings, SessionInvalidatingLogoutHandler, SessionSecurityContextRepository,
    SessionStore,
};
use vigil_csrf::{CsrfLogoutHandler, CsrfProtection, CsrfTokenRepository, SessionCsrfTokenRepository};

use crate::chain::{AccessRule, ChainInner, SecurityFilterChain};
use crate::cookie::{is_valid_cookie_name, DEFAULT_SESSION_COOKIE};
use crate::matcher::RequestMatcher;

enum Access {
    Parsed(AccessExpression),
    Dsl(String),
}

impl Access {
    fn resolve(self, key: String) -> Result<AccessExpression, ConfigError> {
        match self {
            Access::Parsed(expression) => Ok(expression),
            Access::Dsl(raw) => AccessExpression::parse(&raw)
                .map_err(|source| ConfigError::InvalidExpression { key, source }),
        }
    }
}

/// Builder for a [`SecurityFilterChain`].
///
/// Rules are evaluated in registration order; the first matching rule
/// decides. Requests matching no rule fall back to
/// [`any_request`](Self::any_request), or are allowed when it is unset.
///
/// ```ignore
/// let chain = HttpSecurity::new(GrantedAuthorityDefaults::new(""))
///     .authorize("/public/**", "permitAll")
///     .authorize_method(Method::DELETE, "/messages/*", "hasRole('ADMIN')")
///     .any_request("hasRole('USER')")
///     .csrf_repository(Arc::new(SessionCsrfTokenRepository::new(sessions.clone())))
///     .session_store(sessions)
///     .build()?;
///
/// let app = chain.apply(Router::new().route("/", get(hello)));
/// ```
pub struct HttpSecurity {
    defaults: GrantedAuthorityDefaults,
    rules: Vec<(RequestMatcher, Access)>,
    any_request: Option<Access>,
    sessions: Option<Arc<dyn SessionStore>>,
    session_timeout: Duration,
    contexts: Option<Arc<dyn SecurityContextRepository>>,
    csrf_enabled: bool,
    csrf_repository: Option<Arc<dyn CsrfTokenRepository>>,
    logout_path: String,
    logout_handlers: Vec<Arc<dyn LogoutHandler>>,
    cookie_name: String,
    cookie_secure: bool,
}

impl HttpSecurity {
    pub const DEFAULT_LOGOUT_PATH: &'static str = "/logout";
    pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

    pub fn new(defaults: GrantedAuthorityDefaults) -> Self {
        Self {
            defaults,
            rules: Vec::new(),
            any_request: None,
            sessions: None,
            session_timeout: Self::DEFAULT_SESSION_TIMEOUT,
            contexts: None,
            csrf_enabled: true,
            csrf_repository: None,
            logout_path: Self::DEFAULT_LOGOUT_PATH.to_string(),
            logout_handlers: Vec::new(),
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            cookie_secure: false,
        }
    }

    /// Configure a builder from the `security.*` settings.
    ///
    /// When CSRF is enabled a [`SessionCsrfTokenRepository`] over the
    /// chain's session store is installed, using the configured header and
    /// parameter names.
    pub fn from_settings(
        settings: &SecuritySettings,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Self::new(settings.authority_defaults())
            .session_store(sessions.clone())
            .csrf(settings.csrf_enabled);

        for (i, rule) in settings.rules.iter().enumerate() {
            let mut matcher = RequestMatcher::ant(&rule.pattern);
            if let Some(method) = &rule.method {
                let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .map_err(|_| {
                        ConfigError::Invalid(format!(
                            "security.rules[{i}].method: invalid method '{method}'"
                        ))
                    })?;
                matcher = matcher.method(method);
            }
            builder = builder.rule_expression(matcher, rule.access.clone());
        }
        if let Some(default_access) = &settings.default_access {
            builder.any_request = Some(Access::Parsed(default_access.clone()));
        }
        if let Some(timeout) = settings.session_timeout_secs {
            builder = builder.session_timeout(Duration::from_secs(timeout));
        }
        if let Some(name) = &settings.session_cookie {
            builder = builder.session_cookie(name);
        }
        builder = builder.session_cookie_secure(settings.session_secure);
        if let Some(path) = &settings.logout_path {
            builder = builder.logout_path(path);
        }
        if settings.csrf_enabled {
            let mut repository = SessionCsrfTokenRepository::new(sessions);
            if let Some(header) = &settings.csrf_header {
                repository = repository.with_header_name(header);
            }
            if let Some(parameter) = &settings.csrf_parameter {
                repository = repository.with_parameter_name(parameter);
            }
            builder = builder.csrf_repository(Arc::new(repository));
        }
        Ok(builder)
    }

    /// Guard requests whose path matches the ant-style `pattern`.
    pub fn authorize(self, pattern: &str, expression: &str) -> Self {
        self.rule(RequestMatcher::ant(pattern), expression)
    }

    /// Guard `method` requests whose path matches `pattern`.
    pub fn authorize_method(self, method: Method, pattern: &str, expression: &str) -> Self {
        self.rule(RequestMatcher::ant(pattern).method(method), expression)
    }

    /// Guard requests selected by `matcher` with a DSL expression, parsed at `build()`.
    pub fn rule(mut self, matcher: RequestMatcher, expression: &str) -> Self {
        self.rules.push((matcher, Access::Dsl(expression.to_string())));
        self
    }

    pub fn rule_expression(mut self, matcher: RequestMatcher, expression: AccessExpression) -> Self {
        self.rules.push((matcher, Access::Parsed(expression)));
        self
    }

    /// Expression applied to requests no rule matches.
    pub fn any_request(mut self, expression: &str) -> Self {
        self.any_request = Some(Access::Dsl(expression.to_string()));
        self
    }

    pub fn session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Idle timeout of the in-memory store created when no store is supplied.
    pub fn session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout = timeout;
        self
    }

    pub fn context_repository(mut self, repository: Arc<dyn SecurityContextRepository>) -> Self {
        self.contexts = Some(repository);
        self
    }

    pub fn csrf(mut self, enabled: bool) -> Self {
        self.csrf_enabled = enabled;
        self
    }

    pub fn csrf_repository(mut self, repository: Arc<dyn CsrfTokenRepository>) -> Self {
        self.csrf_repository = Some(repository);
        self
    }

    pub fn logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    /// Add a handler run on logout, after the context and CSRF token are
    /// cleared and before the session is invalidated.
    pub fn logout_handler(mut self, handler: impl LogoutHandler) -> Self {
        self.logout_handlers.push(Arc::new(handler));
        self
    }

    pub fn session_cookie(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Mark the session cookie `Secure`, for deployments served over HTTPS.
    pub fn session_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Parse every expression and assemble the chain.
    pub fn build(self) -> Result<SecurityFilterChain, ConfigError> {
        if !is_valid_cookie_name(&self.cookie_name) {
            return Err(ConfigError::Invalid(format!(
                "invalid session cookie name '{}'",
                self.cookie_name
            )));
        }
        if !self.logout_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "logout path '{}' must start with '/'",
                self.logout_path
            )));
        }

        let csrf = match (self.csrf_enabled, self.csrf_repository) {
            (true, Some(repository)) => Some(repository),
            (true, None) => {
                return Err(ConfigError::Invalid(
                    "CSRF protection is enabled but no CSRF token repository is configured".into(),
                ))
            }
            (false, _) => None,
        };

        let rules = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(i, (matcher, access))| {
                let key = format!("rules[{i}] ({matcher})");
                Ok(AccessRule {
                    matcher,
                    access: access.resolve(key)?,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        let default_access = self
            .any_request
            .map(|access| access.resolve("any_request".to_string()))
            .transpose()?;

        let sessions: Arc<dyn SessionStore> = match self.sessions {
            Some(sessions) => sessions,
            None => Arc::new(InMemorySessionStore::new(self.session_timeout)),
        };
        let contexts: Arc<dyn SecurityContextRepository> = match self.contexts {
            Some(contexts) => contexts,
            None => Arc::new(SessionSecurityContextRepository::new(sessions.clone())),
        };

        let mut handlers: Vec<Arc<dyn LogoutHandler>> = Vec::new();
        handlers.push(Arc::new(SecurityContextLogoutHandler::new(contexts.clone())));
        if let Some(repository) = &csrf {
            handlers.push(Arc::new(CsrfLogoutHandler::new(repository.clone())));
        }
        handlers.extend(self.logout_handlers);
        handlers.push(Arc::new(SessionInvalidatingLogoutHandler::new(sessions.clone())));

        let fallback = default_access
            .as_ref()
            .map_or_else(|| "permitAll".to_string(), |e| e.to_string());
        tracing::debug!(
            rules = rules.len(),
            default_access = %fallback,
            csrf = csrf.is_some(),
            logout_path = %self.logout_path,
            "Security filter chain built"
        );

        Ok(SecurityFilterChain::new(ChainInner {
            rules,
            default_access,
            defaults: self.defaults,
            sessions,
            contexts,
            csrf: csrf.map(CsrfProtection::new),
            logout_path: self.logout_path,
            logout_handler: Arc::new(DelegatingLogoutHandler::new(handlers)),
            cookie_name: self.cookie_name,
            cookie_secure: self.cookie_secure,
        }))
    }
}
