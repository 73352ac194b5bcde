use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use vigil::prelude::*;
use vigil::{ConfigError, ExpressionError, InMemorySessionStore};

/// Service whose only method is restricted to principals with role `USER`.
pub struct MessageService {
    guard: MethodGuard,
}

impl MessageService {
    pub fn new(defaults: GrantedAuthorityDefaults) -> Result<Self, ExpressionError> {
        Ok(Self {
            guard: MethodGuard::pre_authorize("hasRole('USER')", defaults)?,
        })
    }

    pub async fn get_message(&self) -> Result<String, SecurityError> {
        self.guard.around(|| async { "Hello World".to_string() }).await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub messages: Arc<MessageService>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
    pub user: Option<String>,
    pub is_user: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfResponse {
    pub header_name: String,
    pub parameter_name: String,
    pub token: String,
}

async fn message(
    State(state): State<AppState>,
    security: RequestSecurity,
) -> Result<Json<MessageResponse>, SecurityError> {
    let message = state.messages.get_message().await?;
    Ok(Json(MessageResponse {
        message,
        user: security.remote_user().map(str::to_string),
        is_user: security.is_user_in_role("USER"),
    }))
}

async fn csrf(security: RequestSecurity) -> Result<Json<CsrfResponse>, HttpError> {
    let token = security
        .csrf_token()
        .ok_or_else(|| HttpError::Forbidden("CSRF protection is disabled".into()))?;
    Ok(Json(CsrfResponse {
        header_name: token.header_name().to_string(),
        parameter_name: token.parameter_name().to_string(),
        token: token.token().to_string(),
    }))
}

/// Assemble the application and its security chain from configuration.
pub fn build_app(config: &VigilConfig) -> Result<(Router, SecurityFilterChain), ConfigError> {
    let settings = SecuritySettings::from_config(config)?;
    let timeout = settings
        .session_timeout_secs
        .map(Duration::from_secs)
        .unwrap_or(HttpSecurity::DEFAULT_SESSION_TIMEOUT);
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(timeout));

    let chain = HttpSecurity::from_settings(&settings, sessions)?.build()?;

    let messages = MessageService::new(settings.authority_defaults()).map_err(|source| {
        ConfigError::InvalidExpression {
            key: "MessageService::get_message".into(),
            source,
        }
    })?;
    let state = AppState {
        messages: Arc::new(messages),
    };

    let router = Router::new()
        .route("/message", get(message))
        .route("/csrf", get(csrf))
        .with_state(state);

    Ok((chain.clone().apply(router), chain))
}

/// Store a principal in a fresh session and return the session id.
pub async fn seed_session(
    chain: &SecurityFilterChain,
    name: &str,
    roles: &[&str],
) -> Result<SessionId, SecurityError> {
    let id = SessionId::generate();
    let authentication = Authentication::new(name, Credentials::none(), roles.iter().copied());
    chain
        .context_repository()
        .save(&id, &SecurityContext::new(authentication))
        .await?;
    Ok(id)
}
