use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use vigil_core::{
    Authentication, BoxFuture, Credentials, DelegatingLogoutHandler, Exchange,
    InMemorySessionStore, LogoutHandler, SecurityContextLogoutHandler, SecurityError, SessionId,
    SessionSecurityContextRepository,
};
use vigil_csrf::{CsrfError, CsrfLogoutHandler, CsrfToken, CsrfTokenRepository, SessionCsrfTokenRepository};

fn setup() -> (Arc<SessionCsrfTokenRepository>, Exchange) {
    let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let repo = Arc::new(SessionCsrfTokenRepository::new(sessions));
    let exchange = Exchange::new(SessionId::generate(), Method::POST, "/logout");
    (repo, exchange)
}

#[tokio::test]
async fn logout_deletes_token() {
    let (repo, exchange) = setup();
    let token = repo.generate_token(&exchange);
    repo.save_token(Some(token), &exchange).await.unwrap();

    let handler = CsrfLogoutHandler::new(repo.clone());
    let user = Authentication::new("user", Credentials::none(), ["USER"]);
    handler.logout(&exchange, Some(&user)).await.unwrap();

    assert!(repo.load_token(&exchange).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_twice_is_not_an_error() {
    let (repo, exchange) = setup();
    repo.save_token(Some(repo.generate_token(&exchange)), &exchange)
        .await
        .unwrap();

    let handler = CsrfLogoutHandler::new(repo.clone());
    handler.logout(&exchange, None).await.unwrap();
    handler.logout(&exchange, None).await.unwrap();
    assert!(repo.load_token(&exchange).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_without_session_succeeds() {
    let (repo, exchange) = setup();
    CsrfLogoutHandler::new(repo.clone())
        .logout(&exchange, None)
        .await
        .unwrap();
    assert!(repo.load_token(&exchange).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_leaves_other_sessions_alone() {
    let (repo, exchange) = setup();
    let other = Exchange::new(SessionId::generate(), Method::GET, "/");
    repo.save_token(Some(repo.generate_token(&other)), &other)
        .await
        .unwrap();

    CsrfLogoutHandler::new(repo.clone())
        .logout(&exchange, None)
        .await
        .unwrap();
    assert!(repo.load_token(&other).await.unwrap().is_some());
}

struct BrokenRepository;

impl CsrfTokenRepository for BrokenRepository {
    fn generate_token(&self, _exchange: &Exchange) -> CsrfToken {
        CsrfToken::new("X-CSRF-TOKEN", "_csrf", "t")
    }

    fn save_token<'a>(
        &'a self,
        _token: Option<CsrfToken>,
        _exchange: &'a Exchange,
    ) -> BoxFuture<'a, Result<(), CsrfError>> {
        Box::pin(async { Err(CsrfError::Store("write failed".into())) })
    }

    fn load_token<'a>(
        &'a self,
        _exchange: &'a Exchange,
    ) -> BoxFuture<'a, Result<Option<CsrfToken>, CsrfError>> {
        Box::pin(async { Ok(None) })
    }
}

#[tokio::test]
async fn store_failure_propagates() {
    let (_, exchange) = setup();
    let handler = CsrfLogoutHandler::new(Arc::new(BrokenRepository));
    let result = handler.logout(&exchange, None).await;
    assert_eq!(result, Err(SecurityError::Store("write failed".into())));
}

#[tokio::test]
async fn composes_with_context_handler() {
    let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let csrf = Arc::new(SessionCsrfTokenRepository::new(sessions.clone()));
    let contexts = Arc::new(SessionSecurityContextRepository::new(sessions.clone()));
    let exchange = Exchange::new(SessionId::generate(), Method::POST, "/logout");
    csrf.save_token(Some(csrf.generate_token(&exchange)), &exchange)
        .await
        .unwrap();

    let handler = DelegatingLogoutHandler::default()
        .with(SecurityContextLogoutHandler::new(contexts))
        .with(CsrfLogoutHandler::new(csrf.clone()));
    handler.logout(&exchange, None).await.unwrap();

    assert!(csrf.load_token(&exchange).await.unwrap().is_none());
}
