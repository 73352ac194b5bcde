use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use vigil_core::authority::{Authentication, Credentials};
use vigil_core::context::{SecurityContext, SecurityContextRepository, SessionSecurityContextRepository};
use vigil_core::exchange::Exchange;
use vigil_core::logout::{
    DelegatingLogoutHandler, LogoutHandler, SecurityContextLogoutHandler,
    SessionInvalidatingLogoutHandler,
};
use vigil_core::session::{InMemorySessionStore, SessionId, SessionStore};
use vigil_core::{BoxFuture, SecurityError};

struct Counting(Arc<AtomicUsize>);

impl LogoutHandler for Counting {
    fn logout<'a>(
        &'a self,
        _exchange: &'a Exchange,
        _authentication: Option<&'a Authentication>,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

struct Failing;

impl LogoutHandler for Failing {
    fn logout<'a>(
        &'a self,
        _exchange: &'a Exchange,
        _authentication: Option<&'a Authentication>,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async { Err(SecurityError::Store("unavailable".into())) })
    }
}

fn exchange(id: &SessionId) -> Exchange {
    Exchange::new(id.clone(), Method::POST, "/logout")
}

#[tokio::test]
async fn security_context_handler_clears_context() {
    let store = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let repo = Arc::new(SessionSecurityContextRepository::new(store));
    let id = SessionId::generate();
    let auth = Authentication::new("user", Credentials::none(), ["USER"]);
    repo.save(&id, &SecurityContext::new(auth.clone())).await.unwrap();

    let handler = SecurityContextLogoutHandler::new(repo.clone());
    handler.logout(&exchange(&id), Some(&auth)).await.unwrap();
    assert!(repo.load(&id).await.unwrap().is_empty());

    // Idempotent
    handler.logout(&exchange(&id), Some(&auth)).await.unwrap();
    assert!(repo.load(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn session_invalidating_handler_destroys_session() {
    let store = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let id = SessionId::generate();
    store.set_attribute(&id, "k", serde_json::json!(1)).await.unwrap();
    assert!(store.exists(&id).await.unwrap());

    let handler = SessionInvalidatingLogoutHandler::new(store.clone());
    handler.logout(&exchange(&id), None).await.unwrap();
    assert!(!store.exists(&id).await.unwrap());
    assert!(store.is_empty());

    handler.logout(&exchange(&id), None).await.unwrap();
}

#[tokio::test]
async fn delegating_runs_every_handler_in_order() {
    let counter = Arc::new(AtomicUsize::new(0));
    let handler = DelegatingLogoutHandler::default()
        .with(Counting(counter.clone()))
        .with(Counting(counter.clone()));
    assert_eq!(handler.len(), 2);

    handler.logout(&exchange(&SessionId::generate()), None).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn delegating_stops_at_first_failure() {
    let counter = Arc::new(AtomicUsize::new(0));
    let handler = DelegatingLogoutHandler::default()
        .with(Failing)
        .with(Counting(counter.clone()));

    let result = handler.logout(&exchange(&SessionId::generate()), None).await;
    assert_eq!(result, Err(SecurityError::Store("unavailable".into())));
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_delegating_handler_succeeds() {
    let handler = DelegatingLogoutHandler::new(Vec::new());
    assert!(handler.is_empty());
    handler.logout(&exchange(&SessionId::generate()), None).await.unwrap();
}
