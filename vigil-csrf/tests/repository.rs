use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use vigil_core::{Exchange, InMemorySessionStore, SessionId, SessionStore};
use vigil_csrf::{CsrfError, CsrfTokenRepository, SessionCsrfTokenRepository, CSRF_TOKEN_KEY};

fn store() -> Arc<InMemorySessionStore> {
    Arc::new(InMemorySessionStore::new(Duration::from_secs(60)))
}

fn exchange(method: Method) -> Exchange {
    Exchange::new(SessionId::generate(), method, "/")
}

#[test]
fn generated_token_uses_configured_names() {
    let repo = SessionCsrfTokenRepository::new(store());
    let token = repo.generate_token(&exchange(Method::GET));
    assert_eq!(token.header_name(), "X-CSRF-TOKEN");
    assert_eq!(token.parameter_name(), "_csrf");
    assert!(uuid::Uuid::parse_str(token.token()).is_ok());

    let custom = SessionCsrfTokenRepository::new(store())
        .with_header_name("X-XSRF")
        .with_parameter_name("xsrf");
    let token = custom.generate_token(&exchange(Method::GET));
    assert_eq!(token.header_name(), "X-XSRF");
    assert_eq!(token.parameter_name(), "xsrf");
}

#[test]
fn generated_tokens_differ() {
    let repo = SessionCsrfTokenRepository::new(store());
    let ex = exchange(Method::GET);
    assert_ne!(repo.generate_token(&ex), repo.generate_token(&ex));
}

#[test]
fn debug_redacts_value() {
    let repo = SessionCsrfTokenRepository::new(store());
    let token = repo.generate_token(&exchange(Method::GET));
    let debug = format!("{token:?}");
    assert!(!debug.contains(token.token()));
    assert!(debug.contains("X-CSRF-TOKEN"));
}

#[tokio::test]
async fn save_load_and_delete() {
    let sessions = store();
    let repo = SessionCsrfTokenRepository::new(sessions.clone());
    let ex = exchange(Method::POST);

    assert!(repo.load_token(&ex).await.unwrap().is_none());

    let token = repo.generate_token(&ex);
    repo.save_token(Some(token.clone()), &ex).await.unwrap();
    assert_eq!(repo.load_token(&ex).await.unwrap(), Some(token));
    assert!(sessions
        .get_attribute(ex.session_id(), CSRF_TOKEN_KEY)
        .await
        .unwrap()
        .is_some());

    repo.save_token(None, &ex).await.unwrap();
    assert!(repo.load_token(&ex).await.unwrap().is_none());
}

#[tokio::test]
async fn tokens_are_per_session() {
    let repo = SessionCsrfTokenRepository::new(store());
    let a = exchange(Method::GET);
    let b = exchange(Method::GET);
    repo.save_token(Some(repo.generate_token(&a)), &a).await.unwrap();
    assert!(repo.load_token(&b).await.unwrap().is_none());
}

#[tokio::test]
async fn custom_attribute_name() {
    let sessions = store();
    let repo = SessionCsrfTokenRepository::new(sessions.clone()).with_attribute_name("XSRF");
    let ex = exchange(Method::GET);
    repo.save_token(Some(repo.generate_token(&ex)), &ex).await.unwrap();
    assert!(sessions.get_attribute(ex.session_id(), "XSRF").await.unwrap().is_some());
    assert!(sessions
        .get_attribute(ex.session_id(), CSRF_TOKEN_KEY)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn corrupt_attribute_is_store_error() {
    let sessions = store();
    let repo = SessionCsrfTokenRepository::new(sessions.clone());
    let ex = exchange(Method::GET);
    sessions
        .set_attribute(ex.session_id(), CSRF_TOKEN_KEY, serde_json::json!(42))
        .await
        .unwrap();
    assert!(matches!(repo.load_token(&ex).await, Err(CsrfError::Store(_))));
}
