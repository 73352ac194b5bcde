use std::sync::Arc;
use std::time::Duration;

use vigil_core::authority::{Authentication, Credentials};
use vigil_core::context::{
    SecurityContext, SecurityContextHolder, SecurityContextRepository,
    SessionSecurityContextRepository, SECURITY_CONTEXT_KEY,
};
use vigil_core::session::{InMemorySessionStore, SessionId, SessionStore};

fn setup() -> (Arc<InMemorySessionStore>, SessionSecurityContextRepository) {
    let store = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let repo = SessionSecurityContextRepository::new(store.clone());
    (store, repo)
}

fn user_context(role: &str) -> SecurityContext {
    SecurityContext::new(Authentication::new("user", Credentials::new("password"), [role]))
}

#[tokio::test]
async fn load_without_session_is_empty() {
    let (_, repo) = setup();
    let ctx = repo.load(&SessionId::generate()).await.unwrap();
    assert!(ctx.is_empty());
}

#[tokio::test]
async fn save_then_load_round_trips_authentication() {
    let (store, repo) = setup();
    let id = SessionId::generate();
    repo.save(&id, &user_context("USER")).await.unwrap();

    let loaded = repo.load(&id).await.unwrap();
    let auth = loaded.authentication().unwrap();
    assert_eq!(auth.name(), "user");
    assert!(auth.has_authority("USER"));
    assert!(auth.credentials().is_empty());

    let raw = store.get_attribute(&id, SECURITY_CONTEXT_KEY).await.unwrap().unwrap();
    assert!(!raw.to_string().contains("password"));
}

#[tokio::test]
async fn saving_empty_context_removes_attribute() {
    let (store, repo) = setup();
    let id = SessionId::generate();
    repo.save(&id, &user_context("USER")).await.unwrap();
    repo.save(&id, &SecurityContext::empty()).await.unwrap();
    assert!(store.get_attribute(&id, SECURITY_CONTEXT_KEY).await.unwrap().is_none());
}

#[tokio::test]
async fn clear_removes_context() {
    let (_, repo) = setup();
    let id = SessionId::generate();
    repo.save(&id, &user_context("USER")).await.unwrap();
    repo.clear(&id).await.unwrap();
    assert!(repo.load(&id).await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_attribute_is_a_store_error() {
    let (store, repo) = setup();
    let id = SessionId::generate();
    store
        .set_attribute(&id, SECURITY_CONTEXT_KEY, serde_json::json!("not a context"))
        .await
        .unwrap();
    assert!(matches!(
        repo.load(&id).await,
        Err(vigil_core::SecurityError::Store(_))
    ));
}

#[tokio::test]
async fn holder_is_empty_outside_scope() {
    assert!(SecurityContextHolder::context().is_none());
    assert!(SecurityContextHolder::authentication().is_none());
}

#[tokio::test]
async fn holder_exposes_scoped_context() {
    let name = SecurityContextHolder::scope(user_context("USER"), async {
        SecurityContextHolder::authentication().map(|a| a.name().to_string())
    })
    .await;
    assert_eq!(name.as_deref(), Some("user"));
    assert!(SecurityContextHolder::context().is_none());
}

#[tokio::test]
async fn holder_scope_with_empty_context() {
    let (has_ctx, has_auth) = SecurityContextHolder::scope(SecurityContext::empty(), async {
        (
            SecurityContextHolder::context().is_some(),
            SecurityContextHolder::authentication().is_some(),
        )
    })
    .await;
    assert!(has_ctx);
    assert!(!has_auth);
}
