use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use vigil::prelude::*;
use vigil::InMemorySessionStore;
use vigil_test::TestApp;

async fn whoami(security: RequestSecurity) -> String {
    security.remote_user().unwrap_or("anonymous").to_string()
}

#[tokio::test]
async fn prelude_wires_a_working_chain() {
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let chain = HttpSecurity::new(GrantedAuthorityDefaults::new(""))
        .any_request("permitAll")
        .session_store(sessions.clone())
        .csrf_repository(Arc::new(SessionCsrfTokenRepository::new(sessions)))
        .build()
        .unwrap();

    let app = TestApp::new(chain.apply(Router::new().route("/", get(whoami))));
    let resp = app.get("/").send().await.assert_ok();
    assert_eq!(resp.text(), "anonymous");
}

#[test]
fn prelude_exposes_expression_api() {
    let expression: AccessExpression = "hasRole('USER')".parse().unwrap();
    let defaults = GrantedAuthorityDefaults::new("");
    let granted = ["USER".to_string()].into_iter().collect();
    assert_eq!(authorize(&granted, &expression, &defaults), Decision::Allow);
}
