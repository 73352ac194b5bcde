use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use vigil_core::{
    ConfigError, GrantedAuthorityDefaults, InMemorySessionStore, SecuritySettings, VigilConfig,
};
use vigil_csrf::SessionCsrfTokenRepository;
use vigil_web::HttpSecurity;

fn defaults() -> GrantedAuthorityDefaults {
    GrantedAuthorityDefaults::new("")
}

#[test]
fn csrf_enabled_without_repository_is_rejected() {
    let err = HttpSecurity::new(defaults()).build().err().unwrap();
    assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("CSRF")));
}

#[test]
fn csrf_disabled_builds_without_repository() {
    let chain = HttpSecurity::new(defaults()).csrf(false).build().unwrap();
    assert!(chain.csrf().is_none());
    assert_eq!(chain.logout_path(), "/logout");
    assert_eq!(chain.session_cookie_name(), "VIGIL_SESSION");
    assert!(!chain.session_cookie_secure());
}

#[test]
fn invalid_rule_expression_fails_build() {
    let err = HttpSecurity::new(defaults())
        .csrf(false)
        .authorize("/a", "permitAll")
        .authorize("/b/**", "hasRole('USER'")
        .build()
        .err()
        .unwrap();
    match err {
        ConfigError::InvalidExpression { key, source } => {
            assert!(key.starts_with("rules[1]"), "{key}");
            assert_eq!(source.expression, "hasRole('USER'");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_default_expression_fails_build() {
    let err = HttpSecurity::new(defaults())
        .csrf(false)
        .any_request("sometimes()")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ConfigError::InvalidExpression { ref key, .. } if key == "any_request"));
}

#[test]
fn invalid_cookie_name_and_logout_path() {
    let err = HttpSecurity::new(defaults())
        .csrf(false)
        .session_cookie("bad name")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = HttpSecurity::new(defaults())
        .csrf(false)
        .logout_path("logout")
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn first_matching_rule_wins() {
    let chain = HttpSecurity::new(defaults())
        .csrf(false)
        .authorize("/admin/public", "permitAll")
        .authorize("/admin/**", "hasRole('ADMIN')")
        .authorize_method(Method::DELETE, "/messages/*", "denyAll")
        .any_request("isAuthenticated()")
        .build()
        .unwrap();

    let access = |method: Method, path: &str| chain.access_for(&method, path).map(|e| e.to_string());
    assert_eq!(access(Method::GET, "/admin/public").as_deref(), Some("permitAll"));
    assert_eq!(access(Method::GET, "/admin/users").as_deref(), Some("hasRole('ADMIN')"));
    assert_eq!(access(Method::DELETE, "/messages/1").as_deref(), Some("denyAll"));
    assert_eq!(access(Method::GET, "/messages/1").as_deref(), Some("isAuthenticated()"));
    assert_eq!(chain.rules().len(), 3);
}

#[test]
fn no_default_means_unrestricted() {
    let chain = HttpSecurity::new(defaults())
        .csrf(false)
        .authorize("/admin/**", "hasRole('ADMIN')")
        .build()
        .unwrap();
    assert!(chain.access_for(&Method::GET, "/anything").is_none());
}

#[test]
fn explicit_csrf_repository() {
    let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let chain = HttpSecurity::new(defaults())
        .session_store(sessions.clone())
        .csrf_repository(Arc::new(SessionCsrfTokenRepository::new(sessions)))
        .build()
        .unwrap();
    assert!(chain.csrf().is_some());
}

#[test]
fn from_settings_applies_configuration() {
    let yaml = r#"
security:
  role:
    prefix: ROLE_
  session:
    cookie: SID
    secure: true
  logout:
    path: /signout
  csrf:
    header: X-XSRF-TOKEN
  access:
    default: hasRole('USER')
  rules:
    - pattern: /public/**
      access: permitAll
    - pattern: /messages
      method: post
      access: hasRole('WRITER')
"#;
    let config = VigilConfig::from_yaml_str(yaml, "test").unwrap();
    let settings = SecuritySettings::from_config(&config).unwrap();
    let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let chain = HttpSecurity::from_settings(&settings, sessions)
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(chain.authority_defaults().role_prefix(), "ROLE_");
    assert_eq!(chain.session_cookie_name(), "SID");
    assert!(chain.session_cookie_secure());
    assert_eq!(chain.logout_path(), "/signout");
    assert!(chain.csrf().is_some());
    assert_eq!(
        chain.access_for(&Method::POST, "/messages").map(|e| e.to_string()).as_deref(),
        Some("hasRole('WRITER')")
    );
    assert_eq!(
        chain.access_for(&Method::GET, "/messages").map(|e| e.to_string()).as_deref(),
        Some("hasRole('USER')")
    );
}

#[test]
fn from_settings_with_csrf_disabled() {
    let yaml = "security:\n  role:\n    prefix: \"\"\n  csrf:\n    enabled: false\n";
    let config = VigilConfig::from_yaml_str(yaml, "test").unwrap();
    let settings = SecuritySettings::from_config(&config).unwrap();
    let sessions = Arc::new(InMemorySessionStore::new(Duration::from_secs(60)));
    let chain = HttpSecurity::from_settings(&settings, sessions)
        .unwrap()
        .build()
        .unwrap();
    assert!(chain.csrf().is_none());
}
