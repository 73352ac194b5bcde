use vigil_core::authority::{Authentication, Credentials, GrantedAuthorityDefaults};

#[test]
fn role_authority_applies_prefix() {
    let defaults = GrantedAuthorityDefaults::new(GrantedAuthorityDefaults::CONVENTIONAL_PREFIX);
    assert_eq!(defaults.role_authority("USER"), "ROLE_USER");
}

#[test]
fn empty_prefix_compares_bare_role() {
    let defaults = GrantedAuthorityDefaults::new("");
    assert_eq!(defaults.role_prefix(), "");
    assert_eq!(defaults.role_authority("USER"), "USER");
    assert!(defaults.matches_role("USER", "USER"));
    assert!(!defaults.matches_role("ROLE_USER", "USER"));
}

#[test]
fn matches_role_requires_exact_length() {
    let defaults = GrantedAuthorityDefaults::new("ROLE_");
    assert!(defaults.matches_role("ROLE_USER", "USER"));
    assert!(!defaults.matches_role("ROLE_USERS", "USER"));
    assert!(!defaults.matches_role("USER", "USER"));
}

#[test]
fn has_role_uses_defaults() {
    let user = Authentication::new("user", Credentials::new("password"), ["USER"]);
    assert!(user.has_role("USER", &GrantedAuthorityDefaults::new("")));
    assert!(!user.has_role("USER", &GrantedAuthorityDefaults::new("ROLE_")));
    assert!(user.has_authority("USER"));
    assert!(!user.has_authority("ROLE_USER"));
}

#[test]
fn new_authentication_is_authenticated() {
    let user = Authentication::new("user", Credentials::new("password"), ["USER", "ADMIN"]);
    assert_eq!(user.name(), "user");
    assert!(user.is_authenticated());
    assert!(!user.is_anonymous());
    assert_eq!(user.authorities().len(), 2);
}

#[test]
fn anonymous_has_no_authorities() {
    let anon = Authentication::anonymous();
    assert_eq!(anon.name(), Authentication::ANONYMOUS_NAME);
    assert!(anon.is_anonymous());
    assert!(anon.authorities().is_empty());
    assert!(anon.credentials().is_empty());
}

#[test]
fn credentials_are_redacted_in_debug() {
    let user = Authentication::new("user", Credentials::new("s3cret"), ["USER"]);
    let debug = format!("{user:?}");
    assert!(!debug.contains("s3cret"));
    assert!(debug.contains("[redacted]"));
    assert_eq!(user.credentials().expose(), Some("s3cret"));
}

#[test]
fn erase_credentials_drops_secret() {
    let mut user = Authentication::new("user", Credentials::new("password"), ["USER"]);
    user.erase_credentials();
    assert!(user.credentials().is_empty());
    assert!(user.is_authenticated());
}

#[test]
fn credentials_are_not_serialized() {
    let user = Authentication::new("user", Credentials::new("password"), ["USER"]);
    let json = serde_json::to_string(&user).unwrap();
    assert!(!json.contains("password"));

    let back: Authentication = serde_json::from_str(&json).unwrap();
    assert_eq!(back.name(), "user");
    assert!(back.has_authority("USER"));
    assert!(back.credentials().is_empty());
}
