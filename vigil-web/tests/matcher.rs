use axum::http::Method;
use vigil_web::RequestMatcher;

fn get(m: &RequestMatcher, path: &str) -> bool {
    m.matches(&Method::GET, path)
}

#[test]
fn any_matches_everything() {
    let m = RequestMatcher::any();
    assert!(get(&m, "/"));
    assert!(get(&m, "/a/b/c"));
    assert!(m.matches(&Method::DELETE, "/x"));
}

#[test]
fn exact_path() {
    let m = RequestMatcher::ant("/messages");
    assert!(get(&m, "/messages"));
    assert!(get(&m, "/messages/"));
    assert!(!get(&m, "/messages/1"));
    assert!(!get(&m, "/message"));
}

#[test]
fn root_pattern() {
    let m = RequestMatcher::ant("/");
    assert!(get(&m, "/"));
    assert!(!get(&m, "/a"));
}

#[test]
fn single_star_stays_within_segment() {
    let m = RequestMatcher::ant("/messages/*");
    assert!(get(&m, "/messages/1"));
    assert!(!get(&m, "/messages/1/read"));
    assert!(!get(&m, "/messages"));
}

#[test]
fn double_star_spans_segments() {
    let m = RequestMatcher::ant("/admin/**");
    assert!(get(&m, "/admin"));
    assert!(get(&m, "/admin/users"));
    assert!(get(&m, "/admin/users/42/roles"));
    assert!(!get(&m, "/administrator"));
    assert!(!get(&m, "/public/admin"));
}

#[test]
fn double_star_in_the_middle() {
    let m = RequestMatcher::ant("/api/**/edit");
    assert!(get(&m, "/api/edit"));
    assert!(get(&m, "/api/a/b/edit"));
    assert!(!get(&m, "/api/a/b/view"));
}

#[test]
fn wildcards_inside_segment() {
    let m = RequestMatcher::ant("/static/*.css");
    assert!(get(&m, "/static/site.css"));
    assert!(!get(&m, "/static/site.js"));

    let m = RequestMatcher::ant("/v?/status");
    assert!(get(&m, "/v1/status"));
    assert!(!get(&m, "/v10/status"));
}

#[test]
fn question_mark_matches_one_character_not_one_byte() {
    let m = RequestMatcher::ant("/caf?");
    assert!(get(&m, "/café"));
    assert!(!get(&m, "/cafés"));

    let m = RequestMatcher::ant("/?/docs");
    assert!(get(&m, "/日/docs"));
    assert!(!get(&m, "/日本/docs"));

    let m = RequestMatcher::ant("/*é");
    assert!(get(&m, "/résumé"));
}

#[test]
fn method_restriction() {
    let m = RequestMatcher::ant("/messages").method(Method::POST);
    assert!(m.matches(&Method::POST, "/messages"));
    assert!(!m.matches(&Method::GET, "/messages"));
    assert_eq!(m.http_method(), Some(&Method::POST));
    assert_eq!(m.to_string(), "POST /messages");
}

#[test]
fn catch_all_pattern_behaves_like_any() {
    let m = RequestMatcher::ant("/**");
    assert!(get(&m, "/"));
    assert!(get(&m, "/deep/path"));
    assert_eq!(m.pattern(), "/**");
}
