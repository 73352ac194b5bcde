use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use vigil_core::SessionId;

pub const DEFAULT_SESSION_COOKIE: &str = "VIGIL_SESSION";

/// Read the session id from the `Cookie` request headers.
///
/// Malformed values are ignored; the caller then starts a new session.
pub fn session_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| SessionId::parse(value.trim_matches('"')))
}

/// `Set-Cookie` value binding the client to `session`. `secure` adds the
/// `Secure` attribute.
pub fn session_cookie(cookie_name: &str, session: &SessionId, secure: bool) -> Option<HeaderValue> {
    let secure = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{cookie_name}={session}; Path=/; HttpOnly; SameSite=Lax{secure}"
    ))
    .ok()
}

pub(crate) fn append_session_cookie(
    headers: &mut HeaderMap,
    cookie_name: &str,
    session: &SessionId,
    secure: bool,
) {
    match session_cookie(cookie_name, session, secure) {
        Some(value) => {
            headers.append(SET_COOKIE, value);
        }
        None => tracing::warn!(cookie = cookie_name, "Session cookie could not be encoded"),
    }
}

/// Cookie names are RFC 6265 tokens.
pub(crate) fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}
