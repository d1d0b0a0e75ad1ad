use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;

use crate::config::SecurityConfig;

/// Cookie carrying the user id, read by the browser client.
pub const USER_ID_COOKIE: &str = "userID";
/// Cookie carrying the display name, read by the browser client.
pub const USERNAME_COOKIE: &str = "username";

/// Value of the named cookie across every `Cookie` header, with RFC 6265
/// surrounding double quotes removed.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|cookie| cookie.value_trimmed().to_string())
}

/// Add the cookies establishing a browser session to `jar`.
///
/// Lifetimes follow `jwt_expiry_hours`, which `AppConfig::validate` bounds.
pub fn session_cookies(
    jar: CookieJar,
    security: &SecurityConfig,
    token: &str,
    user_id: &str,
    username: &str,
) -> CookieJar {
    let max_age = Duration::hours(security.jwt_expiry_hours as i64);
    let username: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();

    jar.add(build(security, &security.session_cookie, token, max_age, true))
        .add(build(security, USER_ID_COOKIE, user_id, max_age, false))
        .add(build(security, USERNAME_COOKIE, &username, max_age, false))
}

/// Add expired replacements for every session cookie to `jar`.
pub fn cleared_cookies(jar: CookieJar, security: &SecurityConfig) -> CookieJar {
    jar.add(build(security, &security.session_cookie, "", Duration::ZERO, true))
        .add(build(security, USER_ID_COOKIE, "", Duration::ZERO, false))
        .add(build(security, USERNAME_COOKIE, "", Duration::ZERO, false))
}

fn build(security: &SecurityConfig, name: &str, value: &str, max_age: Duration, http_only: bool) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .path("/")
        .max_age(max_age)
        .same_site(SameSite::Lax)
        .http_only(http_only)
        .secure(security.require_https)
        .build()
}
