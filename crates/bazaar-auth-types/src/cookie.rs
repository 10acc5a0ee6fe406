//! Refresh-token cookie.
//!
//! The refresh token only ever travels in this cookie; the access token only in JSON bodies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie name for the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh";

/// Attributes that vary by deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CookieSettings {
    /// Send the `Secure` attribute. Off for plain-http local development.
    pub secure: bool,
    /// `Max-Age` in seconds; matches the refresh-token lifetime.
    pub max_age_secs: i64,
}

fn refresh_cookie(value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((REFRESH_TOKEN_COOKIE, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Set the refresh-token cookie on the jar.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use bazaar_auth_types::cookie::{set_refresh_cookie, CookieSettings, REFRESH_TOKEN_COOKIE};
///
/// let settings = CookieSettings { secure: true, max_age_secs: 864_000 };
/// let jar = set_refresh_cookie(CookieJar::new(), "refresh_value".to_string(), &settings);
/// let cookie = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
/// assert_eq!(cookie.path(), Some("/"));
/// assert_eq!(cookie.max_age(), Some(time::Duration::seconds(864_000)));
/// assert!(cookie.http_only().unwrap_or(false));
/// assert!(cookie.secure().unwrap_or(false));
/// ```
pub fn set_refresh_cookie(jar: CookieJar, value: String, settings: &CookieSettings) -> CookieJar {
    jar.add(refresh_cookie(
        value,
        settings.secure,
        Duration::seconds(settings.max_age_secs),
    ))
}

/// Expire the refresh-token cookie.
///
/// ```
/// use axum_extra::extract::cookie::CookieJar;
/// use bazaar_auth_types::cookie::{
///     clear_refresh_cookie, set_refresh_cookie, CookieSettings, REFRESH_TOKEN_COOKIE,
/// };
///
/// let settings = CookieSettings { secure: false, max_age_secs: 60 };
/// let jar = set_refresh_cookie(CookieJar::new(), "r".to_string(), &settings);
/// let jar = clear_refresh_cookie(jar, &settings);
/// let cookie = jar.get(REFRESH_TOKEN_COOKIE).unwrap();
/// assert_eq!(cookie.value(), "");
/// assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
/// ```
pub fn clear_refresh_cookie(jar: CookieJar, settings: &CookieSettings) -> CookieJar {
    jar.add(refresh_cookie(String::new(), settings.secure, Duration::ZERO))
}

/// Refresh token presented by the client, if any. Empty values count as absent.
pub fn refresh_token_from(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_TOKEN_COOKIE)
        .map(|c| c.value().to_owned())
        .filter(|v| !v.is_empty())
}
