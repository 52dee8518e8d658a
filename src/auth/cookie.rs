//! Defines functions for handling the session cookie.

use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

/// The name of the cookie holding the session token.
pub const COOKIE_TOKEN: &str = "auth-token";

/// Add the session cookie to the cookie jar, indicating that a user is signed
/// in.
///
/// The cookie is HTTP-only and scoped to the whole site, and tells the
/// browser to drop it after `duration`.
///
/// Returns the cookie jar with the cookie added.
pub fn set_auth_cookie(jar: CookieJar, token: String, duration: Duration) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, token))
            .path("/")
            .max_age(duration)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: CookieJar) -> CookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(true),
    )
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{CookieJar, cookie::SameSite};
    use time::{Duration, OffsetDateTime};

    use super::{COOKIE_TOKEN, invalidate_auth_cookie, set_auth_cookie};

    #[test]
    fn set_auth_cookie_stores_token() {
        let jar = set_auth_cookie(
            CookieJar::new(),
            "header.payload.signature".to_owned(),
            Duration::days(7),
        );

        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.value(), "header.payload.signature");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::days(7)));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn invalidate_auth_cookie_expires_cookie() {
        let jar = set_auth_cookie(
            CookieJar::new(),
            "header.payload.signature".to_owned(),
            Duration::days(7),
        );

        let jar = invalidate_auth_cookie(jar);
        let cookie = jar.get(COOKIE_TOKEN).unwrap();

        assert_eq!(cookie.value(), "deleted");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
