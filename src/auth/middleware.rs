//! The session extractor used by API handlers and the gatekeeper middleware
//! that keeps signed-out visitors off the ledger pages.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::DecodingKey;

use crate::{
    AppState, Error,
    auth::{
        cookie::{COOKIE_TOKEN, invalidate_auth_cookie},
        token::decode_token,
    },
    endpoints,
    user::UserId,
};

/// The state needed to verify session tokens.
#[derive(Clone)]
pub struct AuthState {
    /// The key used to verify session token signatures.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.decoding_key.clone(),
        }
    }
}

/// The verified identity behind a request's session cookie.
///
/// Extracting a `Session` in a handler makes the endpoint require
/// authentication: requests without a valid session cookie are rejected with
/// [Error::Unauthenticated] before the handler body runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The ID of the signed-in user.
    pub user_id: UserId,
    /// The email the user signed up with.
    pub email: String,
}

impl<S> FromRequestParts<S> for Session
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::Unauthenticated)?;
        let auth_state = AuthState::from_ref(state);

        session_from_cookies(&jar, &auth_state.decoding_key)
    }
}

/// Verify the session cookie in `jar`, if any.
pub(crate) fn session_from_cookies(
    jar: &CookieJar,
    decoding_key: &DecodingKey,
) -> Result<Session, Error> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(Error::Unauthenticated)?;
    let claims = decode_token(cookie.value_trimmed(), decoding_key)?;

    Ok(Session {
        user_id: UserId::new(claims.sub),
        email: claims.email,
    })
}

/// Middleware function that checks for a valid session cookie.
///
/// The session is placed into the request and the request executed normally
/// if the cookie is valid, otherwise a redirect to the log-in page is
/// returned. A stale or forged cookie is cleared on the way out so the
/// browser does not keep presenting it.
///
/// **Note**: Route handlers behind this guard can use the function argument
/// `Extension(session): Extension<Session>` to receive the session.
pub async fn auth_guard(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match session_from_cookies(&jar, &state.decoding_key) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(_) => {
            let redirect = Redirect::to(endpoints::LOG_IN_VIEW);

            if jar.get(COOKIE_TOKEN).is_some() {
                let jar = invalidate_auth_cookie(CookieJar::new());
                (jar, redirect).into_response()
            } else {
                redirect.into_response()
            }
        }
    }
}
