//! Session authentication: token signing and verification, the session
//! cookie, and the gatekeeper middleware that protects ledger pages.

mod cookie;
mod middleware;
mod token;

pub use cookie::{COOKIE_TOKEN, invalidate_auth_cookie, set_auth_cookie};
pub use middleware::{AuthState, Session, auth_guard};
pub(crate) use middleware::session_from_cookies;
pub use token::{Claims, TOKEN_DURATION, decode_token, encode_token};
