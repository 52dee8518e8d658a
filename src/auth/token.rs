//! Creating and verifying the JSON Web Tokens carried by the session cookie.

// Code in this module is adapted from https://github.com/ezesundayeze/axum--auth and https://github.com/tokio-rs/axum/blob/main/examples/jwt/src/main.rs

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, user::UserId};

/// How long a session token stays valid.
pub const TOKEN_DURATION: Duration = Duration::days(7);

/// The contents of a session token.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// The ID of the signed-in user.
    pub sub: i64,
    /// Email associated with the token.
    pub email: String,
    /// The time the token was issued as a unix timestamp.
    pub iat: usize,
    /// The expiry time of the token as a unix timestamp.
    pub exp: usize,
}

/// Sign a session token for `user_id` that expires `duration` from now.
///
/// # Errors
///
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn encode_token(
    user_id: UserId,
    email: &str,
    duration: Duration,
    encoding_key: &EncodingKey,
) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id.as_i64(),
        email: email.to_owned(),
        iat: now.unix_timestamp() as usize,
        exp: (now + duration).unix_timestamp() as usize,
    };

    encode(&Header::default(), &claims, encoding_key).map_err(|error| {
        tracing::error!("could not sign session token: {error}");
        Error::TokenCreation
    })
}

/// Verify a session token and return its claims.
///
/// A token with a bad signature, the wrong shape, or an expiry in the past
/// is reported as [Error::Unauthenticated] without further detail.
pub fn decode_token(token: &str, decoding_key: &DecodingKey) -> Result<Claims, Error> {
    decode::<Claims>(token, decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|_| Error::Unauthenticated)
}

#[cfg(test)]
mod token_tests {
    use jsonwebtoken::{DecodingKey, EncodingKey};
    use time::Duration;

    use crate::{Error, user::UserId};

    use super::{TOKEN_DURATION, decode_token, encode_token};

    fn test_keys() -> (EncodingKey, DecodingKey) {
        let secret = b"try-and-guess-me";

        (
            EncodingKey::from_secret(secret),
            DecodingKey::from_secret(secret),
        )
    }

    #[test]
    fn round_trip_preserves_claims() {
        let (encoding_key, decoding_key) = test_keys();

        let token = encode_token(
            UserId::new(42),
            "treasurer@stjudes.example",
            TOKEN_DURATION,
            &encoding_key,
        )
        .unwrap();
        let claims = decode_token(&token, &decoding_key).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "treasurer@stjudes.example");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let (encoding_key, decoding_key) = test_keys();

        let token = encode_token(
            UserId::new(1),
            "treasurer@stjudes.example",
            Duration::days(-1),
            &encoding_key,
        )
        .unwrap();

        assert_eq!(
            decode_token(&token, &decoding_key),
            Err(Error::Unauthenticated)
        );
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let (encoding_key, _) = test_keys();
        let other_decoding_key = DecodingKey::from_secret(b"a-different-secret");

        let token = encode_token(
            UserId::new(1),
            "treasurer@stjudes.example",
            TOKEN_DURATION,
            &encoding_key,
        )
        .unwrap();

        assert_eq!(
            decode_token(&token, &other_decoding_key),
            Err(Error::Unauthenticated)
        );
    }

    #[test]
    fn garbage_token_is_rejected() {
        let (_, decoding_key) = test_keys();

        assert_eq!(
            decode_token("not.a.token", &decoding_key),
            Err(Error::Unauthenticated)
        );
    }
}
