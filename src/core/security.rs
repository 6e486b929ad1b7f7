use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use crate::core::config::Settings;

// OWASP minimum for Argon2id.
const ARGON2_MEMORY_KIB: u32 = 19_456;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_LANES: u32 = 1;

#[derive(Debug, Error)]
pub(crate) enum SecurityError {
    #[error("password hashing failed")]
    Hashing,
    #[error("stored password hash is unreadable")]
    MalformedHash,
    #[error("access token could not be signed")]
    TokenSigning,
    #[error("access token is invalid or expired")]
    InvalidToken,
}

/// Access token claims. `sub` is the account id.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub(crate) sub: String,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

fn argon2() -> Argon2<'static> {
    let params = argon2::Params::new(ARGON2_MEMORY_KIB, ARGON2_ITERATIONS, ARGON2_LANES, None)
        .unwrap_or_default();
    Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
}

pub(crate) fn hash_password(password: &str) -> Result<String, SecurityError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| SecurityError::Hashing)
}

/// `Ok(false)` on a wrong password; `Err` only when the stored hash cannot be used.
pub(crate) fn verify_password(password: &str, hash: &str) -> Result<bool, SecurityError> {
    let parsed = PasswordHash::new(hash).map_err(|_| SecurityError::MalformedHash)?;

    match argon2().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(SecurityError::MalformedHash),
    }
}

/// Signs a token for `account_id`, valid for `expires_in` or the configured lifetime.
pub(crate) fn create_access_token(
    account_id: &str,
    settings: &Settings,
    expires_in: Option<Duration>,
) -> Result<String, SecurityError> {
    let security = settings.security();
    let lifetime = expires_in
        .unwrap_or_else(|| Duration::minutes(security.access_token_expire_minutes as i64));
    let issued_at = OffsetDateTime::now_utc();

    let claims = Claims {
        sub: account_id.to_string(),
        iat: issued_at.unix_timestamp(),
        exp: (issued_at + lifetime).unix_timestamp(),
    };

    jsonwebtoken::encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(security.secret_key.as_bytes()),
    )
    .map_err(|_| SecurityError::TokenSigning)
}

pub(crate) fn verify_token(token: &str, settings: &Settings) -> Result<Claims, SecurityError> {
    let security = settings.security();
    let mut validation = Validation::new(security.algorithm);
    validation.set_required_spec_claims(&["exp", "sub"]);

    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(security.secret_key.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| SecurityError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn passwords_verify_only_against_their_hash() {
        let hash = hash_password("correct-horse-battery-staple").expect("hash");
        assert!(verify_password("correct-horse-battery-staple", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("password1").expect("hash");
        let second = hash_password("password1").expect("hash");
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(matches!(verify_password("anything", "not-a-phc"), Err(SecurityError::MalformedHash)));
    }

    #[tokio::test]
    async fn token_carries_account_id() {
        let settings = test_support::test_settings().await;

        let token = create_access_token("account-123", &settings, Some(Duration::minutes(1)))
            .expect("token");
        let claims = verify_token(&token, &settings).expect("claims");

        assert_eq!(claims.sub, "account-123");
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn expired_or_tampered_tokens_are_rejected() {
        let settings = test_support::test_settings().await;

        let expired = create_access_token("account-123", &settings, Some(Duration::minutes(-10)))
            .expect("token");
        assert!(matches!(verify_token(&expired, &settings), Err(SecurityError::InvalidToken)));

        let valid = create_access_token("account-123", &settings, None).expect("token");
        let tampered = format!("{valid}x");
        assert!(matches!(verify_token(&tampered, &settings), Err(SecurityError::InvalidToken)));
    }
}
