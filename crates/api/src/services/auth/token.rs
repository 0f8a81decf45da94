//! Bearer token issuance and verification (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use marketplace_core::{UserId, UserRole};

use crate::models::User;

/// Token lifetime in seconds. There is no refresh; clients log in again.
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Errors from issuing or verifying a token.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,

    #[error("invalid token")]
    Invalid,

    #[error("failed to parse token: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies tokens with the shared `JWT_SECRET`.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Issue a token for `user` valid for [`TOKEN_TTL_SECS`] from `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the claims cannot be encoded.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id,
            email: user.email.as_str().to_owned(),
            role: user.user_type,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(TokenError::Signing)
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns `Expired`, `Invalid` (bad signature) or `Malformed`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::Invalid,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{Email, PhoneNumber};

    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(&SecretString::from(secret.to_owned()))
    }

    fn user() -> User {
        User {
            id: UserId::new(7),
            first_name: "Ada".to_owned(),
            last_name: "Obi".to_owned(),
            email: Email::parse("ada@example.com").unwrap(),
            phone: PhoneNumber::parse("08030000000").unwrap(),
            user_type: UserRole::Buyer,
            verified: false,
            code: 0,
            expiry: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("a-long-enough-signing-secret-0123456789");
        let token = tokens.issue(&user(), Utc::now()).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.sub, UserId::new(7));
        assert_eq!(claims.role, UserRole::Buyer);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_expired_token() {
        let tokens = service("a-long-enough-signing-secret-0123456789");
        let issued = Utc::now() - Duration::hours(2);
        let token = tokens.issue(&user(), issued).unwrap();

        assert!(matches!(tokens.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = service("a-long-enough-signing-secret-0123456789")
            .issue(&user(), Utc::now())
            .unwrap();
        let other = service("another-signing-secret-9876543210-abcdef");

        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_garbage_token() {
        let tokens = service("a-long-enough-signing-secret-0123456789");
        assert!(matches!(
            tokens.verify("not-a-token"),
            Err(TokenError::Malformed(_))
        ));
    }
}
