//! Authentication service.
//!
//! Password registration and login. Both hand back a freshly issued bearer
//! token alongside the account.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, TOKEN_TTL_SECS, TokenError, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use mockable::Clock;
use tracing::instrument;

use marketplace_core::{Email, PhoneNumber};

use crate::db::UserRepository;
use crate::models::{NewUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Registration input as received from the client.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserRepository,
    tokens: &'a TokenService,
    clock: &'a dyn Clock,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        users: &'a dyn UserRepository,
        tokens: &'a TokenService,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            users,
            tokens,
            clock,
        }
    }

    /// Register a new buyer account and issue its first token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` / `InvalidPhone` for malformed input.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::Repository` with a `Conflict` if the email or phone
    /// is already registered.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: Registration) -> Result<(User, String), AuthError> {
        let email = Email::parse(&input.email)?;
        let phone = PhoneNumber::parse(&input.phone)?;
        let first_name = required("first_name", &input.first_name)?;
        let last_name = required("last_name", &input.last_name)?;
        validate_password(&input.password)?;

        let password_hash = hash_password(&input.password)?;

        let user = self
            .users
            .create(&NewUser {
                first_name,
                last_name,
                email,
                phone,
                password_hash,
            })
            .await?;

        let token = self.tokens.issue(&user, self.clock.utc())?;
        tracing::info!(user_id = %user.id, "User registered");

        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account matches the email and
    /// `AuthError::InvalidCredentials` if the password is wrong. Callers
    /// report both identically.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::UserNotFound)?;

        let Some((user, password_hash)) = self.users.find_credentials(&email).await? else {
            tracing::debug!("Login failed: unknown email");
            return Err(AuthError::UserNotFound);
        };

        if let Err(e) = verify_password(password, &password_hash) {
            tracing::debug!(user_id = %user.id, "Login failed: wrong password");
            return Err(e);
        }

        let token = self.tokens.issue(&user, self.clock.utc())?;
        Ok((user, token))
    }
}

fn required(field: &'static str, value: &str) -> Result<String, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(trimmed.to_owned())
}

/// Validate password requirements.
pub(crate) fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mockable::DefaultClock;
    use secrecy::SecretString;

    use marketplace_core::UserRole;

    use super::*;
    use crate::db::RepositoryError;
    use crate::db::memory::MemoryStore;

    fn tokens() -> TokenService {
        TokenService::new(&SecretString::from(
            "a-long-enough-signing-secret-0123456789".to_owned(),
        ))
    }

    fn registration(email: &str, phone: &str) -> Registration {
        Registration {
            first_name: "Ada".to_owned(),
            last_name: "Obi".to_owned(),
            email: email.to_owned(),
            phone: phone.to_owned(),
            password: "correct horse".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens, &DefaultClock);

        let (user, _) = auth
            .register(registration("ada@example.com", "08030000001"))
            .await
            .unwrap();
        assert_eq!(user.user_type, UserRole::Buyer);

        let (_, token) = auth.login("ada@example.com", "correct horse").await.unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.role, UserRole::Buyer);
    }

    #[tokio::test]
    async fn test_login_failures_are_distinct_internally() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens, &DefaultClock);
        auth.register(registration("ada@example.com", "08030000001"))
            .await
            .unwrap();

        assert!(matches!(
            auth.login("ada@example.com", "wrong password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "correct horse").await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let tokens = tokens();
        let auth = AuthService::new(&store, &tokens, &DefaultClock);
        auth.register(registration("ada@example.com", "08030000001"))
            .await
            .unwrap();

        let err = auth
            .register(registration("ada@example.com", "08030000002"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::Repository(RepositoryError::Conflict { .. })
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(matches!(
            validate_password("ééééééé"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("éééééééé").is_ok());
    }

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }
}
