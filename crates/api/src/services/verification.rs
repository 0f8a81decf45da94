//! Phone verification by one-time SMS code.

use chrono::Duration;
use mockable::Clock;
use rand::Rng;
use thiserror::Error;
use tracing::instrument;

use marketplace_core::UserId;

use super::sms::{SmsError, SmsSender};
use crate::db::{RepositoryError, UserRepository};

/// How long an issued code stays valid.
pub const CODE_TTL_MINUTES: i64 = 10;

/// Largest code; codes are sent zero-padded to six digits.
const MAX_CODE: i32 = 999_999;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("user not found")]
    UserNotFound,

    #[error("user is already verified")]
    AlreadyVerified,

    #[error("invalid verification code")]
    InvalidCode,

    #[error("verification code has expired")]
    Expired,

    #[error("failed to send verification code: {0}")]
    Sms(#[from] SmsError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct VerificationService<'a> {
    users: &'a dyn UserRepository,
    sms: &'a dyn SmsSender,
    clock: &'a dyn Clock,
}

impl<'a> VerificationService<'a> {
    #[must_use]
    pub const fn new(
        users: &'a dyn UserRepository,
        sms: &'a dyn SmsSender,
        clock: &'a dyn Clock,
    ) -> Self {
        Self { users, sms, clock }
    }

    /// Issue a fresh code and text it to the user's phone.
    ///
    /// The code is stored before sending, so a delivery failure still
    /// leaves it valid for a later verify.
    ///
    /// # Errors
    ///
    /// `AlreadyVerified` for verified users, `Sms` if delivery fails.
    #[instrument(skip(self))]
    pub async fn request_code(&self, user_id: UserId) -> Result<(), VerificationError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(VerificationError::UserNotFound)?;
        if user.verified {
            return Err(VerificationError::AlreadyVerified);
        }

        let code = rand::rng().random_range(0..=MAX_CODE);
        let expiry = self.clock.utc() + Duration::minutes(CODE_TTL_MINUTES);
        self.users
            .set_verification_code(user_id, code, expiry)
            .await?;

        let body = format!("Your verification code is {code:06}");
        self.sms.send(&user.phone.to_e164(), &body).await?;

        tracing::info!(%user_id, "Verification code sent");
        Ok(())
    }

    /// Check a submitted code and mark the user verified.
    ///
    /// A code is expired once `now >= expiry`.
    ///
    /// # Errors
    ///
    /// `AlreadyVerified`, `InvalidCode` or `Expired`.
    #[instrument(skip(self, code))]
    pub async fn verify_code(&self, user_id: UserId, code: i32) -> Result<(), VerificationError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(VerificationError::UserNotFound)?;
        if user.verified {
            return Err(VerificationError::AlreadyVerified);
        }
        if user.code != code {
            return Err(VerificationError::InvalidCode);
        }

        let now = self.clock.utc();
        if user.expiry.is_none_or(|expiry| expiry <= now) {
            return Err(VerificationError::Expired);
        }

        self.users.mark_verified(user_id).await?;
        tracing::info!(%user_id, "User verified");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplace_core::{Email, PhoneNumber};

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::models::NewUser;
    use crate::test_support::{FailingSms, FixtureClock, RecordingSms};

    async fn user(store: &MemoryStore) -> UserId {
        store
            .create(&NewUser {
                first_name: "Ada".to_owned(),
                last_name: "Obi".to_owned(),
                email: Email::parse("ada@example.com").unwrap(),
                phone: PhoneNumber::parse("08031234567").unwrap(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap()
            .id
    }

    async fn stored_code(store: &MemoryStore, id: UserId) -> i32 {
        store.find_by_id(id).await.unwrap().unwrap().code
    }

    async fn issue(store: &MemoryStore, sms: &RecordingSms, id: UserId) -> i32 {
        let clock = FixtureClock::at_minute(0);
        VerificationService::new(store, sms, &clock)
            .request_code(id)
            .await
            .unwrap();
        stored_code(store, id).await
    }

    #[tokio::test]
    async fn test_code_is_sent_to_e164_phone() {
        let store = MemoryStore::new();
        let sms = RecordingSms::default();
        let id = user(&store).await;

        let code = issue(&store, &sms, id).await;

        let sent = sms.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+2348031234567");
        assert!(sent[0].1.ends_with(&format!("{code:06}")));
    }

    #[tokio::test]
    async fn test_verify_within_window() {
        let store = MemoryStore::new();
        let sms = RecordingSms::default();
        let id = user(&store).await;
        let code = issue(&store, &sms, id).await;

        let clock = FixtureClock::at_minute(9);
        VerificationService::new(&store, &sms, &clock)
            .verify_code(id, code)
            .await
            .unwrap();

        let user = store.find_by_id(id).await.unwrap().unwrap();
        assert!(user.verified);
        assert_eq!(user.code, code);
    }

    #[tokio::test]
    async fn test_expired_after_eleven_minutes() {
        let store = MemoryStore::new();
        let sms = RecordingSms::default();
        let id = user(&store).await;
        let code = issue(&store, &sms, id).await;

        let clock = FixtureClock::at_minute(11);
        let result = VerificationService::new(&store, &sms, &clock)
            .verify_code(id, code)
            .await;

        assert!(matches!(result, Err(VerificationError::Expired)));
        assert!(!store.find_by_id(id).await.unwrap().unwrap().verified);
    }

    #[tokio::test]
    async fn test_expiry_instant_counts_as_expired() {
        let store = MemoryStore::new();
        let sms = RecordingSms::default();
        let id = user(&store).await;
        let code = issue(&store, &sms, id).await;

        let clock = FixtureClock::at_minute(10);
        let result = VerificationService::new(&store, &sms, &clock)
            .verify_code(id, code)
            .await;
        assert!(matches!(result, Err(VerificationError::Expired)));
    }

    #[tokio::test]
    async fn test_wrong_code() {
        let store = MemoryStore::new();
        let sms = RecordingSms::default();
        let id = user(&store).await;
        let wrong = (issue(&store, &sms, id).await + 1) % (MAX_CODE + 1);

        let clock = FixtureClock::at_minute(1);
        let result = VerificationService::new(&store, &sms, &clock)
            .verify_code(id, wrong)
            .await;
        assert!(matches!(result, Err(VerificationError::InvalidCode)));
    }

    #[tokio::test]
    async fn test_already_verified() {
        let store = MemoryStore::new();
        let sms = RecordingSms::default();
        let id = user(&store).await;
        store.mark_verified(id).await.unwrap();
        let clock = FixtureClock::at_minute(0);
        let service = VerificationService::new(&store, &sms, &clock);

        assert!(matches!(
            service.request_code(id).await,
            Err(VerificationError::AlreadyVerified)
        ));
        assert!(matches!(
            service.verify_code(id, 0).await,
            Err(VerificationError::AlreadyVerified)
        ));
    }

    #[tokio::test]
    async fn test_send_failure_keeps_code() {
        let store = MemoryStore::new();
        let id = user(&store).await;
        let clock = FixtureClock::at_minute(0);

        let result = VerificationService::new(&store, &FailingSms, &clock)
            .request_code(id)
            .await;

        assert!(matches!(result, Err(VerificationError::Sms(_))));
        assert!(store.find_by_id(id).await.unwrap().unwrap().expiry.is_some());
    }
}
