//! User administration, profile and the buyer-to-seller upgrade.

use mockable::Clock;
use thiserror::Error;
use tracing::instrument;

use marketplace_core::{Email, Patch, PhoneNumber, UserId};

use super::auth::{AuthError, TokenError, TokenService, hash_password, validate_password};
use super::{non_blank, required_text};
use crate::db::{RepositoryError, UserRepository};
use crate::models::{
    Address, AddressChanges, BankAccount, NewAddress, SellerUpgrade, User, UserChanges,
};

const EMPTY_PATCH: &str = "Request body cannot be empty. Provide at least one field to update";

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("address not found")]
    AddressNotFound,

    #[error("email already exists")]
    EmailTaken,

    #[error("user is already a seller")]
    AlreadySeller,

    #[error("{0}")]
    Validation(String),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marketplace_core::EmailError),

    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] marketplace_core::PhoneNumberError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for UserError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// `PUT /users/{id}` input. Blank strings are ignored.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AddressInput {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
}

/// `PATCH /users/profile` input.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub phone: Patch<String>,
    pub address_line1: Patch<String>,
    pub address_line2: Patch<String>,
    pub city: Patch<String>,
    pub state: Patch<String>,
    pub country: Patch<String>,
    pub postal_code: Patch<String>,
}

/// `POST /become-seller` input.
#[derive(Debug, Clone, Default)]
pub struct SellerApplication {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub bank_account_number: String,
    pub bank_code: String,
    /// Recorded as the bank account's `bank_name`.
    pub payment_type: String,
}

pub struct UserService<'a> {
    users: &'a dyn UserRepository,
    tokens: &'a TokenService,
    clock: &'a dyn Clock,
}

impl<'a> UserService<'a> {
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

    /// # Errors
    ///
    /// Repository failures only.
    pub async fn list(&self) -> Result<Vec<User>, UserError> {
        Ok(self.users.list().await?)
    }

    /// # Errors
    ///
    /// `InvalidEmail` or `NotFound`.
    pub async fn find_by_email(&self, email: &str) -> Result<User, UserError> {
        let email = Email::parse(email)?;
        self.users
            .find_by_email(&email)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    pub async fn get(&self, id: UserId) -> Result<User, UserError> {
        self.users.find_by_id(id).await?.ok_or(UserError::NotFound)
    }

    /// Apply a partial account update. A new password is re-hashed.
    ///
    /// # Errors
    ///
    /// `EmailTaken` if another account owns the new email, `NotFound`,
    /// or validation errors for malformed email, phone or password.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, UserError> {
        let existing = self.get(id).await?;

        let email = non_blank(update.email)
            .map(|e| Email::parse(&e))
            .transpose()?;
        if let Some(email) = &email {
            let owner = self.users.find_by_email(email).await?;
            if owner.is_some_and(|u| u.id != id) {
                return Err(UserError::EmailTaken);
            }
        }

        let phone = non_blank(update.phone)
            .map(|p| PhoneNumber::parse(&p))
            .transpose()?;

        let password_hash = match non_blank(update.password) {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            first_name: non_blank(update.first_name),
            last_name: non_blank(update.last_name),
            email,
            phone,
            password_hash,
        };
        if changes.is_empty() {
            return Ok(existing);
        }

        Ok(self.users.update(id, &changes).await?)
    }

    /// # Errors
    ///
    /// `NotFound` if the id is unknown.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: UserId) -> Result<(), UserError> {
        self.users.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// The caller's account and address, if one has been created.
    ///
    /// # Errors
    ///
    /// `NotFound` if the account no longer exists.
    pub async fn profile(&self, id: UserId) -> Result<(User, Option<Address>), UserError> {
        let user = self.get(id).await?;
        let address = self.users.find_address(id).await?;
        Ok((user, address))
    }

    /// # Errors
    ///
    /// `Validation` for blank required fields; a `Conflict` repository
    /// error if the user already has an address.
    #[instrument(skip(self, input))]
    pub async fn create_address(
        &self,
        id: UserId,
        input: AddressInput,
    ) -> Result<Address, UserError> {
        self.get(id).await?;

        let address = NewAddress {
            address_line1: required("address_line1", &input.address_line1)?,
            address_line2: non_blank(input.address_line2).unwrap_or_default(),
            city: required("city", &input.city)?,
            state: non_blank(input.state).unwrap_or_default(),
            country: required("country", &input.country)?,
            postal_code: non_blank(input.postal_code).unwrap_or_default(),
        };

        Ok(self.users.create_address(id, &address).await?)
    }

    /// Patch names, phone and address in one request.
    ///
    /// # Errors
    ///
    /// `AddressNotFound` before an address exists; `Validation` for an
    /// empty patch or a blanked required field.
    #[instrument(skip(self, patch))]
    pub async fn patch_profile(
        &self,
        id: UserId,
        patch: ProfilePatch,
    ) -> Result<(User, Address), UserError> {
        let user = self.get(id).await?;
        let address = self
            .users
            .find_address(id)
            .await?
            .ok_or(UserError::AddressNotFound)?;

        let user_changes = UserChanges {
            first_name: required_text("first_name", patch.first_name)
                .map_err(UserError::Validation)?,
            last_name: required_text("last_name", patch.last_name)
                .map_err(UserError::Validation)?,
            phone: required_text("phone", patch.phone)
                .map_err(UserError::Validation)?
                .map(|p| PhoneNumber::parse(&p))
                .transpose()?,
            ..UserChanges::default()
        };
        let address_changes = AddressChanges {
            address_line1: required_text("address_line1", patch.address_line1)
                .map_err(UserError::Validation)?,
            address_line2: clearable(patch.address_line2),
            city: required_text("city", patch.city).map_err(UserError::Validation)?,
            state: clearable(patch.state),
            country: required_text("country", patch.country).map_err(UserError::Validation)?,
            postal_code: clearable(patch.postal_code),
        };

        if user_changes.is_empty() && address_changes.is_empty() {
            return Err(UserError::Validation(EMPTY_PATCH.to_owned()));
        }

        let user = if user_changes.is_empty() {
            user
        } else {
            self.users.update(id, &user_changes).await?
        };
        let address = if address_changes.is_empty() {
            address
        } else {
            self.users
                .update_address(id, &address_changes)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => UserError::AddressNotFound,
                    other => UserError::Repository(other),
                })?
        };

        Ok((user, address))
    }

    /// Upgrade a buyer to seller, record their bank account and issue a
    /// token carrying the new role.
    ///
    /// # Errors
    ///
    /// `AlreadySeller` if the user is not a buyer (including when a
    /// concurrent upgrade won), `Validation` for missing fields.
    #[instrument(skip(self, application))]
    pub async fn become_seller(
        &self,
        id: UserId,
        application: SellerApplication,
    ) -> Result<(User, BankAccount, String), UserError> {
        let upgrade = SellerUpgrade {
            first_name: required("first_name", &application.first_name)?,
            last_name: required("last_name", &application.last_name)?,
            phone: PhoneNumber::parse(&required("phone_number", &application.phone_number)?)?,
            bank_name: required("payment_type", &application.payment_type)?,
            bank_account_number: required(
                "bank_account_number",
                &application.bank_account_number,
            )?,
            bank_code: required("bank_code", &application.bank_code)?,
        };

        if self.get(id).await?.user_type.is_seller() {
            return Err(UserError::AlreadySeller);
        }

        let (user, account) = self
            .users
            .upgrade_to_seller(id, &upgrade)
            .await?
            .ok_or(UserError::AlreadySeller)?;

        let token = self.tokens.issue(&user, self.clock.utc())?;
        tracing::info!(user_id = %id, "User joined the seller program");

        Ok((user, account, token))
    }
}

fn required(field: &str, value: &str) -> Result<String, UserError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UserError::Validation(format!("Field '{field}' is required")));
    }
    Ok(trimmed.to_owned())
}

/// Optional address columns are `NOT NULL DEFAULT ''`, so null clears to empty.
fn clearable(patch: Patch<String>) -> Option<String> {
    match patch {
        Patch::Absent => None,
        Patch::Null => Some(String::new()),
        Patch::Value(v) => Some(v.trim().to_owned()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mockable::DefaultClock;

    use marketplace_core::UserRole;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::services::auth::{AuthService, Registration};
    use crate::test_support::token_service;

    async fn register(store: &MemoryStore, tokens: &TokenService, email: &str, phone: &str) -> User {
        AuthService::new(store, tokens, &DefaultClock)
            .register(Registration {
                first_name: "Ada".to_owned(),
                last_name: "Obi".to_owned(),
                email: email.to_owned(),
                phone: phone.to_owned(),
                password: "correct horse".to_owned(),
            })
            .await
            .unwrap()
            .0
    }

    fn application() -> SellerApplication {
        SellerApplication {
            first_name: "Ada".to_owned(),
            last_name: "Seller".to_owned(),
            phone_number: "08030000009".to_owned(),
            bank_account_number: "0690000031".to_owned(),
            bank_code: "044".to_owned(),
            payment_type: "Access Bank".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_become_seller_once() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let user = register(&store, &tokens, "ada@example.com", "08030000001").await;
        let service = UserService::new(&store, &tokens, &DefaultClock);

        let (seller, account, token) = service.become_seller(user.id, application()).await.unwrap();
        assert_eq!(seller.user_type, UserRole::Seller);
        assert_eq!(seller.last_name, "Seller");
        assert_eq!(account.bank_name, "Access Bank");
        assert_eq!(tokens.verify(&token).unwrap().role, UserRole::Seller);

        let second = service.become_seller(user.id, application()).await;
        assert!(matches!(second, Err(UserError::AlreadySeller)));
        assert_eq!(store.bank_accounts(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_become_seller_requires_fields() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let user = register(&store, &tokens, "ada@example.com", "08030000001").await;
        let service = UserService::new(&store, &tokens, &DefaultClock);

        let err = service
            .become_seller(
                user.id,
                SellerApplication {
                    bank_code: " ".to_owned(),
                    ..application()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Field 'bank_code' is required");
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let ada = register(&store, &tokens, "ada@example.com", "08030000001").await;
        register(&store, &tokens, "bola@example.com", "08030000002").await;
        let service = UserService::new(&store, &tokens, &DefaultClock);

        let err = service
            .update(
                ada.id,
                UserUpdate {
                    email: Some("bola@example.com".to_owned()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::EmailTaken));

        let same = service
            .update(
                ada.id,
                UserUpdate {
                    email: Some("ada@example.com".to_owned()),
                    first_name: Some("Adaeze".to_owned()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.first_name, "Adaeze");
    }

    #[tokio::test]
    async fn test_update_rehashes_password() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let ada = register(&store, &tokens, "ada@example.com", "08030000001").await;
        UserService::new(&store, &tokens, &DefaultClock)
            .update(
                ada.id,
                UserUpdate {
                    password: Some("a brand new secret".to_owned()),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();

        let auth = AuthService::new(&store, &tokens, &DefaultClock);
        assert!(auth.login("ada@example.com", "correct horse").await.is_err());
        assert!(auth.login("ada@example.com", "a brand new secret").await.is_ok());
    }

    #[tokio::test]
    async fn test_profile_flow() {
        let store = MemoryStore::new();
        let tokens = token_service();
        let ada = register(&store, &tokens, "ada@example.com", "08030000001").await;
        let service = UserService::new(&store, &tokens, &DefaultClock);

        let patch_first = service.patch_profile(ada.id, ProfilePatch::default()).await;
        assert!(matches!(patch_first, Err(UserError::AddressNotFound)));

        let input = AddressInput {
            address_line1: "1 Marina".to_owned(),
            city: "Lagos".to_owned(),
            country: "NG".to_owned(),
            state: Some("Lagos".to_owned()),
            ..AddressInput::default()
        };
        service.create_address(ada.id, input.clone()).await.unwrap();
        let again = service.create_address(ada.id, input).await.unwrap_err();
        assert!(matches!(
            again,
            UserError::Repository(RepositoryError::Conflict { .. })
        ));

        let empty = service.patch_profile(ada.id, ProfilePatch::default()).await;
        assert!(matches!(empty, Err(UserError::Validation(_))));

        let (user, address) = service
            .patch_profile(
                ada.id,
                ProfilePatch {
                    first_name: Patch::Value("Adaeze".to_owned()),
                    city: Patch::Value("Abuja".to_owned()),
                    state: Patch::Null,
                    ..ProfilePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(user.first_name, "Adaeze");
        assert_eq!(address.city, "Abuja");
        assert_eq!(address.state, "");
        assert_eq!(address.address_line1, "1 Marina");
    }
}
