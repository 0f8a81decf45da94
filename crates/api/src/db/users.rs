//! User repository: accounts, profile addresses and seller bank accounts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marketplace_core::{Email, UserId};

use super::{RepositoryError, classify};
use crate::models::{
    Address, AddressChanges, BankAccount, NewAddress, NewUser, SellerUpgrade, User, UserChanges,
};

/// Storage contract for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new buyer account.
    ///
    /// Fails with `Conflict` on `users_email_key` or `users_phone_key`.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// The user together with their password hash, for login.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    /// Overwrite the columns set in `changes`. `NotFound` if the id is unknown.
    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError>;

    /// Hard delete; addresses, bank accounts and cart lines cascade.
    async fn delete(&self, id: UserId) -> Result<(), RepositoryError>;

    async fn set_verification_code(
        &self,
        id: UserId,
        code: i32,
        expiry: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    /// Flip `verified` on. The stored code is left in place.
    async fn mark_verified(&self, id: UserId) -> Result<(), RepositoryError>;

    /// Promote a buyer to seller and record their bank account atomically.
    ///
    /// Returns `Ok(None)` when the user is not currently a buyer, in which
    /// case nothing is written.
    async fn upgrade_to_seller(
        &self,
        id: UserId,
        upgrade: &SellerUpgrade,
    ) -> Result<Option<(User, BankAccount)>, RepositoryError>;

    async fn bank_accounts(&self, id: UserId) -> Result<Vec<BankAccount>, RepositoryError>;

    async fn find_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError>;

    /// Fails with `Conflict` on `addresses_user_id_key` if one already exists.
    async fn create_address(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError>;

    async fn update_address(
        &self,
        user_id: UserId,
        changes: &AddressChanges,
    ) -> Result<Address, RepositoryError>;
}

/// `PostgreSQL` implementation of [`UserRepository`].
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password: String,
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (first_name, last_name, email, phone, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, phone, user_type, verified,
                      code, expiry, created_at, updated_at
            ",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, first_name, last_name, email, phone, user_type, verified,
                   code, expiry, created_at, updated_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            SELECT id, first_name, last_name, email, phone, user_type, verified,
                   code, expiry, created_at, updated_at
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPassword>(
            r"
            SELECT id, first_name, last_name, email, phone, user_type, verified,
                   code, expiry, created_at, updated_at, password
            FROM users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password)))
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r"
            SELECT id, first_name, last_name, email, phone, user_type, verified,
                   code, expiry, created_at, updated_at
            FROM users
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update(&self, id: UserId, changes: &UserChanges) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                email      = COALESCE($4, email),
                phone      = COALESCE($5, phone),
                password   = COALESCE($6, password),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, first_name, last_name, email, phone, user_type, verified,
                      code, expiry, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .bind(changes.email.as_ref())
        .bind(changes.phone.as_ref())
        .bind(changes.password_hash.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn set_verification_code(
        &self,
        id: UserId,
        code: i32,
        expiry: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET code = $2, expiry = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(code)
        .bind(expiry)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn mark_verified(&self, id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET verified = TRUE, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn upgrade_to_seller(
        &self,
        id: UserId,
        upgrade: &SellerUpgrade,
    ) -> Result<Option<(User, BankAccount)>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // The role guard in the WHERE clause makes a concurrent second
        // upgrade match zero rows instead of writing a second bank account.
        let Some(user) = sqlx::query_as::<_, User>(
            r"
            UPDATE users
            SET first_name = $2, last_name = $3, phone = $4,
                user_type = 'seller', updated_at = NOW()
            WHERE id = $1 AND user_type = 'buyer'
            RETURNING id, first_name, last_name, email, phone, user_type, verified,
                      code, expiry, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&upgrade.first_name)
        .bind(&upgrade.last_name)
        .bind(&upgrade.phone)
        .fetch_optional(&mut *tx)
        .await
        .map_err(classify)?
        else {
            return Ok(None);
        };

        let account = sqlx::query_as::<_, BankAccount>(
            r"
            INSERT INTO bank_accounts (user_id, bank_name, bank_account_number, bank_code)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, bank_name, bank_account_number, bank_code,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&upgrade.bank_name)
        .bind(&upgrade.bank_account_number)
        .bind(&upgrade.bank_code)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        tx.commit().await?;

        Ok(Some((user, account)))
    }

    async fn bank_accounts(&self, id: UserId) -> Result<Vec<BankAccount>, RepositoryError> {
        let accounts = sqlx::query_as::<_, BankAccount>(
            r"
            SELECT id, user_id, bank_name, bank_account_number, bank_code,
                   created_at, updated_at
            FROM bank_accounts
            WHERE user_id = $1
            ORDER BY id ASC
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    async fn find_address(&self, user_id: UserId) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(
            r"
            SELECT id, user_id, address_line1, address_line2, city, state, country,
                   postal_code, created_at, updated_at
            FROM addresses
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(address)
    }

    async fn create_address(
        &self,
        user_id: UserId,
        address: &NewAddress,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>(
            r"
            INSERT INTO addresses
                (user_id, address_line1, address_line2, city, state, country, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, address_line1, address_line2, city, state, country,
                      postal_code, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(&address.address_line1)
        .bind(&address.address_line2)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.postal_code)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn update_address(
        &self,
        user_id: UserId,
        changes: &AddressChanges,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>(
            r"
            UPDATE addresses
            SET address_line1 = COALESCE($2, address_line1),
                address_line2 = COALESCE($3, address_line2),
                city          = COALESCE($4, city),
                state         = COALESCE($5, state),
                country       = COALESCE($6, country),
                postal_code   = COALESCE($7, postal_code),
                updated_at    = NOW()
            WHERE user_id = $1
            RETURNING id, user_id, address_line1, address_line2, city, state, country,
                      postal_code, created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(changes.address_line1.as_deref())
        .bind(changes.address_line2.as_deref())
        .bind(changes.city.as_deref())
        .bind(changes.state.as_deref())
        .bind(changes.country.as_deref())
        .bind(changes.postal_code.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
