//! Persistence for the marketplace `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Buyer and seller accounts, verification code state
//! - `addresses` - One profile address per user
//! - `bank_accounts` - Payout accounts captured at seller upgrade
//! - `categories` - Seller-owned, optionally nested
//! - `products` - Seller-owned, each in exactly one category
//! - `cart_items` - Per-user lines keyed by product
//!
//! Each table group sits behind a repository trait ([`UserRepository`],
//! [`CatalogueRepository`], [`CartRepository`]) with a Postgres
//! implementation here and an in-memory one in [`memory`] for tests.
//!
//! # Migrations
//!
//! Migrations live in `crates/api/migrations/`. The API applies them at
//! startup; they can also be run ahead of a deploy with:
//! ```bash
//! cargo run -p marketplace-cli -- migrate
//! ```

pub mod cart;
pub mod catalogue;
#[cfg(any(test, feature = "memory-store"))]
pub mod memory;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use cart::{CartRepository, PgCartRepository};
pub use catalogue::{CatalogueRepository, PgCatalogueRepository};
pub use users::{PgUserRepository, UserRepository};

/// Names of the constraints the error layer translates for clients.
pub mod constraints {
    pub const USERS_EMAIL: &str = "users_email_key";
    pub const USERS_PHONE: &str = "users_phone_key";
    pub const ADDRESSES_USER: &str = "addresses_user_id_key";
    pub const PRODUCTS_CATEGORY: &str = "products_category_id_fkey";
    pub const CART_USER_PRODUCT: &str = "cart_items_user_product_key";
}

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation (e.g., email already registered).
    #[error("constraint violation on {constraint}: {detail}")]
    Conflict { constraint: String, detail: String },

    /// Foreign key violation (missing parent row, or children still present).
    #[error("foreign key violation on {constraint}: {detail}")]
    ForeignKey { constraint: String, detail: String },

    /// A value overflowed its column (SQLSTATE 22003).
    #[error("value out of range: {detail}")]
    OutOfRange { detail: String },
}

impl RepositoryError {
    /// Build a unique-violation error the way Postgres reports it.
    #[must_use]
    pub fn conflict(constraint: &str) -> Self {
        Self::Conflict {
            constraint: constraint.to_owned(),
            detail: format!("duplicate key value violates unique constraint \"{constraint}\""),
        }
    }

    /// Build a foreign-key error the way Postgres reports it.
    #[must_use]
    pub fn foreign_key(table: &str, operation: &str, constraint: &str) -> Self {
        Self::ForeignKey {
            constraint: constraint.to_owned(),
            detail: format!(
                "{operation} on table \"{table}\" violates foreign key constraint \"{constraint}\""
            ),
        }
    }

    /// The violated constraint, if this is a constraint error.
    #[must_use]
    pub fn constraint(&self) -> Option<&str> {
        match self {
            Self::Conflict { constraint, .. } | Self::ForeignKey { constraint, .. } => {
                Some(constraint)
            }
            _ => None,
        }
    }

    /// Whether the database itself could not be reached.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Database(sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed)
        )
    }
}

const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Classify a sqlx error, lifting constraint violations into typed variants.
pub(crate) fn classify(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        let constraint = db_err.constraint().unwrap_or_default().to_owned();
        let detail = db_err.message().to_owned();
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict { constraint, detail };
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::ForeignKey { constraint, detail };
        }
        if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
            return RepositoryError::OutOfRange { detail };
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply any pending schema migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
