//! Cart repository.

use async_trait::async_trait;
use sqlx::PgPool;

use marketplace_core::{Price, ProductId, UserId};

use super::{RepositoryError, classify};
use crate::models::{CartLine, NewCartLine};

/// Storage contract for cart lines, keyed by `(user_id, product_id)`.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Insert a line, or add `line.quantity` to the existing one.
    ///
    /// The snapshot columns of an existing line are left untouched.
    async fn add(&self, line: &NewCartLine) -> Result<CartLine, RepositoryError>;

    async fn get(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError>;

    /// Every line for the user, oldest first.
    async fn list(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError>;

    /// Overwrite quantity and/or price; `None` keeps the stored value.
    async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Option<i32>,
        price: Option<Price>,
    ) -> Result<CartLine, RepositoryError>;

    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError>;

    async fn delete(&self, user_id: UserId, product_id: ProductId)
    -> Result<(), RepositoryError>;

    /// Remove every line for the user, returning how many went.
    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}

/// `PostgreSQL` implementation of [`CartRepository`].
#[derive(Clone)]
pub struct PgCartRepository {
    pool: PgPool,
}

impl PgCartRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn add(&self, line: &NewCartLine) -> Result<CartLine, RepositoryError> {
        sqlx::query_as::<_, CartLine>(
            r"
            INSERT INTO cart_items
                (user_id, seller_id, product_id, name, image_url, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT cart_items_user_product_key DO UPDATE
            SET quantity   = cart_items.quantity + EXCLUDED.quantity,
                updated_at = NOW()
            RETURNING id, user_id, seller_id, product_id, name, image_url, price, quantity,
                      created_at, updated_at
            ",
        )
        .bind(line.user_id)
        .bind(line.seller_id)
        .bind(line.product_id)
        .bind(&line.name)
        .bind(&line.image_url)
        .bind(line.price)
        .bind(line.quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn get(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let line = sqlx::query_as::<_, CartLine>(
            r"
            SELECT id, user_id, seller_id, product_id, name, image_url, price, quantity,
                   created_at, updated_at
            FROM cart_items
            WHERE user_id = $1 AND product_id = $2
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT id, user_id, seller_id, product_id, name, image_url, price, quantity,
                   created_at, updated_at
            FROM cart_items
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn update(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Option<i32>,
        price: Option<Price>,
    ) -> Result<CartLine, RepositoryError> {
        sqlx::query_as::<_, CartLine>(
            r"
            UPDATE cart_items
            SET quantity   = COALESCE($3, quantity),
                price      = COALESCE($4, price),
                updated_at = NOW()
            WHERE user_id = $1 AND product_id = $2
            RETURNING id, user_id, seller_id, product_id, name, image_url, price, quantity,
                      created_at, updated_at
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?
        .ok_or(RepositoryError::NotFound)
    }

    async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartLine, RepositoryError> {
        self.update(user_id, product_id, Some(quantity), None).await
    }

    async fn delete(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
