//! Category and product repository.

use async_trait::async_trait;
use sqlx::PgPool;

use marketplace_core::{CategoryId, ProductId, UserId};

use super::{RepositoryError, classify};
use crate::models::{
    Category, CategoryChanges, CategoryFilter, NewCategory, NewProduct, Product, ProductChanges,
    ProductFilter,
};

/// Storage contract for the seller catalogue.
#[async_trait]
pub trait CatalogueRepository: Send + Sync {
    async fn create_category(
        &self,
        seller_id: UserId,
        category: &NewCategory,
    ) -> Result<Category, RepositoryError>;

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError>;

    /// One page of categories plus the filtered total before paging.
    ///
    /// Ordered by `display_order` ascending, newest first within a tie.
    async fn list_categories(
        &self,
        filter: &CategoryFilter,
    ) -> Result<(Vec<Category>, i64), RepositoryError>;

    async fn update_category(
        &self,
        id: CategoryId,
        changes: &CategoryChanges,
    ) -> Result<Category, RepositoryError>;

    async fn count_products_in_category(&self, id: CategoryId) -> Result<i64, RepositoryError>;

    /// `NotFound` for an unknown id, `ForeignKey` while products remain.
    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError>;

    /// `ForeignKey` on `products_category_id_fkey` for an unknown category.
    async fn create_product(
        &self,
        seller_id: UserId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// One page of products, newest first, plus the filtered total.
    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError>;

    async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError>;

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError>;
}

/// `PostgreSQL` implementation of [`CatalogueRepository`].
#[derive(Clone)]
pub struct PgCatalogueRepository {
    pool: PgPool,
}

impl PgCatalogueRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogueRepository for PgCatalogueRepository {
    async fn create_category(
        &self,
        seller_id: UserId,
        category: &NewCategory,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            INSERT INTO categories (name, description, parent_id, image_url, seller_id, display_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, parent_id, image_url, seller_id, display_order, description,
                      created_at, updated_at
            ",
        )
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id)
        .bind(&category.image_url)
        .bind(seller_id)
        .bind(category.display_order)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, parent_id, image_url, seller_id, display_order, description,
                   created_at, updated_at
            FROM categories
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    async fn list_categories(
        &self,
        filter: &CategoryFilter,
    ) -> Result<(Vec<Category>, i64), RepositoryError> {
        let search = filter.search.as_deref().map(escape_like);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM categories
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%' ESCAPE '\'
                   OR description ILIKE '%' || $1 || '%' ESCAPE '\')
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
              AND ($4::integer IS NULL OR parent_id = $4)
            ",
        )
        .bind(search.as_deref())
        .bind(filter.created.beginning)
        .bind(filter.created.ending)
        .bind(filter.parent_id)
        .fetch_one(&self.pool)
        .await?;

        let categories = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, parent_id, image_url, seller_id, display_order, description,
                   created_at, updated_at
            FROM categories
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%' ESCAPE '\'
                   OR description ILIKE '%' || $1 || '%' ESCAPE '\')
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
              AND ($4::integer IS NULL OR parent_id = $4)
            ORDER BY display_order ASC, created_at DESC
            LIMIT $5 OFFSET $6
            ",
        )
        .bind(search.as_deref())
        .bind(filter.created.beginning)
        .bind(filter.created.ending)
        .bind(filter.parent_id)
        .bind(filter.page.take())
        .bind(filter.page.skip())
        .fetch_all(&self.pool)
        .await?;

        Ok((categories, total))
    }

    async fn update_category(
        &self,
        id: CategoryId,
        changes: &CategoryChanges,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            r"
            UPDATE categories
            SET name          = $2,
                description   = COALESCE($3, description),
                parent_id     = COALESCE($4, parent_id),
                image_url     = COALESCE($5, image_url),
                display_order = COALESCE($6, display_order),
                updated_at    = NOW()
            WHERE id = $1
            RETURNING id, name, parent_id, image_url, seller_id, display_order, description,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.description.as_deref())
        .bind(changes.parent_id)
        .bind(changes.image_url.as_deref())
        .bind(changes.display_order)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?
        .ok_or(RepositoryError::NotFound)
    }

    async fn count_products_in_category(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn create_product(
        &self,
        seller_id: UserId,
        product: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products (name, description, price, category_id, stock, image_url, seller_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, description, price, category_id, stock, image_url, seller_id,
                      created_at, updated_at
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.category_id)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(seller_id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, category_id, stock, image_url, seller_id,
                   created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let search = filter.search.as_deref().map(escape_like);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM products
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%' ESCAPE '\'
                   OR description ILIKE '%' || $1 || '%' ESCAPE '\')
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ",
        )
        .bind(search.as_deref())
        .bind(filter.created.beginning)
        .bind(filter.created.ending)
        .fetch_one(&self.pool)
        .await?;

        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, category_id, stock, image_url, seller_id,
                   created_at, updated_at
            FROM products
            WHERE ($1::text IS NULL
                   OR name ILIKE '%' || $1 || '%' ESCAPE '\'
                   OR description ILIKE '%' || $1 || '%' ESCAPE '\')
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            ",
        )
        .bind(search.as_deref())
        .bind(filter.created.beginning)
        .bind(filter.created.ending)
        .bind(filter.page.take())
        .bind(filter.page.skip())
        .fetch_all(&self.pool)
        .await?;

        Ok((products, total))
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            r"
            UPDATE products
            SET name        = $2,
                description = $3,
                price       = $4,
                category_id = $5,
                stock       = $6,
                image_url   = $7,
                updated_at  = NOW()
            WHERE id = $1
            RETURNING id, name, description, price, category_id, stock, image_url, seller_id,
                      created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(changes.category_id)
        .bind(changes.stock)
        .bind(&changes.image_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(classify)?
        .ok_or(RepositoryError::NotFound)
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

/// Escape `LIKE` wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
