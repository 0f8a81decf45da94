//! Cart rules: one line per (user, product), merged on repeat adds.

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use marketplace_core::{Price, ProductId, UserId};

use crate::db::{CartRepository, CatalogueRepository, RepositoryError};
use crate::models::{CartLine, NewCartLine};

/// Largest quantity a single cart line may hold.
pub const MAX_QUANTITY: i32 = 10_000;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("{0}")]
    Validation(String),

    #[error("product not found")]
    ProductNotFound,

    #[error("cart item not found")]
    ItemNotFound,

    #[error("quantity cannot be less than 1, use delete to remove the item")]
    QuantityFloor,

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CartError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::ItemNotFound,
            other => Self::Repository(other),
        }
    }
}

/// `PUT /cart` input.
#[derive(Debug, Clone, Default)]
pub struct CartUpdate {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
}

pub struct CartService<'a> {
    carts: &'a dyn CartRepository,
    catalogue: &'a dyn CatalogueRepository,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(carts: &'a dyn CartRepository, catalogue: &'a dyn CatalogueRepository) -> Self {
        Self { carts, catalogue }
    }

    /// Add a product, or grow the existing line by `quantity`.
    ///
    /// A missing or zero quantity counts as one. The line's name, image,
    /// price and seller are copied from the product on first add only.
    ///
    /// # Errors
    ///
    /// `Validation` for a negative quantity or one that would take the line
    /// past [`MAX_QUANTITY`], `ProductNotFound`.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: Option<i32>,
    ) -> Result<CartLine, CartError> {
        let quantity = match quantity.unwrap_or(0) {
            q if q < 0 => {
                return Err(CartError::Validation(
                    "quantity cannot be negative".to_owned(),
                ));
            }
            0 => 1,
            q => q,
        };
        let merged = match self.carts.get(user_id, product_id).await? {
            Some(existing) => existing.quantity.checked_add(quantity),
            None => Some(quantity),
        };
        capped(merged)?;

        let product = self
            .catalogue
            .get_product(product_id)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        let line = NewCartLine {
            user_id,
            seller_id: product.seller_id,
            product_id,
            name: product.name,
            image_url: product.image_url,
            price: product.price,
            quantity,
        };
        Ok(self.carts.add(&line).await?)
    }

    /// # Errors
    ///
    /// `ItemNotFound` if the product is not in the cart.
    pub async fn get(&self, user_id: UserId, product_id: ProductId) -> Result<CartLine, CartError> {
        self.carts
            .get(user_id, product_id)
            .await?
            .ok_or(CartError::ItemNotFound)
    }

    /// # Errors
    ///
    /// Repository failures only.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CartLine>, CartError> {
        Ok(self.carts.list(user_id).await?)
    }

    /// Override quantity and/or price of an existing line.
    ///
    /// # Errors
    ///
    /// `Validation` if `product_id` is missing or a value is out of range,
    /// `ItemNotFound` if there is no line.
    #[instrument(skip(self))]
    pub async fn update(&self, user_id: UserId, update: CartUpdate) -> Result<CartLine, CartError> {
        let product_id = update
            .product_id
            .filter(|p| !p.is_unset())
            .ok_or_else(|| CartError::Validation("product_id is required".to_owned()))?;
        if update.quantity.is_some_and(|q| q < 1) {
            return Err(CartError::Validation(
                "quantity must be at least 1".to_owned(),
            ));
        }
        if let Some(q) = update.quantity {
            capped(Some(q))?;
        }
        let price = update
            .price
            .map(Price::new)
            .transpose()
            .map_err(|_| CartError::Validation("price must be greater than 0".to_owned()))?;

        Ok(self
            .carts
            .update(user_id, product_id, update.quantity, price)
            .await?)
    }

    /// # Errors
    ///
    /// `Validation` at [`MAX_QUANTITY`], `ItemNotFound` if there is no line.
    #[instrument(skip(self))]
    pub async fn increment(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartLine, CartError> {
        let line = self.get(user_id, product_id).await?;
        let quantity = capped(line.quantity.checked_add(1))?;
        Ok(self
            .carts
            .set_quantity(user_id, product_id, quantity)
            .await?)
    }

    /// Decrease by one, never below one.
    ///
    /// # Errors
    ///
    /// `QuantityFloor` at quantity 1 (the line is left untouched),
    /// `ItemNotFound` if there is no line.
    #[instrument(skip(self))]
    pub async fn decrement(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<CartLine, CartError> {
        let line = self.get(user_id, product_id).await?;
        if line.quantity <= 1 {
            return Err(CartError::QuantityFloor);
        }
        Ok(self
            .carts
            .set_quantity(user_id, product_id, line.quantity - 1)
            .await?)
    }

    /// # Errors
    ///
    /// `ItemNotFound` if there is no line.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, product_id: ProductId) -> Result<(), CartError> {
        Ok(self.carts.delete(user_id, product_id).await?)
    }

    /// Empty the cart. Clearing an empty cart succeeds.
    ///
    /// # Errors
    ///
    /// Repository failures only.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<u64, CartError> {
        let removed = self.carts.clear(user_id).await?;
        tracing::debug!(%user_id, removed, "Cart cleared");
        Ok(removed)
    }
}

fn capped(quantity: Option<i32>) -> Result<i32, CartError> {
    quantity.filter(|q| *q <= MAX_QUANTITY).ok_or_else(|| {
        CartError::Validation(format!("quantity cannot exceed {MAX_QUANTITY}"))
    })
}
