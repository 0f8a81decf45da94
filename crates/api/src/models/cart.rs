//! Cart line types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use marketplace_core::{CartLineId, Price, ProductId, UserId};

/// One product in a user's cart.
///
/// `name`, `image_url` and `price` are copied from the product the first
/// time it is added and are not refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Price,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert-or-merge payload for add-to-cart.
#[derive(Debug, Clone)]
pub struct NewCartLine {
    pub user_id: UserId,
    pub seller_id: UserId,
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Price,
    pub quantity: i32,
}
