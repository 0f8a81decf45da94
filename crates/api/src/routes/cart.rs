//! Cart handlers.
//!
//! Every operation acts on the authenticated user's own cart. Lines are
//! addressed by product id, never by line id.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketplace_core::ProductId;

use super::users::MessageResponse;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{Json, Path, parse_id};
use crate::middleware::RequireAuth;
use crate::models::CartLine;
use crate::services::cart::CartUpdate;
use crate::state::AppState;

const INVALID_PRODUCT_ID: &str = "Invalid product ID";
const PRODUCT_ID_REQUIRED: &str = "Field 'product_id' is required";

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub message: &'static str,
    pub cart_item: CartLine,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub message: &'static str,
    pub data: Vec<CartLine>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: &'static str,
    pub removed: u64,
}

/// GET /cart
///
/// # Errors
///
/// Store failures only.
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let lines = state.cart().list(user.id).await?;

    Ok(Json(CartResponse {
        message: "Cart retrieved successfully",
        count: lines.len(),
        data: lines,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}

/// POST /cart
///
/// Adding a product already in the cart increases its quantity.
///
/// # Errors
///
/// 400 without a product id, for a negative quantity, or when the line
/// would exceed the quantity cap, 404 for an unknown product.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddRequest>,
) -> Result<Response> {
    let product_id = req
        .product_id
        .filter(|p| !p.is_unset())
        .ok_or_else(|| AppError::Validation(PRODUCT_ID_REQUIRED.to_owned()))?;

    let line = state.cart().add(user.id, product_id, req.quantity).await?;

    let product = product_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &product)]));

    Ok((
        StatusCode::CREATED,
        Json(CartItemResponse {
            message: "Item added to cart successfully",
            cart_item: line,
        }),
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
    pub price: Option<Decimal>,
}

/// PUT /cart
///
/// # Errors
///
/// 400 without a product id or for out-of-range values, 404 when the
/// product is not in the cart.
#[instrument(skip(state, user, req), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<CartItemResponse>> {
    let line = state
        .cart()
        .update(
            user.id,
            CartUpdate {
                product_id: req.product_id,
                quantity: req.quantity,
                price: req.price,
            },
        )
        .await?;

    Ok(Json(CartItemResponse {
        message: "Cart item updated successfully",
        cart_item: line,
    }))
}

/// DELETE /cart
///
/// Succeeds on an already empty cart.
///
/// # Errors
///
/// Store failures only.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ClearResponse>> {
    let removed = state.cart().clear(user.id).await?;

    Ok(Json(ClearResponse {
        message: "Cart cleared successfully",
        removed,
    }))
}

/// GET /cart/{product_id}
///
/// # Errors
///
/// 400 for a malformed id, 404 when the product is not in the cart.
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<String>,
) -> Result<Json<CartItemResponse>> {
    let product_id: ProductId = parse_id(&product_id, INVALID_PRODUCT_ID)?;
    let line = state.cart().get(user.id, product_id).await?;

    Ok(Json(CartItemResponse {
        message: "Cart item retrieved successfully",
        cart_item: line,
    }))
}

/// DELETE /cart/{product_id}
///
/// # Errors
///
/// 400 for a malformed id, 404 when the product is not in the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let product_id: ProductId = parse_id(&product_id, INVALID_PRODUCT_ID)?;
    state.cart().delete(user.id, product_id).await?;

    Ok(Json(MessageResponse {
        message: "Cart item deleted successfully",
    }))
}

/// POST /cart/{product_id}/increment
///
/// # Errors
///
/// 400 for a malformed id or at the quantity cap, 404 when the product is
/// not in the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn increment(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<String>,
) -> Result<Json<CartItemResponse>> {
    let product_id: ProductId = parse_id(&product_id, INVALID_PRODUCT_ID)?;
    let line = state.cart().increment(user.id, product_id).await?;

    Ok(Json(CartItemResponse {
        message: "Cart item quantity increased",
        cart_item: line,
    }))
}

/// POST /cart/{product_id}/decrement
///
/// # Errors
///
/// 400 at quantity 1 (delete the line instead), 404 when the product is
/// not in the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn decrement(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<String>,
) -> Result<Json<CartItemResponse>> {
    let product_id: ProductId = parse_id(&product_id, INVALID_PRODUCT_ID)?;
    let line = state.cart().decrement(user.id, product_id).await?;

    Ok(Json(CartItemResponse {
        message: "Cart item quantity decreased",
        cart_item: line,
    }))
}
