//! Category and product handlers.
//!
//! Reads are public and mirrored under `/seller`; writes are seller-only and
//! act on behalf of the authenticated seller.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketplace_core::{CategoryId, DateRange, Page, Pagination, Patch, ProductId};

use super::users::MessageResponse;
use crate::error::{AppError, Result};
use crate::extract::{Json, Path, Query, parse_id};
use crate::middleware::RequireSeller;
use crate::models::{Category, CategoryFilter, Product, ProductFilter};
use crate::services::catalogue::{CategoryInput, ProductInput, ProductPatch};
use crate::state::AppState;

const INVALID_CATEGORY_ID: &str = "Invalid category ID";
const INVALID_PRODUCT_ID: &str = "Invalid product ID";
const INVALID_BEGINNING: &str =
    "Invalid beginning date format. Use ISO 8601 format (e.g., 2024-01-01T00:00:00Z)";
const INVALID_ENDING: &str =
    "Invalid ending date format. Use ISO 8601 format (e.g., 2024-02-01T00:00:00Z)";

/// List response: `{ message, data, pagination }`.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub message: &'static str,
    #[serde(flatten)]
    pub page: Page<T>,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub message: &'static str,
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub message: &'static str,
    pub product: Product,
}

// =============================================================================
// Query Parameters
// =============================================================================

/// Shared list query. Dates are RFC 3339 and validated here so the error
/// can name the offending bound.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub take: Option<i64>,
    pub skip: Option<i64>,
    pub search: Option<String>,
    pub beginning: Option<String>,
    pub ending: Option<String>,
    pub parent_id: Option<i32>,
}

impl ListQuery {
    fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }

    fn created(&self) -> Result<DateRange> {
        Ok(DateRange {
            beginning: parse_date(self.beginning.as_deref(), INVALID_BEGINNING)?,
            ending: parse_date(self.ending.as_deref(), INVALID_ENDING)?,
        })
    }

    fn page(&self) -> Pagination {
        Pagination::new(self.take, self.skip)
    }
}

fn parse_date(raw: Option<&str>, message: &str) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| Some(d.with_timezone(&Utc)))
            .map_err(|_| AppError::Validation(message.to_owned())),
    }
}

// =============================================================================
// Categories
// =============================================================================

/// GET /categories
///
/// # Errors
///
/// 400 for an unparseable date bound.
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Category>>> {
    let filter = CategoryFilter {
        search: query.search(),
        created: query.created()?,
        parent_id: query.parent_id.filter(|&p| p > 0).map(CategoryId::new),
        page: query.page(),
    };
    let page = state.catalogue().list_categories(&filter).await?;

    Ok(Json(ListResponse {
        message: "Categories retrieved successfully",
        page,
    }))
}

/// GET /categories/{id}
///
/// # Errors
///
/// 400 for a malformed id, 404 when unknown.
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CategoryResponse>> {
    let id: CategoryId = parse_id(&id, INVALID_CATEGORY_ID)?;
    let category = state.catalogue().get_category(id).await?;

    Ok(Json(CategoryResponse {
        message: "Category retrieved successfully",
        category,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub display_order: Option<i32>,
}

impl From<CategoryRequest> for CategoryInput {
    fn from(req: CategoryRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            parent_id: req.parent_id,
            image_url: req.image_url,
            display_order: req.display_order,
        }
    }
}

/// POST /seller/categories
///
/// # Errors
///
/// 400 for a blank name.
#[instrument(skip(state, seller, req), fields(seller_id = %seller.id))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Json(req): Json<CategoryRequest>,
) -> Result<Response> {
    let category = state
        .catalogue()
        .create_category(seller.id, req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            message: "Category created successfully",
            category,
        }),
    )
        .into_response())
}

/// PATCH /seller/categories/{id}
///
/// # Errors
///
/// 400 for a blank name, 404 when unknown.
#[instrument(skip(state, _seller, req))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireSeller(_seller): RequireSeller,
    Path(id): Path<String>,
    Json(req): Json<CategoryRequest>,
) -> Result<Json<CategoryResponse>> {
    let id: CategoryId = parse_id(&id, INVALID_CATEGORY_ID)?;
    let category = state.catalogue().update_category(id, req.into()).await?;

    Ok(Json(CategoryResponse {
        message: "Category updated successfully",
        category,
    }))
}

/// DELETE /seller/categories/{id}
///
/// # Errors
///
/// 409 while products still reference the category, 404 when unknown.
#[instrument(skip(state, _seller))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireSeller(_seller): RequireSeller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id: CategoryId = parse_id(&id, INVALID_CATEGORY_ID)?;
    state.catalogue().delete_category(id).await?;

    Ok(Json(MessageResponse {
        message: "Category deleted successfully",
    }))
}

// =============================================================================
// Products
// =============================================================================

/// GET /products
///
/// # Errors
///
/// 400 for an unparseable date bound.
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<Product>>> {
    let filter = ProductFilter {
        search: query.search(),
        created: query.created()?,
        page: query.page(),
    };
    let page = state.catalogue().list_products(&filter).await?;

    Ok(Json(ListResponse {
        message: "Products retrieved successfully",
        page,
    }))
}

/// GET /products/{id}
///
/// # Errors
///
/// 400 for a malformed id, 404 when unknown.
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductResponse>> {
    let id: ProductId = parse_id(&id, INVALID_PRODUCT_ID)?;
    let product = state.catalogue().get_product(id).await?;

    Ok(Json(ProductResponse {
        message: "Product retrieved successfully",
        product,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub stock: i32,
    pub image_url: Option<String>,
}

impl From<ProductRequest> for ProductInput {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            price: req.price,
            category_id: req.category_id,
            stock: req.stock,
            image_url: req.image_url,
        }
    }
}

/// POST /seller/products
///
/// # Errors
///
/// 400 for invalid fields or an unknown category.
#[instrument(skip(state, seller, req), fields(seller_id = %seller.id))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Json(req): Json<ProductRequest>,
) -> Result<Response> {
    let product = state
        .catalogue()
        .create_product(seller.id, req.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created successfully",
            product,
        }),
    )
        .into_response())
}

/// PUT /seller/products/{id}
///
/// # Errors
///
/// 400 for invalid fields, 401 for another seller's product, 404 when
/// unknown.
#[instrument(skip(state, seller, req), fields(seller_id = %seller.id))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
    Json(req): Json<ProductRequest>,
) -> Result<Json<ProductResponse>> {
    let id: ProductId = parse_id(&id, INVALID_PRODUCT_ID)?;
    let product = state
        .catalogue()
        .update_product(id, seller.id, req.into())
        .await?;

    Ok(Json(ProductResponse {
        message: "Product updated successfully",
        product,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductPatchRequest {
    pub name: Patch<String>,
    pub description: Patch<String>,
    pub price: Patch<Decimal>,
    pub category_id: Patch<CategoryId>,
    pub stock: Patch<i32>,
    pub image_url: Patch<String>,
}

/// PATCH /seller/products/{id}
///
/// # Errors
///
/// 400 for an empty body or invalid present fields, 401 for another
/// seller's product, 404 when unknown.
#[instrument(skip(state, seller, req), fields(seller_id = %seller.id))]
pub async fn patch_product(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
    Json(req): Json<ProductPatchRequest>,
) -> Result<Json<ProductResponse>> {
    let id: ProductId = parse_id(&id, INVALID_PRODUCT_ID)?;
    let patch = ProductPatch {
        name: req.name,
        description: req.description,
        price: req.price,
        category_id: req.category_id,
        stock: req.stock,
        image_url: req.image_url,
    };
    let product = state
        .catalogue()
        .patch_product(id, seller.id, patch)
        .await?;

    Ok(Json(ProductResponse {
        message: "Product updated successfully",
        product,
    }))
}

/// DELETE /seller/products/{id}
///
/// Any seller may delete any product.
///
/// # Errors
///
/// 404 when unknown.
#[instrument(skip(state, seller), fields(seller_id = %seller.id))]
pub async fn delete_product(
    State(state): State<AppState>,
    RequireSeller(seller): RequireSeller,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id: ProductId = parse_id(&id, INVALID_PRODUCT_ID)?;
    state.catalogue().delete_product(id).await?;

    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}
