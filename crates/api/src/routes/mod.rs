//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (database ping)
//!
//! # Public
//! POST /register                      - Create a buyer account, returns a token
//! POST /login                         - Exchange credentials for a token
//! GET  /categories                    - Category listing (search, dates, parent_id, take/skip)
//! GET  /categories/{id}               - Category detail
//! GET  /products                      - Product listing (search, dates, take/skip)
//! GET  /products/{id}                 - Product detail
//! GET  /banks                         - Bank directory (503 when unconfigured)
//!
//! # Authenticated (Bearer)
//! GET  /users                         - All users, or ?email= for one
//! GET  /users/verify                  - Send a verification code by SMS
//! POST /users/verify                  - Submit the code
//! GET  /users/profile                 - Current user and address
//! POST /users/profile                 - Create the address
//! PATCH /users/profile                - Partial profile/address update
//! GET|PUT|DELETE /users/{id}          - User administration
//! POST /become-seller                 - Upgrade to seller, returns a new token
//! POST /banks/verify                  - Resolve an account holder
//! GET|POST|PUT|DELETE /cart           - List, add, update, clear
//! GET|DELETE /cart/{product_id}       - One line
//! POST /cart/{product_id}/increment
//! POST /cart/{product_id}/decrement
//!
//! # Seller (Bearer, stored role seller)
//! POST /seller/categories
//! GET|PATCH|DELETE /seller/categories/{id}
//! GET|POST /seller/products
//! GET|PUT|PATCH|DELETE /seller/products/{id}
//! ```

pub mod banks;
pub mod cart;
pub mod catalogue;
pub mod health;
pub mod users;

use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    http::{
        Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    },
    middleware::{from_extractor_with_state, from_fn},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::{RequireSeller, request_id_middleware};
use crate::state::AppState;

/// Routes open to anyone.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/categories", get(catalogue::list_categories))
        .route("/categories/{id}", get(catalogue::get_category))
        .route("/products", get(catalogue::list_products))
        .route("/products/{id}", get(catalogue::get_product))
        .route("/banks", get(banks::list))
}

/// Routes that need a bearer token. Each handler authenticates through its
/// `RequireAuth` argument.
pub fn private_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/verify",
            get(users::request_verification_code).post(users::verify),
        )
        .route(
            "/users/profile",
            get(users::get_profile)
                .post(users::create_profile)
                .patch(users::patch_profile),
        )
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/become-seller", post(users::become_seller))
        .route("/banks/verify", post(banks::verify))
        .route(
            "/cart",
            get(cart::list)
                .post(cart::add)
                .put(cart::update)
                .delete(cart::clear),
        )
        .route("/cart/{product_id}", get(cart::get).delete(cart::remove))
        .route("/cart/{product_id}/increment", post(cart::increment))
        .route("/cart/{product_id}/decrement", post(cart::decrement))
}

/// Routes nested under `/seller`.
///
/// Write handlers take `RequireSeller` directly; the shared read handlers
/// are guarded by a route layer.
pub fn seller_routes(state: &AppState) -> Router<AppState> {
    let reads = Router::new()
        .route("/categories/{id}", get(catalogue::get_category))
        .route("/products", get(catalogue::list_products))
        .route("/products/{id}", get(catalogue::get_product))
        .route_layer(from_extractor_with_state::<RequireSeller, _>(state.clone()));

    let writes = Router::new()
        .route("/categories", post(catalogue::create_category))
        .route(
            "/categories/{id}",
            axum::routing::patch(catalogue::update_category).delete(catalogue::delete_category),
        )
        .route("/products", post(catalogue::create_product))
        .route(
            "/products/{id}",
            axum::routing::put(catalogue::update_product)
                .patch(catalogue::patch_product)
                .delete(catalogue::delete_product),
        );

    reads.merge(writes)
}

/// CORS policy: any origin, the methods and headers the API uses.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([ORIGIN, CONTENT_TYPE, ACCEPT, AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

/// Build the complete application router.
///
/// Sentry layers are added by the binary; everything else lives here so
/// tests exercise the same stack.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(public_routes())
        .merge(private_routes())
        .nest("/seller", seller_routes(&state))
        .with_state(state)
        .layer(cors())
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
}
