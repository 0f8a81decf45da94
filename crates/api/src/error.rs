//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. `AppError` renders the JSON
//! envelope clients see:
//!
//! ```json
//! { "message": "Email already exists",
//!   "error": "This email address is already registered to another user. ...",
//!   "error_full": "duplicate key value violates unique constraint \"users_email_key\"" }
//! ```
//!
//! Store errors carry the raw database text in `error_full`. Server-side
//! failures are captured to Sentry before responding.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::{RepositoryError, constraints};
use crate::services::auth::AuthError;
use crate::services::bank::BankError;
use crate::services::cart::CartError;
use crate::services::catalogue::CatalogueError;
use crate::services::users::UserError;
use crate::services::verification::VerificationError;

const NOT_FOUND_DETAIL: &str =
    "The requested resource does not exist. Please check the ID and try again.";
const VALIDATION_FAILED: &str = "Validation failed";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Registration or login failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("User error: {0}")]
    User(#[from] UserError),

    #[error("Verification error: {0}")]
    Verification(#[from] VerificationError),

    #[error("Catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// No bank provider is configured.
    #[error("Bank service is not available")]
    BankUnavailable,

    /// Fetching the bank list failed.
    #[error("Bank lookup failed: {0}")]
    BankLookup(BankError),

    /// The provider could not resolve the account.
    #[error("Bank verification failed: {0}")]
    BankVerification(BankError),

    /// Request failed input validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Request body, path or query could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Bearer token missing or rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error envelope.
#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_full: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl ErrorBody {
    fn new(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: None,
            message: message.into(),
            error: Some(error.into()),
            error_full: None,
            reason: None,
        }
    }

    fn validation(message: impl Into<String>) -> Self {
        Self::new(message, VALIDATION_FAILED)
    }

    fn not_found(full: impl ToString) -> Self {
        Self::new("Resource not found", NOT_FOUND_DETAIL).with_full(full)
    }

    fn with_full(mut self, full: impl ToString) -> Self {
        self.error_full = Some(full.to_string());
        self
    }

    fn unsuccessful(mut self) -> Self {
        self.success = Some(false);
        self
    }
}

/// Translate a store error into a client-facing status and body.
fn database_error(err: &RepositoryError) -> (StatusCode, ErrorBody) {
    let (status, body) = match err {
        RepositoryError::NotFound => (
            StatusCode::NOT_FOUND,
            ErrorBody::new("Resource not found", NOT_FOUND_DETAIL),
        ),
        RepositoryError::Conflict { constraint, .. } => match constraint.as_str() {
            constraints::USERS_EMAIL => (
                StatusCode::CONFLICT,
                ErrorBody::new(
                    "Email already exists",
                    "This email address is already registered to another user. Please use a different email address.",
                ),
            ),
            constraints::USERS_PHONE => (
                StatusCode::CONFLICT,
                ErrorBody::new(
                    "Phone number already exists",
                    "This phone number is already registered. Please use a different phone number.",
                ),
            ),
            constraints::ADDRESSES_USER => (
                StatusCode::CONFLICT,
                ErrorBody::new(
                    "Address already exists",
                    "This user already has an address. Use PATCH /users/profile to change it.",
                ),
            ),
            _ => (
                StatusCode::CONFLICT,
                ErrorBody::new(
                    "Resource already exists",
                    "A record with these values already exists.",
                ),
            ),
        },
        RepositoryError::ForeignKey { constraint, detail }
            if constraint == constraints::PRODUCTS_CATEGORY =>
        {
            if detail.contains("insert or update") {
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new(
                        "Invalid category",
                        "The specified category does not exist. Please provide a valid category ID.",
                    ),
                )
            } else {
                (StatusCode::CONFLICT, category_in_use())
            }
        }
        RepositoryError::OutOfRange { .. } => (
            StatusCode::BAD_REQUEST,
            ErrorBody::validation("Value is out of range"),
        ),
        RepositoryError::ForeignKey { .. } => (
            StatusCode::CONFLICT,
            ErrorBody::new(
                "Operation not allowed",
                "This operation would break a reference to another record.",
            ),
        ),
        e if e.is_unavailable() => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorBody::new(
                "Database connection failed",
                "Unable to connect to the database. Please try again later.",
            ),
        ),
        RepositoryError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new(
                "An error occurred while processing your request",
                "Internal server error",
            ),
        ),
    };

    (status, body.with_full(err))
}

fn category_in_use() -> ErrorBody {
    ErrorBody::new(
        "Cannot delete category",
        "This category has associated products. Please remove or reassign products before deleting the category.",
    )
}

fn internal() -> (StatusCode, ErrorBody) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody::new(
            "An error occurred while processing your request",
            "Internal server error",
        ),
    )
}

fn auth_error(err: &AuthError) -> (StatusCode, ErrorBody) {
    match err {
        AuthError::InvalidCredentials | AuthError::UserNotFound => (
            StatusCode::UNAUTHORIZED,
            ErrorBody {
                error: None,
                ..ErrorBody::new("Invalid email or password", "")
            },
        ),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, ErrorBody::validation(msg)),
        AuthError::InvalidEmail(_) | AuthError::InvalidPhone(_) | AuthError::MissingField(_) => {
            (StatusCode::BAD_REQUEST, ErrorBody::validation(err.to_string()))
        }
        AuthError::Repository(e) => database_error(e),
        AuthError::Token(_) | AuthError::PasswordHash => internal(),
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::Database(e) => database_error(e),
            Self::Auth(e) => auth_error(e),
            Self::User(e) => match e {
                UserError::NotFound | UserError::AddressNotFound => {
                    (StatusCode::NOT_FOUND, ErrorBody::not_found(e))
                }
                UserError::EmailTaken => (
                    StatusCode::CONFLICT,
                    ErrorBody::new(
                        "Email already exists",
                        "This email address is already registered to another user. Please use a different email address.",
                    ),
                ),
                UserError::AlreadySeller => (
                    StatusCode::CONFLICT,
                    ErrorBody::new("user is already a seller", "Conflict"),
                ),
                UserError::Validation(_)
                | UserError::InvalidEmail(_)
                | UserError::InvalidPhone(_) => {
                    (StatusCode::BAD_REQUEST, ErrorBody::validation(e.to_string()))
                }
                UserError::Auth(a) => auth_error(a),
                UserError::Token(_) => internal(),
                UserError::Repository(r) => database_error(r),
            },
            Self::Verification(e) => match e {
                VerificationError::UserNotFound => {
                    (StatusCode::NOT_FOUND, ErrorBody::not_found(e))
                }
                VerificationError::AlreadyVerified => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("User is already verified", e.to_string()),
                ),
                VerificationError::InvalidCode => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("Invalid verification code", e.to_string()),
                ),
                VerificationError::Expired => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("Verification code has expired", e.to_string()),
                ),
                VerificationError::Sms(s) => (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody::new("Failed to send verification code", s.to_string()),
                ),
                VerificationError::Repository(r) => database_error(r),
            },
            Self::Catalogue(e) => match e {
                CatalogueError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, ErrorBody::validation(msg))
                }
                CatalogueError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::not_found(e)),
                CatalogueError::Unauthorized => (
                    StatusCode::UNAUTHORIZED,
                    ErrorBody::new("Unauthorized", e.to_string()),
                ),
                CatalogueError::HasProducts { detail } => {
                    let body = category_in_use();
                    let body = match detail {
                        Some(d) => body.with_full(d),
                        None => body.with_full(e),
                    };
                    (StatusCode::CONFLICT, body)
                }
                CatalogueError::Repository(r) => database_error(r),
            },
            Self::Cart(e) => match e {
                CartError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorBody::validation(msg)),
                CartError::QuantityFloor => {
                    (StatusCode::BAD_REQUEST, ErrorBody::validation(e.to_string()))
                }
                CartError::ProductNotFound | CartError::ItemNotFound => {
                    (StatusCode::NOT_FOUND, ErrorBody::not_found(e))
                }
                CartError::Repository(r) => database_error(r),
            },
            Self::BankUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody::new(
                    "Bank service is not available",
                    "FLUTTERWAVE_SECRET_KEY is not configured",
                )
                .unsuccessful(),
            ),
            Self::BankLookup(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Failed to fetch banks", e.to_string()).unsuccessful(),
            ),
            Self::BankVerification(e) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Bank account verification failed", e.to_string()).unsuccessful(),
            ),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorBody::validation(msg)),
            Self::BadRequest(detail) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid request", detail),
            ),
            Self::Unauthorized(reason) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error: None,
                    reason: Some(reason.clone()),
                    ..ErrorBody::new("authorization failed", "")
                },
            ),
            Self::Internal(_) => internal(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
