//! Bearer-token authentication extractors.
//!
//! Both extractors re-load the account from the store, so a deleted user's
//! token stops working immediately and role checks use the stored role
//! rather than the one baked into the token.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::state::AppState;

const NOT_A_SELLER: &str = "please join seller program to manage products";

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.first_name)
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Authorization header is missing".to_owned()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("invalid token".to_owned()))?;

        let claims = state
            .tokens()
            .verify(token)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let user = state
            .users()
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("user not found".to_owned()))?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        tracing::Span::current().record("user_id", user.id.as_i32());

        Ok(Self(user))
    }
}

/// Extractor that requires a bearer token for an account whose stored role
/// is seller.
pub struct RequireSeller(pub User);

impl FromRequestParts<AppState> for RequireSeller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.user_type.is_seller() {
            return Err(AppError::Unauthorized(NOT_A_SELLER.to_owned()));
        }

        Ok(Self(user))
    }
}
