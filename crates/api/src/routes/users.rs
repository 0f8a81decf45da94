//! Account, verification, profile and seller-upgrade handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use marketplace_core::{Patch, UserId};

use crate::error::{Result, add_breadcrumb};
use crate::extract::{Json, Path, Query, parse_id};
use crate::middleware::RequireAuth;
use crate::models::{Address, BankAccount, User};
use crate::services::auth::Registration;
use crate::services::users::{AddressInput, ProfilePatch, SellerApplication, UserUpdate};
use crate::state::AppState;

const INVALID_USER_ID: &str = "Invalid user ID";

/// Envelope carrying only a message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Envelope for a single user plus a freshly issued token.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub message: &'static str,
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub message: &'static str,
    pub users: Vec<User>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: &'static str,
    pub user: User,
    pub address: Option<Address>,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub message: &'static str,
    pub address: Address,
}

#[derive(Debug, Serialize)]
pub struct SellerResponse {
    pub message: &'static str,
    pub user: User,
    pub bank_account: BankAccount,
    pub token: String,
}

// =============================================================================
// Registration & Login
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// POST /register
///
/// # Errors
///
/// 400 for invalid input, 409 when the email or phone is already taken.
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response> {
    let (user, token) = state
        .auth()
        .register(Registration {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            password: req.password,
        })
        .await?;

    add_breadcrumb("auth", "User registered", None);

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "User registered successfully",
            user,
            token,
        }),
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /login
///
/// # Errors
///
/// 401 with a single message for unknown email and wrong password alike.
#[instrument(skip(state, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let (user, token) = state.auth().login(&req.email, &req.password).await?;

    add_breadcrumb("auth", "User logged in", None);

    Ok(Json(SessionResponse {
        message: "login",
        user,
        token,
    }))
}

// =============================================================================
// User Administration
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub email: Option<String>,
}

/// GET /users, or GET /users?email=... to look one up.
///
/// # Errors
///
/// 404 when an email is given and nobody owns it.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<UsersQuery>,
) -> Result<Response> {
    let service = state.user_service();

    if let Some(email) = query.email.filter(|e| !e.trim().is_empty()) {
        let user = service.find_by_email(&email).await?;
        return Ok(Json(UserResponse {
            message: "User found",
            user,
        })
        .into_response());
    }

    let users = service.list().await?;
    Ok(Json(UsersResponse {
        message: "Users retrieved successfully",
        count: users.len(),
        users,
    })
    .into_response())
}

/// GET /users/{id}
///
/// # Errors
///
/// 400 for a malformed id, 404 when unknown.
pub async fn get_user(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let id: UserId = parse_id(&id, INVALID_USER_ID)?;
    let user = state.user_service().get(id).await?;

    Ok(Json(UserResponse {
        message: "User found",
        user,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// PUT /users/{id}
///
/// # Errors
///
/// 400 for invalid values, 404 when unknown, 409 for a taken email.
#[instrument(skip(state, req))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let id: UserId = parse_id(&id, INVALID_USER_ID)?;
    let user = state
        .user_service()
        .update(
            id,
            UserUpdate {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                phone: req.phone,
                password: req.password,
            },
        )
        .await?;

    Ok(Json(UserResponse {
        message: "User updated successfully",
        user,
    }))
}

/// DELETE /users/{id}
///
/// # Errors
///
/// 400 for a malformed id, 404 when unknown.
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id: UserId = parse_id(&id, INVALID_USER_ID)?;
    state.user_service().delete(id).await?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully",
    }))
}

// =============================================================================
// Verification
// =============================================================================

/// GET /users/verify
///
/// Generates a fresh code and sends it by SMS. The code is never echoed
/// back in the response.
///
/// # Errors
///
/// 400 if already verified, 502 if the SMS could not be sent.
pub async fn request_verification_code(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<MessageResponse>> {
    state.verification().request_code(user.id).await?;

    Ok(Json(MessageResponse {
        message: "get verification code",
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyRequest {
    pub code: i32,
}

/// POST /users/verify
///
/// # Errors
///
/// 400 for a wrong or expired code, or an already verified account.
pub async fn verify(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<MessageResponse>> {
    state.verification().verify_code(user.id, req.code).await?;

    add_breadcrumb("auth", "User verified", None);

    Ok(Json(MessageResponse {
        message: "Verified in successfully",
    }))
}

// =============================================================================
// Profile
// =============================================================================

/// GET /users/profile
///
/// # Errors
///
/// Store failures only.
pub async fn get_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfileResponse>> {
    let (user, address) = state.user_service().profile(user.id).await?;

    Ok(Json(ProfileResponse {
        message: "get profile",
        user,
        address,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddressRequest {
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub postal_code: Option<String>,
}

/// POST /users/profile
///
/// # Errors
///
/// 400 for missing address fields, 409 if an address already exists.
#[instrument(skip(state, req, user), fields(user_id = %user.id))]
pub async fn create_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<AddressRequest>,
) -> Result<Response> {
    let address = state
        .user_service()
        .create_address(
            user.id,
            AddressInput {
                address_line1: req.address_line1,
                address_line2: req.address_line2,
                city: req.city,
                state: req.state,
                country: req.country,
                postal_code: req.postal_code,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AddressResponse {
            message: "Profile created successfully",
            address,
        }),
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfilePatchRequest {
    pub first_name: Patch<String>,
    pub last_name: Patch<String>,
    pub phone: Patch<String>,
    pub address_line1: Patch<String>,
    pub address_line2: Patch<String>,
    pub city: Patch<String>,
    pub state: Patch<String>,
    pub country: Patch<String>,
    pub postal_code: Patch<String>,
}

/// PATCH /users/profile
///
/// # Errors
///
/// 400 for an empty patch or a blanked required field, 404 before an
/// address has been created.
#[instrument(skip(state, req, user), fields(user_id = %user.id))]
pub async fn patch_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<ProfilePatchRequest>,
) -> Result<Json<ProfileResponse>> {
    let (user, address) = state
        .user_service()
        .patch_profile(
            user.id,
            ProfilePatch {
                first_name: req.first_name,
                last_name: req.last_name,
                phone: req.phone,
                address_line1: req.address_line1,
                address_line2: req.address_line2,
                city: req.city,
                state: req.state,
                country: req.country,
                postal_code: req.postal_code,
            },
        )
        .await?;

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully",
        user,
        address: Some(address),
    }))
}

// =============================================================================
// Seller Upgrade
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BecomeSellerRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub bank_account_number: String,
    pub bank_code: String,
    pub payment_type: String,
}

/// POST /become-seller
///
/// Returns a new token; the caller's old token still says `buyer`.
///
/// # Errors
///
/// 400 for missing fields, 409 if the caller is already a seller.
#[instrument(skip(state, req, user), fields(user_id = %user.id))]
pub async fn become_seller(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<BecomeSellerRequest>,
) -> Result<Json<SellerResponse>> {
    let (user, bank_account, token) = state
        .user_service()
        .become_seller(
            user.id,
            SellerApplication {
                first_name: req.first_name,
                last_name: req.last_name,
                phone_number: req.phone_number,
                bank_account_number: req.bank_account_number,
                bank_code: req.bank_code,
                payment_type: req.payment_type,
            },
        )
        .await?;

    add_breadcrumb("auth", "User became seller", None);

    Ok(Json(SellerResponse {
        message: "Become seller successfully",
        user,
        bank_account,
        token,
    }))
}
