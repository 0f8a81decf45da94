//! Bank directory and account verification handlers.
//!
//! Both endpoints answer 503 when no bank provider is configured.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::RequireAuth;
use crate::services::bank::{Bank, VerifiedAccount};
use crate::state::AppState;

/// Banks are only listed for Nigeria.
const COUNTRY: &str = "NG";

#[derive(Debug, Serialize)]
pub struct BankResponse<T> {
    pub success: bool,
    pub message: &'static str,
    pub data: T,
}

/// GET /banks
///
/// # Errors
///
/// 503 when unconfigured, 500 when the provider call fails.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<BankResponse<Vec<Bank>>>> {
    let provider = state.banks().ok_or(AppError::BankUnavailable)?;
    let banks = provider
        .list_banks(COUNTRY)
        .await
        .map_err(AppError::BankLookup)?;

    Ok(Json(BankResponse {
        success: true,
        message: "Banks retrieved successfully",
        data: banks,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct VerifyAccountRequest {
    pub account_number: String,
    pub bank_code: String,
}

/// POST /banks/verify
///
/// # Errors
///
/// 503 when unconfigured, 400 for missing fields or when the provider
/// cannot resolve the account.
#[instrument(skip(state, req))]
pub async fn verify(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Json(req): Json<VerifyAccountRequest>,
) -> Result<Json<BankResponse<VerifiedAccount>>> {
    let provider = state.banks().ok_or(AppError::BankUnavailable)?;

    let account_number = req.account_number.trim();
    let bank_code = req.bank_code.trim();
    if account_number.is_empty() || bank_code.is_empty() {
        return Err(AppError::Validation(
            "account_number and bank_code are required".to_owned(),
        ));
    }

    let account = provider
        .verify_account(account_number, bank_code)
        .await
        .map_err(AppError::BankVerification)?;

    Ok(Json(BankResponse {
        success: true,
        message: "Bank account verified successfully",
        data: account,
    }))
}
