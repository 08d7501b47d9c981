use crate::helpers::converters::account_to_dto;
use crate::helpers::errors::{ApiError, api_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, State},
    response::Json,
};
use betting::{WalletLedger, accounts};
use common::AccountDto;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::ToSchema;

/// Amount to move. Non-positive amounts are rejected by the ledger.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct WalletAmountRequest {
    pub amount: i64,
}

/// Add money to a wallet
#[utoipa::path(
    post,
    path = "/api/v1/users/{username}/wallet/credit",
    tag = "wallet",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    request_body = WalletAmountRequest,
    responses(
        (status = 200, description = "Wallet credited", body = ApiResponse<AccountDto>),
        (status = 400, description = "Invalid amount or balance overflow", body = ErrorResponse),
        (status = 403, description = "Account is suspended", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn credit_wallet(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<WalletAmountRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    trace!("Entering credit_wallet function for username: {}", username);

    let account = accounts::lookup(&state.db, &username)
        .await
        .map_err(|e| api_error("Failed to credit wallet", e))?;
    let account = WalletLedger::new()
        .credit(&state.db, account.id, request.amount)
        .await
        .map_err(|e| api_error("Failed to credit wallet", e))?;

    info!("Credited {} to '{}'", request.amount, username);
    Ok(Json(ApiResponse {
        data: account_to_dto(account),
        message: "Wallet credited successfully".to_string(),
        success: true,
    }))
}

/// Take money from a wallet
#[utoipa::path(
    post,
    path = "/api/v1/users/{username}/wallet/debit",
    tag = "wallet",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    request_body = WalletAmountRequest,
    responses(
        (status = 200, description = "Wallet debited", body = ApiResponse<AccountDto>),
        (status = 400, description = "Invalid amount or insufficient funds", body = ErrorResponse),
        (status = 403, description = "Account is suspended", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn debit_wallet(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<WalletAmountRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    trace!("Entering debit_wallet function for username: {}", username);

    let account = accounts::lookup(&state.db, &username)
        .await
        .map_err(|e| api_error("Failed to debit wallet", e))?;
    let account = WalletLedger::new()
        .debit(&state.db, account.id, request.amount)
        .await
        .map_err(|e| api_error("Failed to debit wallet", e))?;

    info!("Debited {} from '{}'", request.amount, username);
    Ok(Json(ApiResponse {
        data: account_to_dto(account),
        message: "Wallet debited successfully".to_string(),
        success: true,
    }))
}
