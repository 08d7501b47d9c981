use crate::helpers::converters::account_to_dto;
use crate::helpers::errors::{ApiError, api_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, response::Json};
use axum_valid::Valid;
use common::AccountDto;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Check a username and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AccountDto>),
        (status = 401, description = "Invalid username or password", body = ErrorResponse),
        (status = 403, description = "Account is suspended", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<LoginRequest>>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    trace!("Entering login function for username: {}", request.username);

    let account = state
        .accounts
        .authenticate(&state.db, &request.username, &request.password)
        .await
        .map_err(|e| api_error("Login failed", e))?;

    info!("User '{}' logged in", account.username);
    Ok(Json(ApiResponse {
        data: account_to_dto(account),
        message: "Login successful".to_string(),
        success: true,
    }))
}
