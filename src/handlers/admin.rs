use crate::helpers::converters::{account_to_dto, overview_to_dto};
use crate::helpers::errors::{ApiError, api_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use betting::AccountLifecycle;
use common::{AccountDto, StatusOverviewDto};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::{IntoParams, ToSchema};

/// Identifies the acting administrator
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AdminActionRequest {
    pub admin_id: i32,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminQuery {
    pub admin_id: i32,
    /// Team partition, defaults to the configured team
    pub team_id: Option<i32>,
}

/// Suspend an account
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{user_id}/suspend",
    tag = "admin",
    params(
        ("user_id" = i32, Path, description = "Target user ID"),
    ),
    request_body = AdminActionRequest,
    responses(
        (status = 200, description = "User suspended", body = ApiResponse<AccountDto>),
        (status = 400, description = "Target cannot be suspended", body = ErrorResponse),
        (status = 403, description = "Admin privileges required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn suspend_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<AdminActionRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    trace!("Entering suspend_user function for user_id: {}", user_id);

    let account = AccountLifecycle::new()
        .suspend(&state.db, user_id, request.admin_id)
        .await
        .map_err(|e| api_error("Failed to suspend user", e))?;

    info!("User {} has been suspended", account.username);
    Ok(Json(ApiResponse {
        message: format!("User {} has been suspended", account.username),
        data: account_to_dto(account),
        success: true,
    }))
}

/// Reactivate a suspended account
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{user_id}/unsuspend",
    tag = "admin",
    params(
        ("user_id" = i32, Path, description = "Target user ID"),
    ),
    request_body = AdminActionRequest,
    responses(
        (status = 200, description = "User reactivated", body = ApiResponse<AccountDto>),
        (status = 400, description = "Target cannot be reactivated", body = ErrorResponse),
        (status = 403, description = "Admin privileges required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn unsuspend_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<AdminActionRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    trace!("Entering unsuspend_user function for user_id: {}", user_id);

    let account = AccountLifecycle::new()
        .unsuspend(&state.db, user_id, request.admin_id)
        .await
        .map_err(|e| api_error("Failed to unsuspend user", e))?;

    Ok(Json(ApiResponse {
        message: format!("User {} has been unsuspended", account.username),
        data: account_to_dto(account),
        success: true,
    }))
}

/// Soft-delete an account
#[utoipa::path(
    post,
    path = "/api/v1/admin/users/{user_id}/delete",
    tag = "admin",
    params(
        ("user_id" = i32, Path, description = "Target user ID"),
    ),
    request_body = AdminActionRequest,
    responses(
        (status = 200, description = "User deleted", body = ApiResponse<AccountDto>),
        (status = 400, description = "Target cannot be deleted", body = ErrorResponse),
        (status = 403, description = "Admin privileges required", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user(
    Path(user_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<AdminActionRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    trace!("Entering delete_user function for user_id: {}", user_id);

    let account = AccountLifecycle::new()
        .soft_delete(&state.db, user_id, request.admin_id)
        .await
        .map_err(|e| api_error("Failed to delete user", e))?;

    Ok(Json(ApiResponse {
        message: format!("User {} has been deleted", account.username),
        data: account_to_dto(account),
        success: true,
    }))
}

/// All accounts of a team grouped by status
#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    tag = "admin",
    params(AdminQuery),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<StatusOverviewDto>),
        (status = 403, description = "Admin privileges required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_all_users(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<ApiResponse<StatusOverviewDto>>, ApiError> {
    trace!("Entering list_all_users function");
    let team_id = state.team_or_default(query.team_id);

    let overview = AccountLifecycle::new()
        .overview(&state.db, query.admin_id, team_id)
        .await
        .map_err(|e| api_error("Failed to retrieve users", e))?;

    Ok(Json(ApiResponse {
        data: overview_to_dto(overview),
        message: "Users retrieved successfully".to_string(),
        success: true,
    }))
}
