use crate::helpers::converters::{account_to_dto, history_to_dto};
use crate::helpers::errors::{ApiError, api_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, TeamQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use betting::{NewAccount, ProfileUpdate, accounts};
use common::{AccountDto, RaceHistoryDto};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for signing up
#[derive(Deserialize, Serialize, ToSchema, Validate)]
pub struct SignupRequest {
    /// Username (must be unique)
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Defaults to the username
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    /// Team partition, defaults to the configured team
    pub team_id: Option<i32>,
    /// Starting wallet, defaults to the configured starting balance
    #[validate(range(min = 0))]
    pub wallet: Option<i64>,
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("team_id", &self.team_id)
            .field("wallet", &self.wallet)
            .finish_non_exhaustive()
    }
}

/// Request body for updating a profile. Only these fields are editable.
#[derive(Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
    #[validate(length(min = 1))]
    pub password: Option<String>,
}

/// Sign up a new account
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "users",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<AccountDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn signup(
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<SignupRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDto>>), ApiError> {
    trace!("Entering signup function");
    let team_id = state.team_or_default(request.team_id);
    debug!("Signing up '{}' in team {}", request.username, team_id);

    let account = state
        .accounts
        .signup(
            &state.db,
            NewAccount {
                team_id,
                username: request.username,
                password: request.password,
                display_name: request.display_name,
                wallet: request.wallet,
            },
        )
        .await
        .map_err(|e| api_error("Failed to create user", e))?;

    info!("User created successfully with ID: {}, username: {}", account.id, account.username);
    let response = ApiResponse {
        data: account_to_dto(account),
        message: "User created successfully".to_string(),
        success: true,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List active users of a team
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(TeamQuery),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<Vec<AccountDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    trace!("Entering list_users function");
    let team_id = state.team_or_default(query.team_id);

    let accounts = accounts::list_active(&state.db, team_id)
        .await
        .map_err(|e| api_error("Failed to retrieve users", e))?;

    info!("Successfully retrieved {} users", accounts.len());
    Ok(Json(ApiResponse {
        data: accounts.into_iter().map(account_to_dto).collect(),
        message: "Users retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a user by username
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<AccountDto>),
        (status = 403, description = "Account is suspended", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    trace!("Entering get_user function for username: {}", username);

    let account = accounts::lookup(&state.db, &username)
        .await
        .map_err(|e| api_error("Failed to retrieve user", e))?;

    info!("Successfully retrieved user with ID: {}, username: {}", account.id, account.username);
    Ok(Json(ApiResponse {
        data: account_to_dto(account),
        message: "User retrieved successfully".to_string(),
        success: true,
    }))
}

/// Update display name and/or password
#[utoipa::path(
    put,
    path = "/api/v1/users/{username}",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<AccountDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Account is suspended", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_user(
    Path(username): Path<String>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateProfileRequest>>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    trace!("Entering update_user function for username: {}", username);

    let account = state
        .accounts
        .update_profile(
            &state.db,
            &username,
            ProfileUpdate {
                display_name: request.display_name,
                password: request.password,
            },
        )
        .await
        .map_err(|e| api_error("Failed to update user", e))?;

    Ok(Json(ApiResponse {
        data: account_to_dto(account),
        message: "User updated successfully".to_string(),
        success: true,
    }))
}

/// Race history of a user, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/races",
    tag = "users",
    params(
        ("username" = String, Path, description = "Username"),
    ),
    responses(
        (status = 200, description = "Race history retrieved successfully", body = ApiResponse<Vec<RaceHistoryDto>>),
        (status = 403, description = "Account is suspended", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_race_history(
    Path(username): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<RaceHistoryDto>>>, ApiError> {
    trace!("Entering get_race_history function for username: {}", username);

    let entries = accounts::race_history(&state.db, &username)
        .await
        .map_err(|e| api_error("Failed to retrieve race history", e))?;

    debug!("Retrieved {} race entries for '{}'", entries.len(), username);
    Ok(Json(ApiResponse {
        data: entries.into_iter().map(history_to_dto).collect(),
        message: "Race history retrieved successfully".to_string(),
        success: true,
    }))
}
