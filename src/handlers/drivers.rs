use crate::helpers::converters::{driver_to_dto, standing_to_dto};
use crate::helpers::errors::{ApiError, api_error};
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse, TeamQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use betting::{BettingError, DriverRegistry, DriverUpdate, NewDriver};
use common::{DriverDto, StandingDto};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for adding a driver
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateDriverRequest {
    /// Team partition, defaults to the configured team
    pub team_id: Option<i32>,
    /// Car number, unique within the team
    #[validate(range(min = 0))]
    pub number: i32,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Active flag (default: true)
    pub status: Option<bool>,
    /// Bonus added to the driver's roll (default: 2)
    #[validate(range(min = 0))]
    pub drive_bonus: Option<i32>,
}

/// Request body for editing a driver
#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateDriverRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(range(min = 0))]
    pub number: Option<i32>,
    pub status: Option<bool>,
    #[validate(range(min = 0))]
    pub drive_bonus: Option<i32>,
}

fn cache_key(kind: &str, team_id: i32) -> String {
    format!("{}:{}", kind, team_id)
}

/// Add drivers
#[utoipa::path(
    post,
    path = "/api/v1/drivers",
    tag = "drivers",
    params(TeamQuery),
    request_body = Vec<CreateDriverRequest>,
    responses(
        (status = 201, description = "Drivers created successfully", body = ApiResponse<Vec<DriverDto>>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Car number already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_drivers(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
    Json(requests): Json<Vec<CreateDriverRequest>>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<DriverDto>>>), ApiError> {
    trace!("Entering create_drivers function");
    let default_team = state.team_or_default(query.team_id);
    if requests.is_empty() {
        return Err(api_error(
            "Failed to create drivers",
            BettingError::Validation("drivers array required in body".to_string()),
        ));
    }
    for request in &requests {
        request.validate().map_err(|e| {
            api_error("Failed to create drivers", BettingError::Validation(e.to_string()))
        })?;
    }

    let team_id = requests
        .first()
        .and_then(|r| r.team_id)
        .unwrap_or(default_team);
    let drivers = requests
        .into_iter()
        .map(|r| NewDriver {
            team_id: r.team_id.unwrap_or(default_team),
            number: r.number,
            name: r.name,
            drive_bonus: r.drive_bonus,
            status: r.status,
        })
        .collect::<Vec<_>>();
    if drivers.iter().any(|d| d.team_id != team_id) {
        return Err(api_error(
            "Failed to create drivers",
            BettingError::Validation("all drivers must belong to one team".to_string()),
        ));
    }

    let created = DriverRegistry::new()
        .create_many(&state.db, team_id, drivers)
        .await
        .map_err(|e| api_error("Failed to create drivers", e))?;
    state.invalidate_driver_cache();

    info!("Created {} drivers in team {}", created.len(), team_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: created.into_iter().map(driver_to_dto).collect(),
            message: "Drivers created successfully".to_string(),
            success: true,
        }),
    ))
}

/// List drivers of a team
#[utoipa::path(
    get,
    path = "/api/v1/drivers",
    tag = "drivers",
    params(TeamQuery),
    responses(
        (status = 200, description = "Drivers retrieved successfully", body = ApiResponse<Vec<DriverDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_drivers(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<ApiResponse<Vec<DriverDto>>>, ApiError> {
    trace!("Entering list_drivers function");
    let team_id = state.team_or_default(query.team_id);
    let key = cache_key("drivers", team_id);

    let drivers = match state.cache.get(&key).await {
        Some(CachedData::Drivers(drivers)) => {
            debug!("Serving drivers for team {} from cache", team_id);
            drivers
        }
        _ => {
            let drivers: Vec<DriverDto> = DriverRegistry::new()
                .list(&state.db, team_id)
                .await
                .map_err(|e| api_error("Failed to retrieve drivers", e))?
                .into_iter()
                .map(driver_to_dto)
                .collect();
            state
                .cache
                .insert(key, CachedData::Drivers(drivers.clone()))
                .await;
            drivers
        }
    };

    Ok(Json(ApiResponse {
        data: drivers,
        message: "Drivers retrieved successfully".to_string(),
        success: true,
    }))
}

/// Driver standings of a team
#[utoipa::path(
    get,
    path = "/api/v1/drivers/leaderboard",
    tag = "drivers",
    params(TeamQuery),
    responses(
        (status = 200, description = "Leaderboard retrieved successfully", body = ApiResponse<Vec<StandingDto>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<TeamQuery>,
) -> Result<Json<ApiResponse<Vec<StandingDto>>>, ApiError> {
    trace!("Entering get_leaderboard function");
    let team_id = state.team_or_default(query.team_id);
    let key = cache_key("leaderboard", team_id);

    let standings = match state.cache.get(&key).await {
        Some(CachedData::Leaderboard(standings)) => {
            debug!("Serving leaderboard for team {} from cache", team_id);
            standings
        }
        _ => {
            let standings: Vec<StandingDto> = DriverRegistry::new()
                .leaderboard(&state.db, team_id)
                .await
                .map_err(|e| api_error("Failed to build leaderboard", e))?
                .into_iter()
                .map(standing_to_dto)
                .collect();
            state
                .cache
                .insert(key, CachedData::Leaderboard(standings.clone()))
                .await;
            standings
        }
    };

    Ok(Json(ApiResponse {
        data: standings,
        message: "Leaderboard retrieved successfully".to_string(),
        success: true,
    }))
}

/// Get a driver by ID
#[utoipa::path(
    get,
    path = "/api/v1/drivers/{driver_id}",
    tag = "drivers",
    params(
        ("driver_id" = i32, Path, description = "Driver ID"),
    ),
    responses(
        (status = 200, description = "Driver retrieved successfully", body = ApiResponse<DriverDto>),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_driver(
    Path(driver_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DriverDto>>, ApiError> {
    trace!("Entering get_driver function for driver_id: {}", driver_id);

    let driver = DriverRegistry::new()
        .get(&state.db, driver_id)
        .await
        .map_err(|e| api_error("Failed to retrieve driver", e))?;

    Ok(Json(ApiResponse {
        data: driver_to_dto(driver),
        message: "Driver retrieved successfully".to_string(),
        success: true,
    }))
}

/// Edit a driver
#[utoipa::path(
    put,
    path = "/api/v1/drivers/{driver_id}",
    tag = "drivers",
    params(
        ("driver_id" = i32, Path, description = "Driver ID"),
    ),
    request_body = UpdateDriverRequest,
    responses(
        (status = 200, description = "Driver updated successfully", body = ApiResponse<DriverDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 409, description = "Car number already taken", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_driver(
    Path(driver_id): Path<i32>,
    State(state): State<AppState>,
    Valid(Json(request)): Valid<Json<UpdateDriverRequest>>,
) -> Result<Json<ApiResponse<DriverDto>>, ApiError> {
    trace!("Entering update_driver function for driver_id: {}", driver_id);

    let driver = DriverRegistry::new()
        .update(
            &state.db,
            driver_id,
            DriverUpdate {
                name: request.name,
                number: request.number,
                status: request.status,
                drive_bonus: request.drive_bonus,
            },
        )
        .await
        .map_err(|e| api_error("Failed to update driver", e))?;
    state.invalidate_driver_cache();

    Ok(Json(ApiResponse {
        data: driver_to_dto(driver),
        message: "Driver updated successfully".to_string(),
        success: true,
    }))
}

/// Delete a driver
#[utoipa::path(
    delete,
    path = "/api/v1/drivers/{driver_id}",
    tag = "drivers",
    params(
        ("driver_id" = i32, Path, description = "Driver ID"),
    ),
    responses(
        (status = 200, description = "Driver deleted successfully", body = ApiResponse<String>),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_driver(
    Path(driver_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering delete_driver function for driver_id: {}", driver_id);

    DriverRegistry::new()
        .delete(&state.db, driver_id)
        .await
        .map_err(|e| api_error("Failed to delete driver", e))?;
    state.invalidate_driver_cache();

    Ok(Json(ApiResponse {
        data: format!("Driver {} deleted", driver_id),
        message: "Driver deleted successfully".to_string(),
        success: true,
    }))
}

/// Give a driver +1 drive bonus
#[utoipa::path(
    post,
    path = "/api/v1/drivers/{driver_id}/hot-streak",
    tag = "drivers",
    params(
        ("driver_id" = i32, Path, description = "Driver ID"),
    ),
    responses(
        (status = 200, description = "Drive bonus increased", body = ApiResponse<DriverDto>),
        (status = 404, description = "Driver not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn hot_streak(
    Path(driver_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DriverDto>>, ApiError> {
    trace!("Entering hot_streak function for driver_id: {}", driver_id);

    let driver = DriverRegistry::new()
        .apply_hot_streak(&state.db, driver_id)
        .await
        .map_err(|e| api_error("Failed to apply hot streak", e))?;
    state.invalidate_driver_cache();

    info!("Driver #{} bonus is now {}", driver.number, driver.drive_bonus);
    let message = format!("{} is on a hot streak!", driver.name);
    Ok(Json(ApiResponse {
        data: driver_to_dto(driver),
        message,
        success: true,
    }))
}
