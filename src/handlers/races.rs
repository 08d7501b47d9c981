use crate::helpers::converters::race_result_to_dto;
use crate::helpers::errors::{ApiError, api_error};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};
use axum::{extract::State, response::Json};
use betting::{RaceOutcome, RaceRequest};
use common::RaceResultDto;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

/// A bet on one of two drivers, by car number
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RaceRequestBody {
    /// Bettor
    pub username: String,
    /// Team partition, defaults to the configured team
    pub team_id: Option<i32>,
    pub driver1: i32,
    pub driver2: i32,
    /// Car number the bet is placed on; must be one of the two racers
    pub backed_driver: i32,
    pub bet_amount: i64,
}

/// Run a race and settle the bet
#[utoipa::path(
    post,
    path = "/api/v1/races",
    tag = "races",
    request_body = RaceRequestBody,
    responses(
        (status = 200, description = "Race settled", body = ApiResponse<RaceResultDto>),
        (status = 400, description = "Invalid race or insufficient funds", body = ErrorResponse),
        (status = 403, description = "Account is suspended", body = ErrorResponse),
        (status = 404, description = "User or driver not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn run_race(
    State(state): State<AppState>,
    Json(request): Json<RaceRequestBody>,
) -> Result<Json<ApiResponse<RaceResultDto>>, ApiError> {
    trace!("Entering run_race function");
    let team_id = state.team_or_default(request.team_id);
    debug!(
        "'{}' bets {} on #{} in #{} vs #{}",
        request.username, request.bet_amount, request.backed_driver, request.driver1, request.driver2
    );

    let result = state
        .resolver
        .resolve(
            &state.db,
            RaceRequest {
                username: request.username,
                team_id,
                driver1: request.driver1,
                driver2: request.driver2,
                backed_driver: request.backed_driver,
                bet_amount: request.bet_amount,
            },
        )
        .await
        .map_err(|e| api_error("Race failed", e))?;

    state.invalidate_driver_cache();

    let message = match result.outcome {
        RaceOutcome::Win => format!("You won {}!", result.settlement.net()),
        RaceOutcome::Loss => format!("You lost {}", -result.settlement.net()),
        RaceOutcome::Tie => "Dead heat, bet refunded".to_string(),
    };
    info!("Race for '{}' finished: {}", result.account.username, result.outcome);

    Ok(Json(ApiResponse {
        data: race_result_to_dto(result),
        message,
        success: true,
    }))
}
