use axum::{http::StatusCode, response::Json};
use betting::BettingError;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn status_for(err: &BettingError) -> StatusCode {
    match err {
        BettingError::InsufficientFunds { .. }
        | BettingError::BalanceOverflow { .. }
        | BettingError::InvalidRace(_)
        | BettingError::InvalidAmount(_)
        | BettingError::Validation(_)
        | BettingError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
        BettingError::Unauthorized | BettingError::AccountSuspended(_) => StatusCode::FORBIDDEN,
        BettingError::NotFound(_) => StatusCode::NOT_FOUND,
        BettingError::DuplicateUsername(_) | BettingError::DuplicateDriver { .. } => {
            StatusCode::CONFLICT
        }
        BettingError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        BettingError::PasswordHash(_) | BettingError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Renders a core error for the client. Storage details stay in the log.
pub fn api_error(context: &str, err: BettingError) -> ApiError {
    let status = status_for(&err);
    let message = if err.is_domain() {
        warn!("{}: {}", context, err);
        err.to_string()
    } else {
        error!("{}: {}", context, err);
        format!("{}: internal error", context)
    };

    (
        status,
        Json(ErrorResponse {
            error: message,
            code: err.code().to_string(),
            success: false,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use betting::RaceRejection;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&BettingError::InsufficientFunds { balance: 1, requested: 2 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&BettingError::BalanceOverflow { balance: i64::MAX, requested: 1 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&RaceRejection::SameDriver(1).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&BettingError::Unauthorized), StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(&BettingError::DuplicateUsername("a".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&BettingError::InvalidCredentials), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_storage_failures_hide_details() {
        let (status, Json(body)) = api_error(
            "Failed to load user",
            sea_orm::DbErr::Custom("secret table layout".into()).into(),
        );

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.code, "DATABASE_ERROR");
        assert!(!body.error.contains("secret"));
        assert!(!body.success);
    }
}
