use crate::handlers::{
    admin::{delete_user, list_all_users, suspend_user, unsuspend_user},
    auth::login,
    drivers::{
        create_drivers, delete_driver, get_driver, get_leaderboard, hot_streak, list_drivers,
        update_driver,
    },
    health::health_check,
    races::run_race,
    users::{get_race_history, get_user, list_users, signup, update_user},
    wallet::{credit_wallet, debit_wallet},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Accounts
        .route("/api/v1/users", post(signup).get(list_users))
        .route("/api/v1/users/:username", get(get_user).put(update_user))
        .route("/api/v1/users/:username/races", get(get_race_history))
        .route("/api/v1/users/:username/wallet/credit", post(credit_wallet))
        .route("/api/v1/users/:username/wallet/debit", post(debit_wallet))
        .route("/api/v1/auth/login", post(login))
        // Races
        .route("/api/v1/races", post(run_race))
        // Drivers
        .route("/api/v1/drivers", post(create_drivers).get(list_drivers))
        .route("/api/v1/drivers/leaderboard", get(get_leaderboard))
        .route(
            "/api/v1/drivers/:driver_id",
            get(get_driver).put(update_driver).delete(delete_driver),
        )
        .route("/api/v1/drivers/:driver_id/hot-streak", post(hot_streak))
        // Admin lifecycle
        .route("/api/v1/admin/users", get(list_all_users))
        .route("/api/v1/admin/users/:user_id/suspend", post(suspend_user))
        .route("/api/v1/admin/users/:user_id/unsuspend", post(unsuspend_user))
        .route("/api/v1/admin/users/:user_id/delete", post(delete_user))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
