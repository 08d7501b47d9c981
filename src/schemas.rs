use betting::{AccountStore, RaceResolver};
use common::{
    AccountDto, DriverDto, RaceHistoryDto, RaceResultDto, RollDto, StandingDto, StatusOverviewDto,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::config::Settings;
use crate::handlers::{
    admin::AdminActionRequest,
    auth::LoginRequest,
    drivers::{CreateDriverRequest, UpdateDriverRequest},
    races::RaceRequestBody,
    users::{SignupRequest, UpdateProfileRequest},
    wallet::WalletAmountRequest,
};

pub use common::ApiResponse;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Read-through cache for driver listings, never authoritative
    pub cache: Cache<String, CachedData>,
    pub accounts: AccountStore,
    pub resolver: RaceResolver,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn team_or_default(&self, team_id: Option<i32>) -> i32 {
        team_id.unwrap_or(self.settings.default_team_id)
    }

    /// Drops every cached driver projection.
    pub fn invalidate_driver_cache(&self) {
        self.cache.invalidate_all();
    }
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Drivers(Vec<DriverDto>),
    Leaderboard(Vec<StandingDto>),
}

/// Optional team selector shared by listing endpoints
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeamQuery {
    /// Team partition, defaults to the configured team
    pub team_id: Option<i32>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::users::signup,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::get_race_history,
        crate::handlers::auth::login,
        crate::handlers::wallet::credit_wallet,
        crate::handlers::wallet::debit_wallet,
        crate::handlers::races::run_race,
        crate::handlers::drivers::create_drivers,
        crate::handlers::drivers::list_drivers,
        crate::handlers::drivers::get_leaderboard,
        crate::handlers::drivers::get_driver,
        crate::handlers::drivers::update_driver,
        crate::handlers::drivers::delete_driver,
        crate::handlers::drivers::hot_streak,
        crate::handlers::admin::suspend_user,
        crate::handlers::admin::unsuspend_user,
        crate::handlers::admin::delete_user,
        crate::handlers::admin::list_all_users,
    ),
    components(
        schemas(
            ErrorResponse,
            HealthResponse,
            TeamQuery,
            AccountDto,
            RaceHistoryDto,
            StatusOverviewDto,
            DriverDto,
            StandingDto,
            RollDto,
            RaceResultDto,
            SignupRequest,
            UpdateProfileRequest,
            LoginRequest,
            WalletAmountRequest,
            RaceRequestBody,
            CreateDriverRequest,
            UpdateDriverRequest,
            AdminActionRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Account signup, lookup and profile endpoints"),
        (name = "auth", description = "Credential check"),
        (name = "wallet", description = "Wallet credit and debit"),
        (name = "races", description = "Run a race and settle the bet"),
        (name = "drivers", description = "Driver registry and leaderboard"),
        (name = "admin", description = "Account lifecycle management"),
    ),
    info(
        title = "Paddock API",
        description = "Race betting backend: accounts, wallets, drivers and race settlement",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
