use anyhow::Result;
use betting::{AccountStore, RaceResolver, RollSource, ThreadRngRolls};
use moka::future::Cache;
use sea_orm::{Database, DatabaseConnection};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::schemas::AppState;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://paddock.db?mode=rwc";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Runtime settings, read from `PADDOCK_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Team used when a request does not name one
    pub default_team_id: i32,
    pub starting_balance: i64,
    pub bcrypt_cost: u32,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("bcrypt cost must be between 4 and 31, got {0}")]
    BcryptCost(u32),
    #[error("starting balance cannot be negative, got {0}")]
    StartingBalance(i64),
}

impl Settings {
    /// Loads `.env`, then layers the environment over the defaults.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = config::Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("default_team_id", i64::from(betting::accounts::DEFAULT_TEAM_ID))?
            .set_default("starting_balance", betting::accounts::DEFAULT_STARTING_BALANCE)?
            .set_default("bcrypt_cost", 12_i64)?
            .set_default("cache_ttl_secs", 300_i64)?
            .set_default("cache_capacity", 1000_i64)?
            .add_source(config::Environment::with_prefix("PADDOCK").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(SettingsError::BcryptCost(self.bcrypt_cost));
        }
        if self.starting_balance < 0 {
            return Err(SettingsError::StartingBalance(self.starting_balance));
        }
        Ok(())
    }

    pub fn account_store(&self) -> AccountStore {
        AccountStore::new(self.bcrypt_cost, self.starting_balance)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            default_team_id: betting::accounts::DEFAULT_TEAM_ID,
            starting_balance: betting::accounts::DEFAULT_STARTING_BALANCE,
            bcrypt_cost: 12,
            cache_ttl_secs: 300,
            cache_capacity: 1000,
        }
    }
}

/// Builds handler state around an open connection.
pub fn build_app_state(
    db: DatabaseConnection,
    settings: Settings,
    rolls: Arc<dyn RollSource>,
) -> AppState {
    let cache = Cache::builder()
        .max_capacity(settings.cache_capacity)
        .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
        .build();

    AppState {
        db,
        cache,
        accounts: settings.account_store(),
        resolver: RaceResolver::new(rolls),
        settings: Arc::new(settings),
    }
}

/// Initialize application state against the given database
pub async fn initialize_app_state_with_url(database_url: &str) -> Result<AppState> {
    let mut settings = Settings::load()?;
    settings.database_url = database_url.to_string();

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(database_url).await?;

    Ok(build_app_state(db, settings, Arc::new(ThreadRngRolls)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.default_team_id, 2);
        assert_eq!(settings.starting_balance, 1000);
    }

    #[test]
    fn test_rejects_out_of_range_bcrypt_cost() {
        let settings = Settings {
            bcrypt_cost: 3,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::BcryptCost(3))));
    }
}
