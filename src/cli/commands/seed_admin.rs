use anyhow::Result;
use betting::AdminSeed;
use tracing::{debug, info, trace};

use super::initdb::run_migrations;
use crate::config::Settings;

pub struct SeedAdminArgs {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub wallet: i64,
    pub team_id: Option<i32>,
}

/// Makes sure the bootstrap admin exists and is active.
pub async fn seed_admin(database_url: &str, args: SeedAdminArgs) -> Result<()> {
    trace!("Entering seed_admin function");
    debug!("Database URL: {}", database_url);

    let settings = Settings::load()?;
    let db = run_migrations(database_url).await?;

    let admin = settings
        .account_store()
        .ensure_admin(
            &db,
            AdminSeed {
                team_id: args.team_id.unwrap_or(settings.default_team_id),
                username: args.username,
                password: args.password,
                display_name: args.display_name,
                wallet: args.wallet,
            },
        )
        .await?;

    info!(
        "Admin '{}' is ready (id {}, wallet {})",
        admin.username, admin.id, admin.wallet
    );
    Ok(())
}
