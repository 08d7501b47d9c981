use anyhow::Result;
use tracing::{debug, info, trace};

use super::initdb::run_migrations;
use super::serve::serve;

pub async fn migrate_and_serve(database_url: &str, bind_address: &str) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", database_url);

    let db = run_migrations(database_url).await?;
    // The server opens its own pool
    db.close().await?;

    serve(database_url, bind_address).await
}
