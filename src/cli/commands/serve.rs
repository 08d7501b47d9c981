use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::config::initialize_app_state_with_url;
use crate::router::create_router;

pub async fn serve(database_url: &str, bind_address: &str) -> Result<()> {
    trace!("Entering serve function");
    info!("Paddock starting up");
    debug!("Database URL: {}", database_url);
    debug!("Bind address: {}", bind_address);

    let state = initialize_app_state_with_url(database_url)
        .await
        .inspect_err(|e| error!("Failed to initialize application state: {}", e))?;
    debug!("Application state initialized successfully");

    let app = create_router(state);

    info!("Starting server on {}", bind_address);
    let listener = TcpListener::bind(bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind to address {}: {}", bind_address, e))?;

    info!("Paddock API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
