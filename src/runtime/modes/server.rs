//! Server mode
//!
//! Initializes the click log, wires the analytics components and runs the
//! HTTP server.

use actix_web::{App, HttpServer, middleware::Compress};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{self, services::AppStartTime};
use crate::config::StaticConfig;
use crate::runtime::lifetime;

/// Run the HTTP server
///
/// **Note**: Logging system must be initialized before calling this function
pub async fn run_server(config: Arc<StaticConfig>) -> Result<()> {
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let context = lifetime::startup::prepare_startup(&config).inspect_err(|e| {
        tracing::error!("Server startup failed: {:#}", e);
    })?;

    let api_config = config.api.clone();
    let cpu_count = config.server.cpu_count.clamp(1, 32);
    warn!("Using {} CPU cores for the server", cpu_count);

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new().wrap(Compress::default()).configure(api::configure(
            context.clone(),
            api_config.clone(),
            app_start_time.clone(),
        ))
    })
    .workers(cpu_count)
    .bind(&bind_address)?
    .run()
    .await?;

    info!("Server stopped");
    Ok(())
}
