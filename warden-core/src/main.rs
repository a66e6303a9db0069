mod api;
mod app;
mod config;
mod middleware;
mod repository;
mod routes;
mod seed;
mod state;

use crate::config::{AppConfig, LogFormat};
use crate::state::AppState;
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    // Initialize structured logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "warden=debug,warden_endpoint=debug,warden_policy=debug,tower_http=debug,axum=debug".into()
    });
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }

    info!("Warden authorization service");
    info!("Default domain: {}", config.default_domain);
    info!("Endpoint inventory: {}", config.database_url);

    let (guarded, registry) = api::registrar().finish();
    let state = AppState::new(config.clone(), &registry).await?;
    let app = app::build_app(state.clone(), guarded);

    // Every module is initialized; publish the endpoint inventory
    let publication = state.publish_inventory(registry).await;
    tokio::spawn(async move {
        match publication.await {
            Ok(report) => info!(
                records = report.records,
                delivered = report.delivered.len(),
                failed = report.failed.len(),
                "Endpoint inventory published"
            ),
            Err(e) => error!(error = %e, "Endpoint publication task aborted"),
        }
    });

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Warden API listening on http://{}", addr);
    info!("Health at http://localhost:{}/api/v1/health", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
