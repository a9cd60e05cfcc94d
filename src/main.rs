use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use smartlinks::{api::create_router, config::Config, database::Database, error::Result};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real deployments set env vars directly.
    dotenvy::dotenv().ok();

    init_tracing();

    info!("starting SmartLinks service");

    let config = Config::from_env()?;
    config.validate()?;

    let database = Database::connect(&config.database_url).await?;
    database.migrate().await?;
    info!(database_url = %config.database_url, "database ready");

    let app = create_router(database, config.clone());

    let addr = SocketAddr::new(config.host.parse().map_err(|_| {
        smartlinks::AppError::Config(format!("invalid HOST '{}'", config.host))
    })?, config.port);
    info!(%addr, base_url = %config.base_url, "listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| smartlinks::AppError::Server(e.to_string()))?;

    Ok(())
}

/// Structured logging via `tracing`. `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smartlinks=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .init();
}
