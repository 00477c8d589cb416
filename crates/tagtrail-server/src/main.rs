mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use tagtrail_api::ApiState;
use tagtrail_domain::{IngestionService, IngestionServiceConfig, QueryService};
use tagtrail_redis::{
    RedisClient, RedisDeviceSessionRepository, RedisGatewayTelemetryRepository,
    RedisLiveStateRepository, RedisObservationRecorder, RedisTagHistoryRepository,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let config = match config::ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "server exited with error");
        std::process::exit(1);
    }
}

async fn run(config: config::ServerConfig) -> Result<()> {
    info!(redis_url = %config.redis_url, "starting tagtrail server");

    let client = RedisClient::connect(&config.redis_url)
        .await
        .context("failed to connect to redis")?;
    client.ping().await.context("redis ping failed")?;

    let live = Arc::new(RedisLiveStateRepository::new(client.clone()));
    let history = Arc::new(RedisTagHistoryRepository::new(client.clone()));
    let recorder = Arc::new(RedisObservationRecorder::new(client.clone()));
    let telemetry = Arc::new(RedisGatewayTelemetryRepository::new(client.clone()));
    let sessions = Arc::new(RedisDeviceSessionRepository::new(client));

    let ingestion = Arc::new(IngestionService::new(
        recorder,
        history.clone(),
        telemetry,
        sessions,
        IngestionServiceConfig {
            trim_strategy: config.trim_strategy()?,
        },
    ));
    let query = Arc::new(QueryService::new(live, history));

    let app = tagtrail_api::router(ApiState::new(ingestion, query, &config.api_key));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(bind_addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
