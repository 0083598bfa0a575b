use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use creator_swipes::auth::AuthSettings;
use creator_swipes::config::{Cli, Config, resolve_paths};
use creator_swipes::db::Database;
use creator_swipes::handler::AppState;
use creator_swipes::rate_limit::RateLimiter;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();
    let (config_path, data_dir) = resolve_paths(args.config_path);

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("swipes.svc starting");

    let cfg = Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    let db = Arc::new(Database::new(&cfg, &data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    }));

    let cancellation_token = CancellationToken::new();
    let limiter = Arc::new(RateLimiter::from_config(&cfg.rate_limit));
    limiter.start_cleanup_task(
        Duration::from_secs(cfg.rate_limit.cleanup_interval_seconds.max(1)),
        cancellation_token.clone(),
    );

    let state = AppState {
        db,
        auth: Arc::new(AuthSettings::from(&cfg.auth)),
        limiter,
        quotas: cfg.quotas,
    };
    let app = creator_swipes::router(state);

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let signal_token = cancellation_token.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("ctrl+c signal received, preparing to shutdown");
                signal_token.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "unable to listen for ctrl+c"),
        }
    });

    tracing::info!("swipes.svc running on {}", &address);
    let shutdown = cancellation_token.clone();
    let result = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    if let Err(err) = result {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }

    tracing::info!("swipes.svc going off, graceful shutdown complete");
}
