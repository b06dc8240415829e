mod config;

use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use chirpy_api::routes;
use chirpy_api::{AppStateInner, SessionIssuer};
use chirpy_db::Database;

use crate::config::{Args, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "chirpy_server=debug,chirpy_api=debug,chirpy_db=debug,tower_http=debug".into()
            }),
        )
        .init();

    let args = Args::parse();

    // Config
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("FATAL: {:#}", e);
            eprintln!("FATAL: {:#}", e);
            eprintln!("       Set CHIRPY_JWT_SECRET in your .env file and restart.");
            std::process::exit(1);
        }
    };

    if args.debug {
        match std::fs::remove_file(&config.db_path) {
            Ok(()) => warn!("Debug mode: deleted {}", config.db_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    // Init database
    let db = Database::open(&config.db_path)?;
    let sessions = SessionIssuer::new(&config.jwt_secret)?;

    // Shared state
    let state = AppStateInner::new(db, sessions, &config.assets_dir);

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Serving static files from {}", config.assets_dir.display());
    info!("Chirpy server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
