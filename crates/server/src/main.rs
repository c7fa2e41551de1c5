mod config;
mod http;
mod identity;
mod state;

use anyhow::Context;
use dotenvy::dotenv;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use domain::Language;
use http::router::build_router;
use identity::IdentityGuard;
use state::AppState;
use storage::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;
    let store = adapter::build_store(settings.board.mode, &db);

    let (tx_cmd, rx_cmd) = mpsc::channel(100);
    let (tx_ingest, _rx_ingest) = broadcast::channel(100);
    let cancel_token = CancellationToken::new();

    let worker = {
        let store = store.clone();
        let tx_ingest = tx_ingest.clone();
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            if let Err(e) =
                adapter::start_with_cancel_token(store, rx_cmd, tx_ingest, cancel_token).await
            {
                tracing::error!("Command worker crashed: {:?}", e);
            }
        })
    };

    let default_language = match settings.server.default_language.as_str() {
        "auto" => Language::detect(std::env::var("LANG").ok().as_deref()),
        other => other
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid server.default_language")?,
    };

    let state = AppState {
        db,
        store,
        sender: tx_cmd,
        tx_ingest,
        identity: IdentityGuard::new(
            &settings.security.token_secret,
            settings.security.session_ttl_hours,
        ),
        default_language,
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel_token.cancel();
    let _ = worker.await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
