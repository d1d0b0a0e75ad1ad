use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};

use crate::app::app;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::state::AppState;

pub async fn handle(mut config: AppConfig, port: Option<u16>, migrate: bool) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    info!(
        "Starting Opportunity API in {:?} mode ({:?} store)",
        config.environment, config.database.backend
    );

    let bind_addr = config.bind_addr();
    let (state, manager) = AppState::connect(config)
        .await
        .context("failed to open the opportunity store")?;

    let outcome = super::finally(serve(state, manager.as_ref(), migrate, &bind_addr), async {
        if let Some(manager) = &manager {
            manager.close().await;
        }
    })
    .await;

    outcome?;
    info!("Server stopped");
    Ok(())
}

async fn serve(
    state: AppState,
    manager: Option<&DatabaseManager>,
    migrate: bool,
    bind_addr: &str,
) -> anyhow::Result<()> {
    if migrate {
        match manager {
            Some(manager) => manager.migrate().await.context("migration failed")?,
            None => warn!("--migrate ignored: the memory store has no schema"),
        }
    }

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Opportunity API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, shutting down");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
