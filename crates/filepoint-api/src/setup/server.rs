//! Server startup and graceful shutdown (spec.md §5: "signal handler stops
//! the router, waits for in-flight handlers to drain, closes
//! publisher/subscriber/cache in reverse dependency order").

use anyhow::Result;
use axum::Router;
use filepoint_core::Config;

pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    tracing::info!(addr = %config.addr, "starting dispatch service");

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C signal"),
        _ = terminate => tracing::info!("received terminate signal"),
    }

    tracing::info!("shutting down gracefully");
    filepoint_infra::shutdown_telemetry().await;
}
