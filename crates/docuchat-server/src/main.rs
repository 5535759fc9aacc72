use anyhow::Result;
use docuchat_server::http::{HttpConfig, HttpServer};
use docuchat_server::AppCore;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing logger
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,docuchat_core=debug,docuchat_server=debug".into()),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting docuchat server");

    let core = AppCore::from_env();

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let shutdown_core = core.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            // Let in-flight chat streams finish their terminal frame.
            shutdown_core.shutdown.cancel();
            let _ = shutdown_tx.send(());
        }
    });

    let server = HttpServer::new(HttpConfig::default(), core);
    server.run(shutdown_rx).await
}
