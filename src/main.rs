// Sovereign Bridge Relay - Main Entry Point
// Receives attested batches from the sovereign chain and submits them to
// the configured destination chains.

use std::net::SocketAddr;
use std::sync::Arc;

use sovereign_bridge_relay::app_state::{AppState, SharedState};
use sovereign_bridge_relay::config::RelayConfig;
use sovereign_bridge_relay::{logging, routes};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    println!("\n═══════════════════════════════════════════════");
    println!("     🌉 Sovereign Bridge Relay");
    println!("═══════════════════════════════════════════════\n");

    dotenv::dotenv().ok();
    logging::init();

    if let Err(e) = run().await {
        error!(error = %e, "bridge relay stopped");
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = RelayConfig::from_env()?;
    let state: SharedState = Arc::new(AppState::from_config(&config)?);
    let app = routes::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n╔════════════════════════════════════════════╗");
    println!("║   🚀 RELAY RUNNING                         ║");
    println!("║   📡 http://{:<31}║", addr);
    println!("╚════════════════════════════════════════════╝\n");

    println!("📋 Available Endpoints:");
    println!("   POST /bridge/send       - Relay bridge operations (JSON)");
    println!("   *    application/grpc*  - Relay bridge operations (binary)");
    println!("   GET  /health            - Liveness check");
    println!("   GET  /status            - Configured chains and uptime\n");

    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("👋 Goodbye!\n");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    println!("\n\n🛑 Shutdown signal received...");
}
