//! Relay Gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p relay-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use relay_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Relay failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration first so logging can follow the environment
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!("Starting {}...", config.app.name);
    info!(
        env = ?config.app.env,
        address = %config.server.address(),
        queue_capacity = config.hub.queue_capacity,
        connection_buffer = config.hub.connection_buffer,
        send_timeout_ms = ?config.hub.send_timeout_ms,
        "Configuration loaded"
    );

    relay_gateway::run(config).await?;

    Ok(())
}
