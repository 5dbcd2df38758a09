mod server;

use anyhow::Result;
use tracing::info;

use roomcast_core::{logging, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration (optional file via ROOMCAST_CONFIG, env overrides)
    let config_path = std::env::var("ROOMCAST_CONFIG").ok();
    let config = Config::load(config_path.as_deref())?;

    // 2. Validate configuration (fail fast on misconfigurations)
    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    // 3. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("roomcast relay starting...");

    // 4. Start the relay
    let server = server::RelayServer::new(config);
    server.start().await
}
