//! Server lifecycle management
//!
//! Spawns the single router task and the HTTP server that feeds it.

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{error, info};

use roomcast_core::service::{Router, RouterHandle};
use roomcast_core::Config;

/// roomcast server - owns the router task and the HTTP listener
pub struct RelayServer {
    config: Config,
}

impl RelayServer {
    /// Create a new server instance
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Start all components and wait for them
    pub async fn start(self) -> Result<()> {
        let router = Router::spawn();
        info!("room router started");

        let http_handle = self.start_http_server(router)?;
        info!("all components started");

        if let Err(e) = http_handle.await {
            error!("HTTP server task failed: {e}");
        }
        Ok(())
    }

    /// Start HTTP server
    fn start_http_server(&self, router: RouterHandle) -> Result<JoinHandle<()>> {
        let http_addr = self.config.http_addr()?;
        let http_router = roomcast_api::http::create_router(router, &self.config);

        let handle = tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(http_addr).await {
                Ok(listener) => listener,
                Err(e) => {
                    error!("Failed to bind HTTP address {http_addr}: {e}");
                    return;
                }
            };

            info!("HTTP server listening on {}", http_addr);

            if let Err(e) = axum::serve(listener, http_router).await {
                error!("HTTP server error: {}", e);
            }
        });

        Ok(handle)
    }
}
