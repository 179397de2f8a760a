use std::sync::Arc;

use notary_service::{NotaryService, StagingArea};
use tokio::net::TcpListener;

use crate::config::{NotaryConfig, ServerConfig};
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// Notary HTTP server.
pub struct NotaryServer {
    config: ServerConfig,
    service: Arc<NotaryService>,
}

impl NotaryServer {
    pub fn new(config: ServerConfig, service: NotaryService) -> Self {
        let service = service.with_staging(StagingArea::new(config.staging_dir.clone()));
        Self {
            config,
            service: Arc::new(service),
        }
    }

    /// Connect the configured ledger and build a server around it.
    pub fn from_config(config: &NotaryConfig) -> ServerResult<Self> {
        let service = NotaryService::from_config(&config.ledger, &config.confirmation)?;
        Ok(Self::new(config.server.clone(), service))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn service(&self) -> &Arc<NotaryService> {
        &self.service
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AppState::new(Arc::clone(&self.service)), &self.config)
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            contract = %self.service.contract_address(),
            signer = %self.service.signer(),
            "Notary server listening on {}",
            self.config.bind_addr
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                tracing::info!("shutting down");
            })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
