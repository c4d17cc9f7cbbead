//! HTTP surface receiving alert webhooks

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::common::errors::{Result, TradingError};
use crate::router::AlertRouter;

pub struct WebhookServer {
    router: Arc<AlertRouter>,
}

impl WebhookServer {
    #[must_use]
    pub const fn new(router: Arc<AlertRouter>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/webhook", post(handlers::receive_alert))
            .route("/health", get(handlers::health))
            .layer(TraceLayer::new_for_http())
            .with_state(self.router.clone())
    }

    /// Serve until `shutdown` resolves.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve<F>(self, addr: &str, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| TradingError::Internal(format!("bind {}: {}", addr, e)))?;
        info!("Webhook listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| TradingError::Internal(e.to_string()))?;

        Ok(())
    }
}
