//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the streaming endpoint
//! - Wire middleware (request tracing, optional basic auth)
//! - Serve with graceful shutdown tied to the stop signal

use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::http::auth::basic_auth_middleware;
use crate::http::websocket::ws_handler;
use crate::hub::StatusHub;

/// Path of the streaming endpoint.
pub const WS_PATH: &str = "/ws";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<StatusHub>,
    /// Session idle interval before a keepalive ping.
    pub keepalive: Duration,
}

/// HTTP server carrying the streaming endpoint.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the router and middleware stack from the configuration.
    pub fn new(config: &AppConfig, hub: Arc<StatusHub>) -> Self {
        let state = AppState {
            hub,
            keepalive: Duration::from_secs(config.stream.keepalive_secs),
        };

        let mut router = Router::new()
            .route(WS_PATH, get(ws_handler))
            .with_state(state);

        if config.has_basic_auth() {
            let credentials = Arc::new(config.basic_auth.clone());
            router = router.layer(axum::middleware::from_fn_with_state(
                credentials,
                basic_auth_middleware,
            ));
        }

        // Outermost, so rejected requests are traced too.
        let router = router.layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Serve until the stop signal fires, then stop accepting new
    /// connections and drain the in-flight ones.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
