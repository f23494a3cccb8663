//! `RelayServer`: Axum HTTP + `WebSocket` server around a [`Hub`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::header;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use relay_core::{Close, Message, RelayError};
use relay_hub::Hub;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::stream::run_stream_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The broadcast hub.
    pub hub: Arc<Hub>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle for `/metrics`.
    pub metrics: PrometheusHandle,
}

/// The relay hub server.
pub struct RelayServer {
    config: Arc<ServerConfig>,
    hub: Arc<Hub>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: PrometheusHandle,
}

impl RelayServer {
    /// Create a server with an empty hub.
    pub fn new(config: ServerConfig, metrics: PrometheusHandle) -> Self {
        let hub = Hub::new(config.hub_config());
        Self {
            config: Arc::new(config),
            hub: Arc::new(hub),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics,
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            hub: Arc::clone(&self.hub),
            shutdown: Arc::clone(&self.shutdown),
            config: Arc::clone(&self.config),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route("/stream", get(stream_handler))
            .route("/broadcast", post(broadcast_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(state)
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>), RelayError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|cause| RelayError::TransportListenFailed {
                addr: addr.clone(),
                cause,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|cause| RelayError::TransportListenFailed { addr, cause })?;

        let router = self.router();
        let stop = self.shutdown.token();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(stop.cancelled_owned())
                .await
            {
                error!(error = %e, "server terminated");
            }
        });

        info!(%local_addr, "relay hub listening");
        Ok((local_addr, handle))
    }

    /// Start periodic registry compaction, stopped by shutdown.
    pub fn spawn_compaction(&self) -> JoinHandle<()> {
        relay_hub::spawn_compaction(
            Arc::clone(&self.hub),
            self.config.compact_interval(),
            self.shutdown.token(),
        )
    }

    /// The hub.
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /stream
async fn stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let cancel = state.shutdown.subscription_token();
    let handshake_timeout = state.config.handshake_timeout();
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| run_stream_session(socket, state.hub, cancel, handshake_timeout))
}

/// POST /broadcast
async fn broadcast_handler(
    State(state): State<AppState>,
    Json(message): Json<Message>,
) -> Json<Close> {
    let _ = state.hub.broadcast(&message).await;
    Json(Close::default())
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        &state.hub,
        state.shutdown.is_shutting_down(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::render(&state.metrics),
    )
}
