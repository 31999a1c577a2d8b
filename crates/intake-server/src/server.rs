use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use intake_storage::StorageError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    error_log::{ErrorLog, FileErrorLog},
    handlers,
    intake::IntakeService,
    middleware as app_middleware,
    realtime::BroadcastHub,
    storage::build_store,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub intake: IntakeService,
    pub hub: Arc<BroadcastHub>,
}

impl AppState {
    pub fn new(intake: IntakeService, hub: Arc<BroadcastHub>) -> Self {
        Self { intake, hub }
    }

    /// Open the configured store and error log and create an empty hub.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, StorageError> {
        let store = build_store(&cfg.storage).await?;
        let error_log: Arc<dyn ErrorLog> = Arc::new(FileErrorLog::new(&cfg.error_log.path));
        let hub = Arc::new(BroadcastHub::from_config(&cfg.realtime));
        Ok(Self::new(IntakeService::new(store, error_log), hub))
    }
}

pub struct IntakeServer {
    addr: SocketAddr,
    app: Router,
    hub: Arc<BroadcastHub>,
}

pub async fn build_app(cfg: &AppConfig) -> Result<Router, StorageError> {
    let state = AppState::from_config(cfg).await?;
    Ok(router(state, cfg))
}

pub fn router(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Patient intake
        .route("/api/patients", post(handlers::create_patient))
        .route("/api/patients/search", get(handlers::search_patients))
        // Real-time relay
        .route("/ws", get(handlers::websocket))
        .with_state(state)
        // Middleware stack (outermost last: request id -> trace -> cors -> body limit)
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> Result<IntakeServer, StorageError> {
        let state = AppState::from_config(&self.config).await?;
        let hub = state.hub.clone();
        let app = router(state, &self.config);

        Ok(IntakeServer {
            addr: self.addr,
            app,
            hub,
        })
    }
}

impl IntakeServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        let hub = self.hub;
        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let closed = hub.close_all();
                tracing::info!(connections = closed, "Closing WebSocket connections");
            })
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
