//! WebSocket and HTTP gateway for TeamMate.
//!
//! - `GET  /ws`               duplex chat protocol
//! - `GET  /`                 liveness
//! - `GET  /health`           version and vector-store readiness
//! - `POST /create-schema/`   apply the schema file
//! - `POST /reset-schema/`    drop all classes and re-apply
//! - `GET  /schema-status/`   compare live classes with the file
//! - `POST /load-data/`       bulk import a CSV upload
//! - `POST /semantic-search/` raw search results
//!
//! Built on Axum.

pub mod control;
pub mod error;
pub mod schema;
pub mod ws;

#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::Json;
use axum::{
    Router,
    routing::{get, post},
};
use serde::Serialize;
use teammate_channels::ConnectionRegistry;
use teammate_config::AppConfig;
use teammate_core::event::EventBus;
use teammate_core::vector::VectorStore;
use teammate_protocol::ProtocolEngine;
use teammate_sessions::SessionStore;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

pub use schema::SchemaManager;

/// Largest accepted CSV upload.
const UPLOAD_LIMIT: usize = 64 * 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<ProtocolEngine>,
    pub vector_store: Arc<dyn VectorStore>,
    pub schema: SchemaManager,
    pub staging_dir: PathBuf,
    pub default_class: String,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Build every subsystem from configuration.
    ///
    /// Fails when no generation credential is configured.
    pub fn from_config(config: &AppConfig) -> teammate_core::Result<Self> {
        let generator = teammate_providers::build_generator(config)?;
        let vector_store = teammate_providers::build_vector_store(config)?;

        let mut engine = ProtocolEngine::new(
            Arc::new(SessionStore::new()),
            Arc::new(ConnectionRegistry::new()),
            generator,
            Arc::new(EventBus::default()),
        );
        if let Some(class_name) = &config.retrieval.class_name {
            info!(class = %class_name, "Retrieval context enabled");
            engine = engine.with_retrieval(vector_store.clone(), class_name.clone());
        }

        Ok(Self {
            engine: Arc::new(engine),
            schema: SchemaManager::new(vector_store.clone(), &config.data.schema_path),
            vector_store,
            staging_dir: config.data.staging_dir.clone(),
            default_class: config.data.default_class.clone(),
        })
    }
}

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(control::root))
        .route("/health", get(health_handler))
        .route("/ws", get(ws::ws_handler))
        .route("/create-schema/", post(control::create_schema))
        .route("/reset-schema/", post(control::reset_schema))
        .route("/schema-status/", get(control::schema_status))
        .route(
            "/load-data/",
            post(control::load_data).layer(DefaultBodyLimit::max(UPLOAD_LIMIT)),
        )
        .route("/semantic-search/", post(control::semantic_search))
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway server and run until interrupted.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState::from_config(&config)?);

    spawn_event_logger(state.engine.event_bus().subscribe());

    let app = build_router(state);
    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Gateway stopped");
    Ok(())
}

/// Log every domain event at debug level.
fn spawn_event_logger(mut events: broadcast::Receiver<Arc<teammate_core::DomainEvent>>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => debug!(event = event.name(), details = ?event, "Domain event"),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install CTRL+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    vector_store: bool,
    active_connections: usize,
    sessions: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let vector_store = match state.vector_store.health_check().await {
        Ok(ready) => ready,
        Err(e) => {
            debug!(error = %e, "Vector store readiness check failed");
            false
        }
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        vector_store,
        active_connections: state.engine.connections().active_connections().await,
        sessions: state.engine.sessions().len(),
    })
}
