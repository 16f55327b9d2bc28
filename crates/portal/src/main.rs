//! PedidoFlex Portal - B2B ordering service.
//!
//! This binary serves the ordering portal on port 4000.
//!
//! # Architecture
//!
//! - Axum web framework exposing a JSON API
//! - In-memory collection stores hydrated from a pluggable persistence
//!   backend (durable JSON snapshots, or in-memory with a live change feed)
//! - Orders are handed to the external Tray checkout provider, which
//!   returns the payment URL surfaced to the buyer
//! - Sessions are server-side (`tower-sessions` memory store)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};
use sentry::integrations::tracing as sentry_tracing;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pedidoflex_portal::checkout::{SharedCheckout, TrayCheckout};
use pedidoflex_portal::config::{PersistenceConfig, PortalConfig};
use pedidoflex_portal::persist::{MemoryStore, SharedStore, SnapshotStore, collections};
use pedidoflex_portal::routes;
use pedidoflex_portal::state::AppState;
use pedidoflex_portal::middleware;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &PortalConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Build the persistence backend selected by configuration.
fn build_persistence(config: &PortalConfig) -> SharedStore {
    match &config.persistence {
        PersistenceConfig::Snapshot { data_dir } => {
            tracing::info!(dir = %data_dir.display(), "using snapshot persistence");
            Arc::new(SnapshotStore::new(data_dir.clone()))
        }
        PersistenceConfig::Memory => {
            tracing::warn!("PORTAL_DATA_DIR not set; data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = PortalConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Initialize tracing with EnvFilter and Sentry integration
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pedidoflex_portal=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Build collaborators
    let persist = build_persistence(&config);
    let tray = TrayCheckout::new(&config.checkout).expect("Failed to build checkout client");
    let checkout: SharedCheckout = Arc::new(tray);

    // Build application state and hydrate stores from the backend
    let state = AppState::new(config.clone(), persist, checkout);
    state.hydrate().await.expect("Failed to hydrate stores");

    // Create session layer
    let session_layer = middleware::create_session_layer(state.config());

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes())
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("portal listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the persistence backend answers before returning OK.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.persist().load_all(collections::PRODUCTS).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
