//! Application startup and lifecycle management.

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, tracing::make_request_span,
};
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use crate::config::RegistrationConfig;
use crate::handlers;
use crate::services::{connect_store, StoreConnection};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: StoreConnection,
    pub database: String,
    pub collection: String,
}

impl AppState {
    pub fn new(store: StoreConnection, config: &RegistrationConfig) -> Self {
        Self {
            store,
            database: config.mongodb.database.clone(),
            collection: config.mongodb.collection.clone(),
        }
    }
}

pub fn build_router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(static_dir.join("form.html")))
        .route_service("/dashboard", ServeFile::new(static_dir.join("dashboard.html")))
        .route("/register", post(handlers::create_registration))
        .route("/registrations", get(handlers::list_registrations))
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .layer(CorsLayer::permissive())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        // Outermost, so the span above sees the assigned request id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    store: StoreConnection,
}

impl Application {
    /// Connects to storage (best effort) and binds the listener.
    pub async fn build(config: RegistrationConfig) -> Result<Self, AppError> {
        let store = connect_store(&config.mongodb).await;
        Self::build_with_store(config, store).await
    }

    /// Builds the application around an already-resolved storage connection.
    pub async fn build_with_store(
        config: RegistrationConfig,
        store: StoreConnection,
    ) -> Result<Self, AppError> {
        let state = AppState::new(store.clone(), &config);
        let router = build_router(state, &config.static_dir);

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            mongodb = %store.status(),
            database = %config.mongodb.database,
            collection = %config.mongodb.collection,
            "Registration service ready"
        );

        Ok(Self {
            port,
            listener,
            router,
            store,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> &StoreConnection {
        &self.store
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}
