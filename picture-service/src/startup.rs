use crate::config::PictureConfig;
use crate::handlers;
use crate::services::{load_seed_file, seed_store, MongoDb, PictureStore};
use axum::middleware::from_fn;
use axum::{routing::get, Router};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{make_request_span, request_id_middleware},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

/// Shared application state. The store is the only shared resource.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PictureStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn PictureStore>) -> Self {
        Self { store }
    }
}

/// Build the HTTP router over any store implementation.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/count", get(handlers::count_pictures))
        .route(
            "/picture",
            get(handlers::list_pictures).post(handlers::create_picture),
        )
        .route(
            "/picture/:id",
            get(handlers::get_picture)
                .put(handlers::update_picture)
                .delete(handlers::delete_picture),
        )
        // route_layer so the matched route template is visible to metrics
        .route_layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: MongoDb,
}

impl Application {
    /// Run the startup sequence: load the seed file, connect to MongoDB,
    /// reseed the collection and bind the listener. Any failure aborts
    /// startup.
    pub async fn build(config: PictureConfig) -> Result<Self, AppError> {
        let seed = load_seed_file(&config.seed_file).await?;

        let db = MongoDb::connect(&config.mongodb).await?;

        seed_store(&db, seed).await?;

        let state = AppState::new(Arc::new(db.clone()));
        let router = router(state);

        // Port 0 binds a random port, used by tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Picture service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &MongoDb {
        &self.db
    }

    /// Serve until SIGINT/SIGTERM, then close the MongoDB client.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.db.shutdown().await;
        Ok(())
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
