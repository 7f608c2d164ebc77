use crate::admission::AdmissionController;
use crate::auth::ApiKeys;
use crate::config::Config;
use crate::directory::Directory;
use crate::error::ClubsResult;
use crate::handlers::{
    create_club, delete_club, filter_by_nation, health_check, list_clubs, AppState, SharedState,
};
use crate::middleware::{access_gate, logging_middleware};
use axum::routing::{delete, get};
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the application state and its owned directory.
pub fn create_state(config: &Config) -> SharedState {
    Arc::new(AppState {
        directory: Arc::new(Directory::start(config.index_lag())),
        admission: AdmissionController::from_config(config),
        api_keys: ApiKeys::new(config.api_key_list()),
    })
}

pub fn create_app(state: SharedState) -> Router {
    let api = Router::new()
        .route("/clubs", get(list_clubs).post(create_club))
        .route("/clubs/:id", delete(delete_club))
        .route("/nation", get(filter_by_nation))
        .route_layer(middleware::from_fn_with_state(state.clone(), access_gate));

    Router::new()
        .merge(api)
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware))
        )
}

pub struct Server {
    app: Router,
    directory: Arc<Directory>,
    bind_addr: SocketAddr,
}

impl Server {
    pub fn new(config: Config) -> ClubsResult<Self> {
        config.validate()?;

        let state = create_state(&config);
        let directory = Arc::clone(&state.directory);
        let app = create_app(state);

        Ok(Self {
            app,
            directory,
            bind_addr: config.bind_addr,
        })
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let Server { app, directory, bind_addr } = self;
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;

        tracing::info!("Clubs server listening on {}", bind_addr);
        tracing::info!("Health check available at /health");

        // Run server with graceful shutdown
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        match Arc::try_unwrap(directory) {
            Ok(directory) => directory.shutdown().await,
            Err(_) => tracing::warn!("Directory still referenced, skipping index drain"),
        }

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
