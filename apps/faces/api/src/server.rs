//! HTTP server initialization and lifecycle management
//!
//! This module handles all server setup:
//! - Tracing initialization
//! - Qdrant connection and collection bootstrap
//! - Router composition (API, health, Swagger UI)
//! - Graceful shutdown on SIGINT/SIGTERM

use std::time::Duration;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use core_config::{Environment, FromEnv, server::ServerConfig};
use domain_faces::{
    FaceIndex, FaceService, FacesApiDoc, QdrantConfig, QdrantFaceIndex, StoreSettings, handlers,
};
use eyre::{Result, WrapErr};
use serde::Serialize;
use tokio::signal;
use tower_http::{
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    };

    (StatusCode::OK, Json(response))
}

/// Compose the application router around an opened face service.
///
/// The face routes are nested under `/api`; `/health` and the Swagger UI
/// live at the root.
pub fn create_router<I: FaceIndex + 'static>(
    service: FaceService<I>,
    request_timeout: Duration,
) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", FacesApiDoc::openapi()))
        .route("/health", get(health_handler))
        .nest("/api", handlers::router(service))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Run the HTTP server
///
/// 1. Sets up structured logging (JSON for prod, pretty for dev)
/// 2. Loads Qdrant, store and server configuration from the environment
/// 3. Connects to Qdrant and ensures the face collection exists
/// 4. Serves the API until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error if configuration is invalid, Qdrant is unreachable, the
/// collection cannot be created, or the listener fails to bind.
pub async fn run() -> Result<()> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment, "info,faces_api=debug,domain_faces=debug");

    let qdrant_config = QdrantConfig::from_env().wrap_err("Failed to load Qdrant configuration")?;
    let settings = StoreSettings::from_env().wrap_err("Failed to load face store configuration")?;
    let server_config = ServerConfig::from_env().wrap_err("Failed to load server configuration")?;

    info!("Connecting to Qdrant at {}...", qdrant_config.endpoint.url());
    let index = QdrantFaceIndex::connect(&qdrant_config)
        .await
        .wrap_err("Failed to connect to Qdrant")?;

    let service = FaceService::open(index, settings)
        .await
        .wrap_err("Failed to open face collection")?;
    info!(
        collection = service.collection(),
        dimension = service.config().dimension,
        distance = %service.config().distance,
        "Face store ready"
    );

    let router = create_router(service, server_config.request_timeout());

    let listener = tokio::net::TcpListener::bind(server_config.address())
        .await
        .wrap_err_with(|| format!("Failed to bind {}", server_config.address()))?;
    info!("Faces API listening on {}", listener.local_addr()?);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("HTTP server failed")?;

    info!("Faces API stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use domain_faces::{CollectionConfig, InMemoryFaceIndex};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn app() -> Router {
        let settings = StoreSettings::new("faces").with_config(CollectionConfig::new(2));
        let service = FaceService::open(InMemoryFaceIndex::new(), settings)
            .await
            .unwrap();
        create_router(service, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = app()
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_face_routes_are_nested_under_api() {
        let router = app().await;

        let nested = router
            .clone()
            .oneshot(Request::get("/api/collection").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(nested.status(), StatusCode::OK);

        let bare = router
            .oneshot(Request::get("/collection").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(bare.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let response = app()
            .await
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(doc["paths"]["/faces"].is_object());
    }
}
