use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use rust_embed::RustEmbed;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::activities::ActivityRegistry;
use crate::api;
use crate::error::MergingtonError;

const INDEX_PATH: &str = "/static/index.html";

// Front-end assets are compiled into the binary
#[derive(RustEmbed)]
#[folder = "static/"]
struct Asset;

pub struct WebServer {
    host: String,
    port: u16,
    registry: Arc<ActivityRegistry>,
}

impl WebServer {
    pub fn new(host: String, port: u16, registry: Arc<ActivityRegistry>) -> Self {
        Self {
            host,
            port,
            registry,
        }
    }

    pub async fn start(&self) -> Result<(), MergingtonError> {
        let app = create_router(Arc::clone(&self.registry));

        let addr: SocketAddr = format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| MergingtonError::Error(format!("Invalid address: {}", e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| MergingtonError::Error(format!("Failed to bind to {}: {}", addr, e)))?;

        println!("Mergington activities server starting on http://{}", addr);
        log::info!(
            "Server ready to handle requests ({} activities loaded)",
            self.registry.len()
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_signal().await;
                log::info!("Shutdown signal received, stopping server");
                println!("\nShutdown signal received - stopping server gracefully...");
            })
            .await
            .map_err(|e| MergingtonError::Error(format!("Server error: {}", e)))?;

        log::info!("Server shutdown complete");

        Ok(())
    }
}

/// Builds the full application router around a shared registry
pub fn create_router(registry: Arc<ActivityRegistry>) -> Router {
    let app_state = api::AppState::new(registry);

    Router::new()
        // Front end
        .route("/", get(|| async { Redirect::temporary(INDEX_PATH) }))
        .route("/static/{*path}", get(static_handler))

        // Health check
        .route("/health", get(health_check))

        // App info
        .route("/api/app-info", get(api::app::get_app_info))

        // Activity endpoints
        .route("/activities", get(api::activities::list_activities))
        .route(
            "/activities/{activity_name}/signup",
            post(api::activities::signup_for_activity),
        )
        .route(
            "/activities/{activity_name}/unregister",
            post(api::activities::unregister_from_activity),
        )

        // Add state for handlers
        .with_state(app_state)
}

async fn health_check() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::OK,
        Html("<h1>Mergington Activities</h1><p>Server is running</p>"),
    )
}

// Serves an embedded front-end file
async fn static_handler(Path(path): Path<String>) -> Response {
    match Asset::get(&path) {
        Some(content) => {
            let mime = mime_guess::from_path(&path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], content.data).into_response()
        }
        None => {
            log::debug!("Static asset not found: {}", path);
            (StatusCode::NOT_FOUND, "404 Not Found").into_response()
        }
    }
}

/// Waits for a shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
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
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received SIGINT (Ctrl+C)");
        },
        _ = terminate => {
            log::info!("Received SIGTERM");
        },
    }
}
