pub mod api;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod mailer;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use config::AppConfig;
use gemini::GeminiClient;
use mailer::{Mailer, SmtpMailer};

/// Shared, read-only state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub gemini: GeminiClient,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(gemini: GeminiClient, mailer: Arc<dyn Mailer>) -> Self {
        Self { gemini, mailer }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            GeminiClient::new(config.gemini.clone()),
            Arc::new(SmtpMailer::new(config.smtp.clone())),
        )
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router(state).layer(cors)
}

pub async fn run_server(app: Router, port: u16) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
