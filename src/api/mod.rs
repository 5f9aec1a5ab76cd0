mod error;
mod handlers;
mod models;

use std::sync::Arc;

use axum::{routing::post, Router};

use crate::AppState;

pub use error::ApiError;
pub use handlers::{ask, not_found, send_email};
pub use models::{AnswerResponse, EmailRequest, EmailResult, ErrorResponse, PromptRequest};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ask", post(ask))
        .route("/send-email", post(send_email))
        .fallback(not_found)
        .with_state(state)
}
