//! Mapping of component failures onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::gemini::GeminiError;
use crate::mailer::MailError;

use super::models::ErrorResponse;

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed client input.
    Validation(String),
    /// The server lacks a secret it needs for this route.
    Configuration(String),
    /// The LLM answered with an error or with nothing usable.
    BadGateway(String),
    /// Mail delivery failed; the detail is passed to the client.
    MailDelivery(String),
    /// Anything else. Only `code` reaches the client.
    Internal { code: &'static str, detail: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Configuration(_) | Self::MailDelivery(_) | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Validation(msg) | Self::Configuration(msg) | Self::BadGateway(msg) => {
                msg.clone()
            }
            Self::MailDelivery(detail) => format!("failed to send email: {detail}"),
            Self::Internal { code, .. } => format!("internal server error (code: {code})"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<GeminiError> for ApiError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::MissingApiKey => {
                Self::Configuration("Server missing GEMINI_API_KEY".to_string())
            }
            GeminiError::Upstream { .. } | GeminiError::EmptyResponse => {
                Self::BadGateway(err.to_string())
            }
            GeminiError::Timeout(_) => Self::Internal {
                code: "llm_timeout",
                detail: err.to_string(),
            },
            GeminiError::Transport(_) => Self::Internal {
                code: "llm_transport",
                detail: err.to_string(),
            },
            GeminiError::Decode(_) => Self::Internal {
                code: "llm_decode",
                detail: err.to_string(),
            },
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::InvalidAddress { .. } => Self::Validation(err.to_string()),
            MailError::NotConfigured(_)
            | MailError::Build(_)
            | MailError::Authentication(_)
            | MailError::Transport(_) => Self::MailDelivery(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { code, detail } = &self {
            error!(code, %detail, "request failed");
        }
        (
            self.status(),
            Json(ErrorResponse {
                error: self.client_message(),
            }),
        )
            .into_response()
    }
}
