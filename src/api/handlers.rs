use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info};

use crate::mailer::AnswerEmail;
use crate::AppState;

use super::error::ApiError;
use super::models::{
    non_empty, AnswerResponse, EmailRequest, EmailResult, ErrorResponse, PromptRequest,
};

pub async fn ask(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let Json(payload) = payload?;
    let prompt = non_empty(payload.prompt)
        .ok_or_else(|| ApiError::Validation("No prompt provided".to_string()))?;

    debug!(prompt_len = prompt.len(), model = state.gemini.model(), "answering prompt");
    let response = state.gemini.generate(&prompt).await?;

    Ok(Json(AnswerResponse { response }))
}

pub async fn send_email(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<Json<EmailResult>, ApiError> {
    let Json(payload) = payload?;

    let to = non_empty(payload.to);
    let question = non_empty(payload.prompt);
    let answer = non_empty(payload.response);

    let missing: Vec<&str> = [
        ("to", to.is_none()),
        ("prompt", question.is_none()),
        ("response", answer.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    let (Some(to), Some(question), Some(answer)) = (to, question, answer) else {
        return Err(ApiError::Validation(format!(
            "Missing fields: {}",
            missing.join(", ")
        )));
    };

    let email = AnswerEmail::new(&to, question, answer)?;
    state.mailer.send(&email).await?;
    info!(to = %email.to(), "answer emailed");

    Ok(Json(EmailResult { success: true }))
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
        }),
    )
        .into_response()
}
