use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub to: Option<String>,
    pub prompt: Option<String>,
    pub response: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmailResult {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Returns the value as given, or `None` when it is absent or blank.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
