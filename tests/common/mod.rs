#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Method, Request, StatusCode},
    routing::post,
    Router,
};
use http_body_util::BodyExt;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use study_buddy::config::GeminiConfig;
use study_buddy::gemini::GeminiClient;
use study_buddy::mailer::{AnswerEmail, MailError, Mailer};
use study_buddy::{build_app, AppState};

pub const MODEL: &str = "gemini-2.0-flash";
pub const API_KEY: &str = "test-key";

/// Stand-in for the Gemini endpoint: replies with a fixed status and body and
/// counts how often it was called.
#[derive(Clone)]
pub struct MockGemini {
    status: StatusCode,
    body: String,
    delay: Option<Duration>,
    hits: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<serde_json::Value>>>,
}

impl MockGemini {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
            hits: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn answering(text: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
        });
        Self::new(StatusCode::OK, body.to_string())
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// The prompt text of the most recent request, exactly as sent.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_request.lock().unwrap().as_ref().and_then(|body| {
            body["contents"][0]["parts"][0]["text"]
                .as_str()
                .map(str::to_string)
        })
    }

    /// Serves the mock on an ephemeral port and returns its base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/v1beta/models/{call}", post(mock_generate))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }
}

async fn mock_generate(
    State(mock): State<MockGemini>,
    Path(call): Path<String>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    mock.hits.fetch_add(1, Ordering::SeqCst);
    *mock.last_request.lock().unwrap() = serde_json::from_str(&body).ok();
    if let Some(delay) = mock.delay {
        tokio::time::sleep(delay).await;
    }
    if call != format!("{MODEL}:generateContent")
        || headers.get("x-goog-api-key").map(|v| v.as_bytes()) != Some(API_KEY.as_bytes())
    {
        return (StatusCode::NOT_FOUND, "unexpected request".to_string());
    }
    (mock.status, mock.body.clone())
}

/// Gemini endpoint that sends a 200 header and part of the body, then stalls
/// with the connection open. Returns its base URL.
pub async fn spawn_stalling_gemini() -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 1000\r\n\r\n";
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(br#"{"candidates":"#).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });

    format!("http://{addr}")
}

#[derive(Clone, Copy)]
pub enum SmtpStub {
    /// Greets, advertises AUTH, then rejects the login with 535.
    RejectLogin,
    /// Accepts the connection and closes it without a greeting.
    HangUp,
}

pub const SMTP_AUTH_REJECTION: &str = "535 5.7.8 Username and Password not accepted";

/// Minimal plain-text SMTP server on an ephemeral port. Returns the port.
pub async fn spawn_smtp_stub(behaviour: SmtpStub) -> u16 {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if let SmtpStub::HangUp = behaviour {
                    drop(socket);
                    return;
                }
                let (read, mut write) = socket.into_split();
                let mut lines = BufReader::new(read).lines();
                let _ = write.write_all(b"220 stub.local ESMTP ready\r\n").await;
                while let Ok(Some(line)) = lines.next_line().await {
                    let command = line.to_ascii_uppercase();
                    let reply = if command.starts_with("EHLO") || command.starts_with("HELO") {
                        "250-stub.local\r\n250 AUTH PLAIN LOGIN\r\n".to_string()
                    } else if command.starts_with("AUTH") {
                        format!("{SMTP_AUTH_REJECTION}\r\n")
                    } else if command.starts_with("QUIT") {
                        let _ = write.write_all(b"221 bye\r\n").await;
                        break;
                    } else {
                        "250 ok\r\n".to_string()
                    };
                    if write.write_all(reply.as_bytes()).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    port
}

/// Records every email instead of sending it, or fails with a fixed error.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<AnswerEmail>>,
    auth_failure: Option<String>,
}

impl RecordingMailer {
    pub fn rejecting_login(reply: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            auth_failure: Some(reply.to_string()),
        }
    }

    pub fn sent(&self) -> Vec<AnswerEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &AnswerEmail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(email.clone());
        match &self.auth_failure {
            Some(reply) => Err(MailError::Authentication(reply.clone())),
            None => Ok(()),
        }
    }
}

pub fn gemini_client(base_url: &str, api_key: Option<&str>, timeout_secs: u64) -> GeminiClient {
    GeminiClient::new(GeminiConfig {
        api_key: api_key.map(str::to_string),
        model: MODEL.to_string(),
        base_url: base_url.to_string(),
        timeout_secs,
    })
}

pub fn test_app(gemini: GeminiClient, mailer: Arc<dyn Mailer>) -> Router {
    build_app(Arc::new(AppState::new(gemini, mailer)))
}

pub fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
