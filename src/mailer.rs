//! Delivery of answers by email.
//!
//! [`SmtpMailer`] opens one SMTP session per message (implicit TLS unless
//! `SMTP_TLS` turns it off) and drops
//! it when the send finishes, whichever way it finishes. Handlers talk to the
//! [`Mailer`] trait so the transport can be swapped out.

use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SmtpConfig;

pub const SUBJECT: &str = "Your AI Study Buddy Response";

// Reply codes an SMTP server uses to reject a login.
const AUTH_FAILURE_CODES: [&str; 3] = ["530", "534", "535"];

#[derive(Debug, Error)]
pub enum MailError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("invalid email address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP authentication failed: {0}")]
    Authentication(String),

    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|source| MailError::InvalidAddress {
            address: address.to_string(),
            source,
        })
}

/// A question and its answer, addressed to the person who asked.
#[derive(Debug, Clone)]
pub struct AnswerEmail {
    to: Mailbox,
    question: String,
    answer: String,
}

impl AnswerEmail {
    pub fn new(
        to: &str,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Result<Self, MailError> {
        Ok(Self {
            to: parse_mailbox(to)?,
            question: question.into(),
            answer: answer.into(),
        })
    }

    pub fn to(&self) -> &Mailbox {
        &self.to
    }

    pub fn subject(&self) -> &'static str {
        SUBJECT
    }

    pub fn body(&self) -> String {
        format!(
            "Your Question:\n{}\n\nGemini Response:\n{}",
            self.question, self.answer
        )
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &AnswerEmail) -> Result<(), MailError>;
}

pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn compose(&self, from: Mailbox, email: &AnswerEmail) -> Result<Message, MailError> {
        Ok(Message::builder()
            .from(from)
            .to(email.to.clone())
            .subject(email.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body())?)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &AnswerEmail) -> Result<(), MailError> {
        let sender = self
            .config
            .sender
            .as_deref()
            .ok_or(MailError::NotConfigured("SMTP_SENDER"))?;
        let password = self
            .config
            .password
            .as_deref()
            .ok_or(MailError::NotConfigured("SMTP_PASSWORD"))?;

        let message = self.compose(parse_mailbox(sender)?, email)?;

        let builder = if self.config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.host)
        };
        let transport = builder
            .port(self.config.port)
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)))
            .build();

        debug!(host = %self.config.host, port = self.config.port, "opening SMTP session");
        match transport.send(message).await {
            Ok(_) => {
                info!(to = %email.to, "answer email delivered");
                Ok(())
            }
            Err(e) => {
                warn!(host = %self.config.host, error = %e, "SMTP send failed");
                Err(classify(&e))
            }
        }
    }
}

fn classify(err: &lettre::transport::smtp::Error) -> MailError {
    let is_auth = err
        .status()
        .map(|code| AUTH_FAILURE_CODES.contains(&code.to_string().as_str()))
        .unwrap_or(false);
    if is_auth {
        MailError::Authentication(err.to_string())
    } else {
        MailError::Transport(err.to_string())
    }
}
