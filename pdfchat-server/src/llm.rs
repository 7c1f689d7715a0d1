use crate::config::GroqConfig;
use pdfchat_shared::ChatMessage;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("API request failed: missing credential, GROQ_API_KEY is empty")]
    Configuration,

    #[error("API request failed: transcript must contain at least one message")]
    EmptyTranscript,

    #[error("API request failed: no response within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("API request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("API request failed: upstream returned {status}: {body}")]
    Upstream { status: StatusCode, body: String },

    #[error("API request failed: response body was not valid JSON: {0}")]
    InvalidBody(#[source] reqwest::Error),
}

impl CompletionError {
    fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Network(err)
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

pub struct LlmService {
    client: reqwest::Client,
    api_key: SecretString,
    api_url: String,
    model: String,
    timeout: Duration,
}

impl LlmService {
    pub fn new(config: GroqConfig) -> Result<Self, reqwest::Error> {
        info!("Initializing LLM service with model: {}", config.model);
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key,
            api_url: config.api_url,
            model: config.model,
            timeout: config.timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends `transcript` to the completion endpoint and returns the response body untouched.
    pub async fn complete(&self, transcript: &[ChatMessage]) -> Result<Value, CompletionError> {
        let api_key = self.api_key.expose_secret();
        if api_key.trim().is_empty() {
            error!("Refusing to call completion API without a credential");
            return Err(CompletionError::Configuration);
        }
        if transcript.is_empty() {
            return Err(CompletionError::EmptyTranscript);
        }

        let request = CompletionRequest {
            model: &self.model,
            messages: transcript,
        };
        debug!(
            url = %self.api_url,
            model = %self.model,
            messages = transcript.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionError::from_transport(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            error!(%status, %body, "Completion API returned an error");
            return Err(CompletionError::Upstream { status, body });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_timeout() {
                CompletionError::Timeout(self.timeout)
            } else {
                CompletionError::InvalidBody(e)
            }
        })
    }
}

/// Transcript asking the model to summarize `pdf_text`.
pub fn summary_transcript(pdf_text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Here is some text from a PDF: {pdf_text}. Please summarize the key points."
        )),
    ]
}
