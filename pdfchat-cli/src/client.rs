use anyhow::{bail, Context, Result};
use pdfchat_shared::{ChatMessage, ErrorResponse, UploadResponse};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub async fn upload_pdf(&self, path: &Path) -> Result<UploadResponse> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        debug!("Uploading {} ({} bytes)", file_name, bytes.len());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self
            .http
            .post(format!("{}/upload-pdf/", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("failed to reach pdfchat server")?;
        decode(response).await
    }

    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<Value> {
        debug!("Sending {} messages", messages.len());
        let response = self
            .http
            .post(format!("{}/chat-completion/", self.base_url))
            .json(messages)
            .send()
            .await
            .context("failed to reach pdfchat server")?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .context("server sent an unreadable response");
    }

    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.detail)
        .unwrap_or(text);
    bail!("server returned {status}: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;

    async fn start_server(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    #[tokio::test]
    async fn chat_posts_messages_and_returns_body() {
        let app = Router::new().route(
            "/chat-completion/",
            post(|Json(messages): Json<Vec<ChatMessage>>| async move {
                Json(json!({"echo": messages.len()}))
            }),
        );
        let addr = start_server(app).await;
        let client = BackendClient::new(format!("http://{addr}/"));

        let body = client
            .chat(&[ChatMessage::system("s"), ChatMessage::user("u")])
            .await
            .unwrap();
        assert_eq!(body, json!({"echo": 2}));
    }

    #[tokio::test]
    async fn error_detail_is_surfaced() {
        let app = Router::new().route(
            "/chat-completion/",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"detail": "API request failed: upstream returned 503"})),
                )
            }),
        );
        let addr = start_server(app).await;
        let client = BackendClient::new(format!("http://{addr}"));

        let err = client.chat(&[ChatMessage::user("Hi")]).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("API request failed: upstream returned 503"));
    }

    #[tokio::test]
    async fn missing_file_is_reported_before_upload() {
        let client = BackendClient::new("http://127.0.0.1:9");
        let err = client
            .upload_pdf(Path::new("/nonexistent/pdfchat-test.pdf"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
