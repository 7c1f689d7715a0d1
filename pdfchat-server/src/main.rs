mod config;
mod error;
mod extract;
mod llm;
mod routes;

use config::Config;
use llm::LlmService;
use routes::Limits;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => {
            info!("GROQ_API_KEY loaded successfully");
            config
        }
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    let llm_service = Arc::new(LlmService::new(config.groq.clone())?);
    info!(
        "Using model {} at {} (timeout {:?})",
        llm_service.model(),
        config.groq.api_url,
        config.groq.timeout
    );

    let app = routes::router(
        llm_service,
        Limits {
            max_upload_bytes: config.max_upload_bytes,
            max_prompt_chars: config.max_prompt_chars,
        },
    );

    info!("Server listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
