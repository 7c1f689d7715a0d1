mod client;
mod session;

use anyhow::{bail, Result};
use client::BackendClient;
use pdfchat_shared::first_choice_content;
use serde_json::Value;
use session::{parse_input, Input, Session};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the conversation, so logs go to stderr
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    dotenv::dotenv().ok();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        bail!("usage: pdfchat <file.pdf>");
    };
    let server_url =
        std::env::var("PDFCHAT_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    info!("Using pdfchat server at {}", server_url);
    let client = BackendClient::new(server_url);

    let upload = client.upload_pdf(&path).await?;
    println!("PDF uploaded and text extracted successfully.\n");
    println!("{}\n", reply_text(&upload.groq_response));

    let session = Session::new(upload.pdf_text);
    if session.is_empty() {
        println!("No text could be extracted from this PDF; answers will have no context.");
    }
    println!("Ask a question about the document (/clear to end the session, /quit to exit).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_input(&line) {
            Input::Blank => continue,
            Input::Quit => break,
            Input::Clear => {
                println!("Session cleared.");
                break;
            }
            Input::Question(question) => match client.chat(&session.question(question)).await {
                Ok(response) => println!("{}\n", reply_text(&response)),
                Err(e) => {
                    error!("Chat request failed: {:#}", e);
                    println!("Failed to communicate with the chat API: {e}");
                }
            },
        }
    }

    Ok(())
}

fn reply_text(response: &Value) -> String {
    first_choice_content(response)
        .map(str::to_string)
        .unwrap_or_else(|| response.to_string())
}
