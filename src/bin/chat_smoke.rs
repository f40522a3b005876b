//! One-shot smoke test: POST a chat completion to the gateway and print the
//! result. Exits non-zero on connection failure, timeout or HTTP error.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use litellm_client::{ChatRequest, GatewayClient, GatewayConfig, GatewayError, Message};

/// Fixed timeout for the one-shot request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(
    name = "chat-smoke",
    about = "Send one chat completion to the local LLM gateway"
)]
struct Args {
    /// Model identifier.
    #[arg(default_value = "gpt-4o-mini")]
    model: String,

    /// User message to send.
    #[arg(default_value = "Hello! Reply in one sentence.")]
    message: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = GatewayConfig::from_env();

    let client = match GatewayClient::with_timeout(config, REQUEST_TIMEOUT) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("POST {}/chat/completions", client.base_url());
    println!("Model: {}", args.model);
    println!("Message: {}\n", args.message);

    let request = ChatRequest::new(
        &args.model,
        vec![
            Message::system("You are a helpful assistant."),
            Message::user(&args.message),
        ],
    )
    .max_tokens(100);

    let data = match client.chat_completion(&request).await {
        Ok(data) => data,
        Err(GatewayError::Connect(reason)) => {
            eprintln!("Connection failed: {reason}");
            eprintln!("Is the gateway running? Start it with:");
            eprintln!("  litellm --config litellm_config.yaml --port 4000");
            return ExitCode::FAILURE;
        }
        Err(GatewayError::Timeout(_)) => {
            eprintln!("Request timed out after {}s", REQUEST_TIMEOUT.as_secs());
            return ExitCode::FAILURE;
        }
        Err(GatewayError::Status { status, body }) => {
            eprintln!("HTTP error {status}");
            eprintln!("Response: {body}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!("Response:");
    match serde_json::to_string_pretty(&data) {
        Ok(pretty) => println!("{pretty}"),
        Err(_) => println!("{data}"),
    }

    if let Some(content) = data
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        println!("\nAssistant: {content}");
    }

    if let Some(usage) = data.get("usage").filter(|u| u.is_object()) {
        let count = |key: &str| usage.get(key).and_then(Value::as_u64).unwrap_or(0);
        println!(
            "\nTokens: {} (prompt: {}, completion: {})",
            count("total_tokens"),
            count("prompt_tokens"),
            count("completion_tokens")
        );
    }

    ExitCode::SUCCESS
}
