//! Gateway diagnostics: health check, model listing and a small chat
//! completion, printed as a short report. Fails (exit 1) only when the
//! gateway is unreachable or unhealthy.

use std::process::ExitCode;

use anyhow::Context;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use litellm_client::{ChatRequest, DEFAULT_MODEL, GatewayClient, GatewayConfig, Message};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let client = GatewayClient::new(GatewayConfig::from_env())?;

    println!("Gateway Status");
    println!("==============\n");
    println!("  Endpoint:  {}", client.base_url());

    let health = client.health().await.context("health check failed")?;
    println!("  Health:    {health}");

    print!("  Models:    ");
    match client.models().await {
        Ok(models) => {
            let ids: Vec<&str> = models
                .get("data")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|m| m.get("id").and_then(Value::as_str))
                        .collect()
                })
                .unwrap_or_default();
            if ids.is_empty() {
                println!("none listed");
            } else {
                println!("{}", ids.join(", "));
            }
        }
        Err(e) => println!("error ({e})"),
    }

    print!("  Chat:      ");
    let request = ChatRequest::new(
        DEFAULT_MODEL,
        vec![
            Message::system("You are a helpful assistant."),
            Message::user("Say hello in one sentence."),
        ],
    )
    .max_tokens(50);
    match client.chat_completion(&request).await {
        Ok(data) => match data
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
        {
            Some(content) => println!("ok ({})", content.trim()),
            None => println!("unexpected response format: {data}"),
        },
        Err(e) => println!("failed ({e})"),
    }

    Ok(())
}
