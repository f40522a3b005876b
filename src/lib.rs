//! Client library for an OpenAI-compatible LLM gateway.
//!
//! Talks to a locally-running gateway proxy (e.g. LiteLLM) over its
//! OpenAI-compatible REST API: chat completions (blocking and streaming),
//! legacy text completions, model listing and health checks.
//!
//! ```no_run
//! use litellm_client::{ChatRequest, GatewayClient, GatewayConfig, Message};
//!
//! # async fn run() -> Result<(), litellm_client::GatewayError> {
//! let client = GatewayClient::new(GatewayConfig::from_env())?;
//! let request = ChatRequest::new(
//!     "openai/gpt-4o-mini",
//!     vec![Message::user("Say hello in one sentence.")],
//! );
//! let response = client.chat_completion(&request).await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod stream;

pub use client::{
    ChatRequest, CompletionRequest, DEFAULT_MODEL, DEFAULT_TEMPERATURE, GatewayClient, Message,
    Role,
};
pub use config::{DEFAULT_BASE_URL, GatewayConfig};
pub use error::GatewayError;
pub use stream::{ChunkStream, StreamEnd};
