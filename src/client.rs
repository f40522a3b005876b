//! HTTP client for an OpenAI-compatible LLM gateway.
//!
//! Wraps the gateway's `/chat/completions`, `/completions`, `/models` and
//! `/health` endpoints. Requests are typed; responses are returned as raw
//! `serde_json::Value` so callers see exactly what the gateway sent.

use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::stream::ChunkStream;

/// Default model identifier, matching the gateway's own examples.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Role of a chat message. Unknown roles are forwarded verbatim; the gateway
/// is the validator, not this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::Other(role) => role,
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            other => Role::Other(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::from(s.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::from(s.as_str()))
    }
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: impl Into<Role>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Request payload for `/chat/completions`.
///
/// `max_tokens` is omitted from the wire payload entirely when unset (never
/// serialized as null). Extra parameters are flattened into the top level;
/// collisions with the named fields are the caller's responsibility.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Set by the client for the streaming variant; absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            stream: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Add an arbitrary passthrough parameter (e.g. `top_p`, `stop`).
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn streaming(mut self) -> Self {
        self.stream = Some(true);
        self
    }
}

/// Request payload for the legacy `/completions` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Client for an OpenAI-compatible gateway.
///
/// Holds one reusable `reqwest::Client` (default headers and connection
/// pooling only; no request state). Cheap to clone is not a goal; create one
/// per gateway. No retries, no backoff.
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
}

impl GatewayClient {
    /// Create a client with reqwest's default timeouts.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Create a client with a fixed per-request timeout.
    pub fn with_timeout(config: GatewayConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, config })
    }

    /// Normalized base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Construct the full URL for an endpoint path.
    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// Add the `Authorization` header if an API key is configured.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key.expose_secret())),
            None => request,
        }
    }

    /// Send a chat completion request and return the parsed response body.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<Value, GatewayError> {
        self.post_json("chat/completions", request).await
    }

    /// Send a streaming chat completion request.
    ///
    /// Returns a lazy, single-pass [`ChunkStream`] of decoded SSE chunks;
    /// consuming it drives the network read.
    pub async fn chat_completion_stream(
        &self,
        request: &ChatRequest,
    ) -> Result<ChunkStream, GatewayError> {
        let request = request.clone().streaming();
        let url = self.endpoint("chat/completions");
        tracing::debug!(%url, model = %request.model, "starting streaming chat completion");

        let response = self
            .authorize(self.http.post(&url).json(&request))
            .send()
            .await
            .map_err(GatewayError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(ChunkStream::new(response))
    }

    /// Send a legacy text completion request.
    pub async fn completion(&self, request: &CompletionRequest) -> Result<Value, GatewayError> {
        self.post_json("completions", request).await
    }

    /// List available models.
    pub async fn models(&self) -> Result<Value, GatewayError> {
        self.get_json("models").await
    }

    /// Check gateway health.
    pub async fn health(&self) -> Result<Value, GatewayError> {
        self.get_json("health").await
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<Value, GatewayError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "sending gateway request");
        let request = self.authorize(self.http.post(&url).json(body));
        self.execute(request).await
    }

    async fn get_json(&self, path: &str) -> Result<Value, GatewayError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "sending gateway request");
        let request = self.authorize(self.http.get(&url));
        self.execute(request).await
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<Value, GatewayError> {
        let response = request.send().await.map_err(GatewayError::transport)?;

        let status = response.status();
        let body = response.text().await.map_err(GatewayError::transport)?;
        tracing::debug!(status = status.as_u16(), "gateway response");

        if !status.is_success() {
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            GatewayError::InvalidResponse(format!(
                "JSON parse error: {}. Raw: {}",
                e,
                truncate(&body, 200)
            ))
        })
    }
}

/// Truncate on a char boundary for error messages.
fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn client_with_base_url(base_url: &str) -> GatewayClient {
        let config = GatewayConfig::resolve(Some(base_url), Some("test-key"), |_| None);
        GatewayClient::new(config).unwrap()
    }

    #[test]
    fn endpoint_trailing_slash() {
        let a = client_with_base_url("http://localhost:4000/");
        let b = client_with_base_url("http://localhost:4000");
        assert_eq!(a.endpoint("chat/completions"), b.endpoint("chat/completions"));
        assert_eq!(
            a.endpoint("chat/completions"),
            "http://localhost:4000/chat/completions"
        );
    }

    #[test]
    fn endpoint_strips_leading_slash_from_path() {
        let client = client_with_base_url("http://localhost:4000");
        assert_eq!(client.endpoint("/health"), "http://localhost:4000/health");
    }

    #[test]
    fn endpoint_base_url_with_v1_suffix() {
        // A base URL already carrying /v1 should not change the request URL.
        let client = client_with_base_url("http://localhost:4000/v1");
        assert_eq!(client.endpoint("models"), "http://localhost:4000/models");
    }

    #[test]
    fn chat_payload_omits_unset_max_tokens() {
        let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("hi")]);
        let payload = serde_json::to_value(&request).unwrap();
        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["temperature"], json!(DEFAULT_TEMPERATURE));
        assert_eq!(payload["messages"][0]["role"], "user");
        assert!(payload.get("max_tokens").is_none());
        assert!(payload.get("stream").is_none());
    }

    #[test]
    fn chat_payload_includes_max_tokens_when_set() {
        let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("hi")]).max_tokens(100);
        let payload = serde_json::to_value(&request).unwrap();
        assert_eq!(payload["max_tokens"], 100);
    }

    #[test]
    fn chat_payload_flattens_extra_params() {
        let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("hi")])
            .param("top_p", 0.9)
            .param("stop", json!(["\n"]));
        let payload = serde_json::to_value(&request).unwrap();
        assert_eq!(payload["top_p"], 0.9);
        assert_eq!(payload["stop"], json!(["\n"]));
    }

    #[test]
    fn streaming_payload_sets_stream_flag() {
        let request = ChatRequest::new("gpt-4o-mini", vec![Message::user("hi")]).streaming();
        let payload = serde_json::to_value(&request).unwrap();
        assert_eq!(payload["stream"], true);
    }

    #[test]
    fn completion_payload_uses_prompt() {
        let request = CompletionRequest::new("gpt-4o-mini", "Once upon a time").max_tokens(10);
        let payload = serde_json::to_value(&request).unwrap();
        assert_eq!(payload["prompt"], "Once upon a time");
        assert_eq!(payload["max_tokens"], 10);
        assert!(payload.get("messages").is_none());
    }

    #[test]
    fn unknown_role_round_trips_verbatim() {
        let message = Message::new("critic", "too verbose");
        let payload = serde_json::to_value(&message).unwrap();
        assert_eq!(payload["role"], "critic");

        let parsed: Message = serde_json::from_value(payload).unwrap();
        assert_eq!(parsed.role, Role::Other("critic".to_string()));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let s = "héllo wörld";
        let t = truncate(s, 3);
        assert!(t.len() <= 3);
        assert!(s.starts_with(t));
        assert_eq!(truncate("short", 200), "short");
    }
}
