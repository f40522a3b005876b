//! Error types for the gateway client.

/// Errors surfaced by [`crate::GatewayClient`] operations.
///
/// Transport failures are split into connect/timeout/other so callers can
/// react to each without string-matching on `reqwest` messages.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to connect to gateway: {0}")]
    Connect(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from gateway: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Classify a `reqwest` transport error into the taxonomy above.
    pub(crate) fn transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout(e.to_string())
        } else if e.is_connect() {
            GatewayError::Connect(e.to_string())
        } else {
            GatewayError::Http(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = GatewayError::Status {
            status: 422,
            body: "{\"error\":\"bad model\"}".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("422"), "Should mention the status: {msg}");
        assert!(msg.contains("bad model"), "Should include the body: {msg}");
    }

    #[test]
    fn connect_error_display() {
        let err = GatewayError::Connect("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn invalid_response_display() {
        let err = GatewayError::InvalidResponse("not JSON".to_string());
        assert!(err.to_string().contains("not JSON"));
    }
}
