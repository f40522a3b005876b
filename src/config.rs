//! Gateway connection configuration.
//!
//! Resolution is a pure function over an environment lookup so tests can
//! supply a fake environment instead of mutating process state.

use secrecy::SecretString;

/// Environment variable overriding the gateway base URL.
pub const BASE_URL_ENV: &str = "LITELLM_BASE_URL";
/// Environment variable holding a client-scoped API key.
pub const API_KEY_ENV: &str = "LITELLM_API_KEY";
/// Environment variable holding the server master key, used as an auth fallback.
pub const MASTER_KEY_ENV: &str = "LITELLM_MASTER_KEY";

/// Default gateway address when nothing is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000";

/// Connection configuration for [`crate::GatewayClient`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Normalized base URL (no trailing slash, no trailing `/v1`).
    pub base_url: String,
    /// Bearer token for the `Authorization` header; requests go out
    /// unauthenticated when absent.
    pub api_key: Option<SecretString>,
}

impl GatewayConfig {
    /// Resolve configuration from explicit arguments and an environment lookup.
    ///
    /// Priority rules (matching the gateway's conventions):
    /// - base URL: `LITELLM_BASE_URL` > explicit argument > default
    /// - API key: explicit argument > `LITELLM_API_KEY` > `LITELLM_MASTER_KEY`
    ///
    /// Empty environment values count as unset.
    pub fn resolve<F>(base_url: Option<&str>, api_key: Option<&str>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let base = env(BASE_URL_ENV)
            .or_else(|| base_url.map(str::to_owned))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let api_key = api_key
            .map(str::to_owned)
            .or_else(|| env(API_KEY_ENV))
            .or_else(|| env(MASTER_KEY_ENV))
            .map(SecretString::from);

        Self {
            base_url: normalize_base_url(&base),
            api_key,
        }
    }

    /// Resolve from the process environment with no explicit overrides.
    pub fn from_env() -> Self {
        Self::resolve(None, None, |key| std::env::var(key).ok())
    }
}

/// Strip a trailing slash and a trailing `/v1` segment so both spellings of
/// the gateway address produce identical request URLs.
pub(crate) fn normalize_base_url(raw: &str) -> String {
    let base = raw.trim_end_matches('/');
    let base = base.strip_suffix("/v1").unwrap_or(base);
    base.to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn fake_env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_configured() {
        let config = GatewayConfig::resolve(None, None, |_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn base_url_env_overrides_argument() {
        let lookup = fake_env(&[(BASE_URL_ENV, "http://gateway:9000")]);
        let config = GatewayConfig::resolve(Some("http://localhost:4000"), None, lookup);
        assert_eq!(config.base_url, "http://gateway:9000");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let a = GatewayConfig::resolve(Some("http://localhost:4000/"), None, |_| None);
        let b = GatewayConfig::resolve(Some("http://localhost:4000"), None, |_| None);
        assert_eq!(a.base_url, b.base_url);
    }

    #[test]
    fn v1_suffix_is_normalized() {
        let config = GatewayConfig::resolve(Some("http://localhost:4000/v1/"), None, |_| None);
        assert_eq!(config.base_url, "http://localhost:4000");
    }

    #[test]
    fn explicit_key_beats_env() {
        let lookup = fake_env(&[(API_KEY_ENV, "env-key"), (MASTER_KEY_ENV, "master-key")]);
        let config = GatewayConfig::resolve(None, Some("arg-key"), lookup);
        assert_eq!(config.api_key.unwrap().expose_secret(), "arg-key");
    }

    #[test]
    fn api_key_env_beats_master_key() {
        let lookup = fake_env(&[(API_KEY_ENV, "env-key"), (MASTER_KEY_ENV, "master-key")]);
        let config = GatewayConfig::resolve(None, None, lookup);
        assert_eq!(config.api_key.unwrap().expose_secret(), "env-key");
    }

    #[test]
    fn master_key_used_as_fallback() {
        let lookup = fake_env(&[(MASTER_KEY_ENV, "master-key")]);
        let config = GatewayConfig::resolve(None, None, lookup);
        assert_eq!(config.api_key.unwrap().expose_secret(), "master-key");
    }

    #[test]
    fn empty_env_value_counts_as_unset() {
        let lookup = fake_env(&[(API_KEY_ENV, ""), (MASTER_KEY_ENV, "master-key")]);
        let config = GatewayConfig::resolve(None, None, lookup);
        assert_eq!(config.api_key.unwrap().expose_secret(), "master-key");
    }
}
