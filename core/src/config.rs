//! Connection settings for the todo backend, from defaults, serde or the
//! environment.

use std::env;

use serde::Deserialize;

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "TODO_API_URL";
/// Environment variable holding an opaque `authorization` header value.
pub const ENV_CREDENTIAL: &str = "TODO_API_CREDENTIAL";
/// Environment variable holding a request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "TODO_API_TIMEOUT_SECS";

/// Connection settings for the todo backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. `http://localhost:3000`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Forwarded verbatim as the `authorization` header when set.
    #[serde(default)]
    pub credential: Option<String>,
    /// Request timeout. `None` keeps the transport's default behavior.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_user_agent() -> String {
    concat!("todo-core/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            credential: None,
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `TODO_API_URL`, `TODO_API_CREDENTIAL` and
    /// `TODO_API_TIMEOUT_SECS`. Blank values are ignored; an unparsable
    /// timeout is logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();
        if let Some(url) = var(ENV_BASE_URL) {
            config.base_url = url;
        }
        config.credential = var(ENV_CREDENTIAL);
        if let Some(raw) = var(ENV_TIMEOUT_SECS) {
            match raw.trim().parse() {
                Ok(secs) => config.timeout_secs = Some(secs),
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid {ENV_TIMEOUT_SECS}"),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_point_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert!(config.credential.is_none());
        assert!(config.timeout_secs.is_none());
        assert!(config.user_agent.starts_with("todo-core/"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "http://todos.internal:8080"),
            (ENV_CREDENTIAL, "Bearer abc"),
            (ENV_TIMEOUT_SECS, "5"),
        ]));
        assert_eq!(config.base_url, "http://todos.internal:8080");
        assert_eq!(config.credential.as_deref(), Some("Bearer abc"));
        assert_eq!(config.timeout_secs, Some(5));
    }

    #[test]
    fn blank_and_invalid_values_are_ignored() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_BASE_URL, "  "),
            (ENV_CREDENTIAL, ""),
            (ENV_TIMEOUT_SECS, "soon"),
        ]));
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"base_url":"http://example.test"}"#).unwrap();
        assert_eq!(config.base_url, "http://example.test");
        assert!(config.timeout_secs.is_none());
        assert!(config.user_agent.starts_with("todo-core/"));
    }
}
