//! Environment configuration

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Most recent records embedded in any prompt.
pub const DEFAULT_PROMPT_RECORD_CAP: usize = 50;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Credential from the environment. A key typed in by the user is held by
    /// the gateway instead and never lands here.
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
    pub prompt_record_cap: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            prompt_record_cap: DEFAULT_PROMPT_RECORD_CAP,
        }
    }
}

impl GatewayConfig {
    /// Read `GEMINI_API_KEY` (or `API_KEY`), `GEMINI_MODEL`, `GEMINI_BASE_URL`
    /// and `GEMINI_TIMEOUT_SECS`. Call `dotenv` first to pick up a `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let usable = |name: &str| {
            lookup(name)
                .map(|k| k.trim().to_string())
                .filter(|k| is_usable_key(k))
        };
        let api_key = usable("GEMINI_API_KEY").or_else(|| usable("API_KEY"));

        if api_key.is_none() {
            warn!("Gemini API key not found. Set GEMINI_API_KEY to enable AI features.");
        }

        let request_timeout = match lookup("GEMINI_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "Ignoring invalid GEMINI_TIMEOUT_SECS");
                    defaults.request_timeout
                }
            },
            None => defaults.request_timeout,
        };

        Self {
            api_key,
            model: lookup("GEMINI_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.model),
            base_url: lookup("GEMINI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            request_timeout,
            prompt_record_cap: defaults.prompt_record_cap,
        }
    }
}

/// Empty strings and the `.env.example` placeholder do not count as keys.
pub fn is_usable_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != "your_gemini_api_key_here"
}

/// Directory for the file-backed snapshot store, from `TRACKER_DATA_DIR`.
pub fn data_dir_from_env() -> Option<PathBuf> {
    env::var("TRACKER_DATA_DIR").ok().filter(|d| !d.trim().is_empty()).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.prompt_record_cap, 50);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_placeholder_key_is_not_usable() {
        assert!(!is_usable_key(""));
        assert!(!is_usable_key("   "));
        assert!(!is_usable_key("your_gemini_api_key_here"));
        assert!(is_usable_key("AIzaSyExample"));
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_api_key_falls_back_past_unusable_primary() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "your_gemini_api_key_here"),
            ("API_KEY", " real-key "),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("real-key"));

        let config = GatewayConfig::from_lookup(lookup(&[("GEMINI_API_KEY", ""), ("API_KEY", "k2")]));
        assert_eq!(config.api_key.as_deref(), Some("k2"));

        let config = GatewayConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k1"), ("API_KEY", "k2")]));
        assert_eq!(config.api_key.as_deref(), Some("k1"));

        assert!(GatewayConfig::from_lookup(lookup(&[])).api_key.is_none());
    }

    #[test]
    fn test_timeout_rejects_zero_and_garbage() {
        let default = GatewayConfig::default().request_timeout;

        let config = GatewayConfig::from_lookup(lookup(&[("GEMINI_TIMEOUT_SECS", "0")]));
        assert_eq!(config.request_timeout, default);

        let config = GatewayConfig::from_lookup(lookup(&[("GEMINI_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.request_timeout, default);

        let config = GatewayConfig::from_lookup(lookup(&[
            ("GEMINI_TIMEOUT_SECS", "15"),
            ("GEMINI_BASE_URL", "http://localhost:8080/v1/"),
        ]));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.base_url, "http://localhost:8080/v1");
    }
}
