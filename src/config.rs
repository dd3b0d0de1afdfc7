// src/config.rs
use std::{env, fmt, path::PathBuf, time::Duration};

use axum::http::HeaderValue;

use crate::error::ConfigError;
use crate::services::openai::DEFAULT_BASE_URL;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_RATE_LIMIT_MAX: u32 = 60;
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Provider credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AppMode {
    #[default]
    Development,
    Production,
}

impl AppMode {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_log_filter(self) -> &'static str {
        match self {
            Self::Development => "coach_relay=debug,tower_http=debug",
            Self::Production => "coach_relay=info,tower_http=info",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_RATE_LIMIT_MAX,
            window: DEFAULT_RATE_LIMIT_WINDOW,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub mode: AppMode,
    pub openai_api_key: Option<ApiKey>,
    pub openai_base_url: String,
    pub cors_origin: Option<HeaderValue>,
    pub public_dir: PathBuf,
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            mode: AppMode::default(),
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            cors_origin: None,
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let port = match var("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => defaults.port,
        };

        let mode = var("APP_ENV")
            .or_else(|| var("NODE_ENV"))
            .map(|raw| AppMode::parse(&raw))
            .unwrap_or_default();

        let cors_origin = var("CORS_ORIGIN")
            .map(|raw| {
                HeaderValue::from_str(raw.trim()).map_err(|_| ConfigError::Invalid {
                    name: "CORS_ORIGIN",
                    value: raw.clone(),
                })
            })
            .transpose()?;

        let max_requests = match var("RATE_LIMIT_MAX") {
            Some(raw) => parse_number("RATE_LIMIT_MAX", &raw)?,
            None => defaults.rate_limit.max_requests,
        };
        let window = match var("RATE_LIMIT_WINDOW_SECS") {
            Some(raw) => Duration::from_secs(parse_number("RATE_LIMIT_WINDOW_SECS", &raw)?),
            None => defaults.rate_limit.window,
        };

        Ok(Self {
            port,
            mode,
            openai_api_key: var("OPENAI_API_KEY").map(ApiKey::new),
            openai_base_url: var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            cors_origin,
            public_dir: var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.public_dir),
            rate_limit: RateLimitConfig {
                max_requests,
                window,
            },
        })
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.mode, AppMode::Development);
        assert!(config.openai_api_key.is_none());
        assert!(config.cors_origin.is_none());
        assert_eq!(config.openai_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(config.rate_limit, RateLimitConfig::default());
    }

    #[test]
    fn reads_every_variable() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("APP_ENV", "production"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_BASE_URL", "http://127.0.0.1:9999/v1"),
            ("CORS_ORIGIN", "https://coach.example.com"),
            ("PUBLIC_DIR", "dist"),
            ("RATE_LIMIT_MAX", "5"),
            ("RATE_LIMIT_WINDOW_SECS", "10"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.mode.is_production());
        assert_eq!(config.openai_api_key, Some(ApiKey::new("sk-test")));
        assert_eq!(config.openai_base_url, "http://127.0.0.1:9999/v1");
        assert_eq!(
            config.cors_origin,
            Some(HeaderValue::from_static("https://coach.example.com"))
        );
        assert_eq!(config.public_dir, PathBuf::from("dist"));
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window, Duration::from_secs(10));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = config_from(&[("OPENAI_API_KEY", ""), ("CORS_ORIGIN", "  ")]).unwrap();
        assert!(config.openai_api_key.is_none());
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn node_env_is_a_fallback_for_mode() {
        let config = config_from(&[("NODE_ENV", "production")]).unwrap();
        assert_eq!(config.mode, AppMode::Production);

        let config = config_from(&[("APP_ENV", "staging"), ("NODE_ENV", "production")]).unwrap();
        assert_eq!(config.mode, AppMode::Development);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-very-secret");
        assert!(!format!("{key:?}").contains("sk-very-secret"));
    }
}
