// src/state.rs
use std::sync::Arc;

use crate::config::{ApiKey, AppConfig};
use crate::services::openai::CompletionProvider;
use crate::services::rate_limiter::RateLimiter;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub completions: Arc<dyn CompletionProvider>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: AppConfig, completions: Arc<dyn CompletionProvider>) -> Self {
        let rate_limiter =
            RateLimiter::new(config.rate_limit.window, config.rate_limit.max_requests);
        Self {
            config,
            completions,
            rate_limiter,
        }
    }

    /// Swap in a limiter built elsewhere, e.g. one driven by a fake clock.
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimiter) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn api_key(&self) -> Option<&ApiKey> {
        self.config.openai_api_key.as_ref()
    }
}
