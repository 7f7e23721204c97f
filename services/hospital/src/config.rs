//! HTTP server configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::time::Duration;

use crate::rate_limiter::RateLimitConfig;

/// Origins a browser dashboard is served from during local work
const LOCAL_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://localhost:5000"];

/// Server settings read from `HOSPITAL_*` environment variables
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// Extra origin allowed by CORS
    pub frontend_url: Option<String>,
    /// Overrides the per-environment request cap
    pub rate_limit_max_requests: Option<u32>,
    pub rate_limit_window_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            environment: "development".to_string(),
            frontend_url: None,
            rate_limit_max_requests: None,
            rate_limit_window_secs: 15 * 60,
        }
    }
}

impl ServerConfig {
    /// Load from the environment, falling back to `0.0.0.0:5000` in
    /// development
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 5000_i64)?
            .set_default("environment", "development")?
            .set_default("rate_limit_window_secs", 900_i64)?
            .add_source(Environment::with_prefix("HOSPITAL").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// 1000 requests per window in development, 100 elsewhere
    pub fn rate_limit(&self) -> RateLimitConfig {
        let default_max = if self.is_development() { 1000 } else { 100 };
        RateLimitConfig {
            max_requests: self.rate_limit_max_requests.unwrap_or(default_max),
            window: Duration::from_secs(self.rate_limit_window_secs),
        }
    }

    /// Local dashboard origins plus the configured frontend, if any
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = LOCAL_ORIGINS.iter().map(|o| o.to_string()).collect();
        if let Some(url) = self.frontend_url.as_deref().map(|u| u.trim().trim_end_matches('/')) {
            if !url.is_empty() && !origins.iter().any(|o| o == url) {
                origins.push(url.to_string());
            }
        }
        origins
    }
}
