//! Fixed-window request limiter keyed by client address

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Entries are pruned once the map holds this many keys
const PRUNE_THRESHOLD: usize = 10_000;

/// Rate limiter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug)]
struct WindowEntry {
    requests: u32,
    window_started: Instant,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Arc<Mutex<HashMap<String, WindowEntry>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request from `key`; false once the window's budget is spent
    pub async fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now()).await
    }

    pub(crate) async fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().await;

        if entries.len() >= PRUNE_THRESHOLD {
            let window = self.config.window;
            entries.retain(|_, entry| now.duration_since(entry.window_started) < window);
            debug!(remaining = entries.len(), "Pruned expired rate limit windows");
        }

        let entry = entries.entry(key.to_string()).or_insert(WindowEntry {
            requests: 0,
            window_started: now,
        });

        // Window expired, start a new one
        if now.duration_since(entry.window_started) >= self.config.window {
            entry.requests = 0;
            entry.window_started = now;
        }

        if entry.requests >= self.config.max_requests {
            if entry.requests == self.config.max_requests {
                info!(
                    "Rate limit reached for {} ({} requests per {}s)",
                    key,
                    self.config.max_requests,
                    self.config.window.as_secs()
                );
                entry.requests += 1;
            }
            return false;
        }

        entry.requests += 1;
        true
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}
