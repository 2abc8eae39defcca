mod client;

pub use client::{API_KEY_HEADER, HttpClient};

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::models::{ApiResponse, HttpMethod};

/// Everything above the wire talks to the API through this seam.
///
/// Implementations own retry and status classification: 401/403 surface as
/// [`crate::Error::Authentication`], an exhausted 429 as
/// [`crate::Error::RateLimited`], and other failures as
/// [`crate::Error::Api`]. Any 2xx comes back untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        params: &[(String, String)],
    ) -> Result<ApiResponse>;

    async fn get(&self, url: &str) -> Result<ApiResponse> {
        self.request(HttpMethod::Get, url, None, &[]).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Exponential: `base_delay * 2^attempt`, attempt counted from zero.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(1))
    }
}
