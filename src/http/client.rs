use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;
use std::time::{Duration, Instant};

use super::{RetryPolicy, Transport};
use crate::error::{Error, Result};
use crate::models::{ApiResponse, HttpMethod};

pub const API_KEY_HEADER: &str = "x-api-key";
const MIN_API_KEY_LEN: usize = 10;

pub struct HttpClient {
    client: Client,
    api_key: String,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(Error::Authentication("API key is required".to_string()));
        }
        if api_key.len() < MIN_API_KEY_LEN {
            return Err(Error::Authentication(
                "API key appears to be invalid (too short)".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("r7/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        params: &[(String, String)],
    ) -> RequestBuilder {
        let mut request = self
            .client
            .request(Self::to_reqwest_method(method), url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");

        if !params.is_empty() {
            request = request.query(params);
        }

        if method.accepts_body() {
            if let Some(b) = body {
                request = request.json(b);
            }
        }

        request
    }

    async fn execute_request(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<ApiResponse, reqwest::Error> {
        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let duration_ms = start.elapsed().as_millis() as u64;
        Ok(ApiResponse::new(status, text, duration_ms))
    }

    async fn wait_before_retry(&self, attempt: u32, reason: &str) {
        let delay = self.retry.backoff(attempt);
        tracing::warn!(
            "{}. Waiting {:?} before retry ({}/{})...",
            reason,
            delay,
            attempt + 1,
            self.retry.max_attempts
        );
        tokio::time::sleep(delay).await;
    }

    fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn request(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        params: &[(String, String)],
    ) -> Result<ApiResponse> {
        let attempts = self.retry.max_attempts;

        for attempt in 0..attempts {
            let last = attempt + 1 == attempts;
            let request = self.build_request(method, url, body, params);

            match self.execute_request(request).await {
                Ok(response) => {
                    tracing::debug!(
                        "Request: {} {} - Status: {} ({}ms)",
                        method,
                        url,
                        response.status,
                        response.duration_ms
                    );
                    match response.status {
                        401 => {
                            return Err(Error::Authentication(
                                "Invalid API key or insufficient permissions".to_string(),
                            ));
                        }
                        403 => {
                            return Err(Error::Authentication(
                                "Access forbidden - check API key permissions".to_string(),
                            ));
                        }
                        429 if last => return Err(Error::RateLimited { attempts }),
                        429 => self.wait_before_retry(attempt, "Rate limited").await,
                        status if status >= 500 && !last => {
                            self.wait_before_retry(attempt, &format!("Server error {}", status))
                                .await
                        }
                        status if status >= 400 => {
                            return Err(Error::Api {
                                status,
                                message: response.error_message(),
                            });
                        }
                        _ => return Ok(response),
                    }
                }
                Err(e) if !last && (e.is_timeout() || e.is_connect() || e.is_request()) => {
                    self.wait_before_retry(attempt, &format!("Request failed: {}", e))
                        .await
                }
                Err(e) => return Err(Error::Transport(e.to_string())),
            }
        }

        Err(Error::Transport("maximum retries exceeded".to_string()))
    }
}
