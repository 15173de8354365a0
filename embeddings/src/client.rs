//! HTTP client for the OpenAI embeddings endpoint.
//!
//! Follows the OpenAI SDK's client conventions: credentials and endpoint fall
//! back to `OPENAI_API_KEY` / `OPENAI_BASE_URL`, every request is bounded by
//! the configured timeout, and transient failures are retried with
//! exponential backoff up to `max_retries` times.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};

/// Endpoint used when neither the configuration nor the environment set one.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(8);
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Options the client is built from.
#[derive(Clone, PartialEq)]
pub struct ClientOptions {
    /// API key; `None` defers to `OPENAI_API_KEY`.
    pub api_key: Option<String>,

    /// API base URL; `None` defers to `OPENAI_BASE_URL`, then [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Number of retries after the first attempt.
    pub max_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: Duration::from_secs(600),
            max_retries: 2,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Request body for `POST /embeddings`.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a str,
}

/// Response body of `POST /embeddings`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl EmbeddingResponse {
    /// Take the first vector of the response.
    pub fn into_first_embedding(self) -> Result<Embedding> {
        self.data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Embedding,
    #[serde(default)]
    pub index: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for an OpenAI-compatible embeddings API.
///
/// Cheap to share: the underlying `reqwest::Client` pools connections and
/// connects lazily, so building one performs no network I/O.
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    options: ClientOptions,
}

impl OpenAIClient {
    /// Build a client from explicit options, filling unset values from the
    /// environment.
    pub fn new(options: ClientOptions) -> Result<Self> {
        let api_key = options.api_key.clone().or_else(|| env_var(API_KEY_ENV_VAR));
        let base_url = options
            .base_url
            .clone()
            .or_else(|| env_var(BASE_URL_ENV_VAR))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let http = reqwest::Client::builder().timeout(options.timeout).build()?;

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            options,
        })
    }

    /// The options this client was built from, before environment fallbacks.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Resolved API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a credential will be sent with requests.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Create an embedding, retrying transient failures.
    pub async fn create_embedding(
        &self,
        request: &EmbeddingRequest<'_>,
    ) -> Result<EmbeddingResponse> {
        let url = format!("{}/embeddings", self.base_url);
        let mut retries = 0;

        loop {
            match self.send(&url, request).await {
                Ok(response) => return Ok(response),
                Err(failure) if failure.retryable && retries < self.options.max_retries => {
                    let delay = failure
                        .retry_after
                        .unwrap_or_else(|| backoff_delay(retries));
                    retries += 1;
                    warn!(
                        "Embedding request failed: {}; retry {retries}/{} in {delay:?}",
                        failure.error, self.options.max_retries
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn send(
        &self,
        url: &str,
        request: &EmbeddingRequest<'_>,
    ) -> std::result::Result<EmbeddingResponse, AttemptFailure> {
        debug!("POST {url} (model: {})", request.model);

        let mut builder = self.http.post(url).json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(AttemptFailure::transport)?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = retry_after(response.headers());
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    debug!("Failed to read error body for status {status}: {err}");
                    String::new()
                }
            };
            return Err(AttemptFailure {
                error: EmbeddingError::Api {
                    status: status.as_u16(),
                    message: api_error_message(&body),
                },
                retryable: is_retryable_status(status),
                retry_after,
            });
        }

        let body = response.bytes().await.map_err(AttemptFailure::transport)?;
        serde_json::from_slice(&body).map_err(|err| AttemptFailure::fatal(err.into()))
    }
}

impl fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

struct AttemptFailure {
    error: EmbeddingError,
    retryable: bool,
    retry_after: Option<Duration>,
}

impl AttemptFailure {
    fn transport(err: reqwest::Error) -> Self {
        Self {
            retryable: err.is_connect() || err.is_timeout(),
            retry_after: None,
            error: err.into(),
        }
    }

    fn fatal(error: EmbeddingError) -> Self {
        Self {
            error,
            retryable: false,
            retry_after: None,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT | StatusCode::CONFLICT | StatusCode::TOO_MANY_REQUESTS
    ) || status.is_server_error()
}

/// 0.5s, 1s, 2s, 4s, then 8s for every later retry.
fn backoff_delay(retries: u32) -> Duration {
    INITIAL_RETRY_DELAY
        .saturating_mul(2u32.saturating_pow(retries))
        .min(MAX_RETRY_DELAY)
}

/// Server-requested delay from `retry-after-ms` or `retry-after` (seconds).
/// Values above a minute are ignored in favour of the regular backoff.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header_secs = |name: &str, scale: f64| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .map(|value| value / scale)
    };

    let secs = header_secs("retry-after-ms", 1000.0).or_else(|| header_secs("retry-after", 1.0))?;
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|delay| *delay <= MAX_RETRY_AFTER)
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.to_string())
}
