use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::{LexiError, Result};

use super::{EmbedderConfig, EmbeddingProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(config: &EmbedderConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Result of one provider round-trip.
#[derive(Debug)]
pub enum AttemptOutcome<T> {
    Ready(T),
    /// The provider answered but is not ready yet; worth another attempt.
    Loading,
    Failed(LexiError),
}

/// Runs `attempt` until it is ready, fails, or the attempt budget runs out.
///
/// Only `Loading` is retried. `sleep` is called between attempts and never
/// after the last one.
pub fn run_with_retry<T>(
    policy: RetryPolicy,
    mut attempt: impl FnMut(u32) -> AttemptOutcome<T>,
    mut sleep: impl FnMut(Duration),
) -> Result<T> {
    let attempts = policy.max_attempts.max(1);
    for current in 1..=attempts {
        match attempt(current) {
            AttemptOutcome::Ready(value) => return Ok(value),
            AttemptOutcome::Failed(err) => return Err(err),
            AttemptOutcome::Loading => {
                debug!(attempt = current, max_attempts = attempts, "embedding provider loading");
                if current < attempts {
                    sleep(policy.backoff);
                }
            }
        }
    }
    Err(LexiError::EmbedderLoading { attempts })
}

/// Accepts either one flat vector (single input) or a matrix with one row
/// per input, and checks both shape and dimension.
pub fn parse_embedding_response(
    value: &Value,
    expected_rows: usize,
    dimension: usize,
) -> Result<Vec<Vec<f32>>> {
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(LexiError::EmbedderResponse(message.to_string()));
    }
    let items = value
        .as_array()
        .ok_or_else(|| LexiError::EmbedderResponse("expected a JSON array".to_string()))?;

    let rows = if items.first().is_some_and(Value::is_number) {
        vec![parse_row(items)?]
    } else {
        items
            .iter()
            .map(|item| {
                item.as_array().map_or_else(
                    || {
                        Err(LexiError::EmbedderResponse(
                            "expected an array of vectors".to_string(),
                        ))
                    },
                    |row| parse_row(row),
                )
            })
            .collect::<Result<Vec<_>>>()?
    };

    if rows.len() != expected_rows {
        return Err(LexiError::EmbedderResponse(format!(
            "expected {expected_rows} vectors, got {}",
            rows.len()
        )));
    }
    if let Some(row) = rows.iter().find(|row| row.len() != dimension) {
        return Err(LexiError::EmbedderResponse(format!(
            "expected dimension {dimension}, got {}",
            row.len()
        )));
    }
    Ok(rows)
}

fn parse_row(items: &[Value]) -> Result<Vec<f32>> {
    items
        .iter()
        .map(|item| {
            item.as_f64()
                .map(|value| value as f32)
                .ok_or_else(|| LexiError::EmbedderResponse("non-numeric vector component".to_string()))
        })
        .collect()
}

/// Hosted feature-extraction endpoint (Hugging Face inference API shape).
#[derive(Clone)]
pub struct HttpEmbedder {
    endpoint: Url,
    dimension: usize,
    retry: RetryPolicy,
    http: Client,
}

impl std::fmt::Debug for HttpEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbedder")
            .field("endpoint", &self.endpoint.as_str())
            .field("dimension", &self.dimension)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl HttpEmbedder {
    pub fn new(config: &EmbedderConfig) -> Result<Self> {
        let endpoint = parse_endpoint(&config.endpoint)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                LexiError::Validation(format!("invalid embedding provider token: {e}"))
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms));
        if is_loopback_host(&endpoint) {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            endpoint,
            dimension: config.dimension,
            retry: RetryPolicy::from_config(config),
            http,
        })
    }

    fn request_once(&self, body: &Value, expected_rows: usize) -> AttemptOutcome<Vec<Vec<f32>>> {
        let response = match self.http.post(self.endpoint.clone()).json(body).send() {
            Ok(response) => response,
            Err(err) => return AttemptOutcome::Failed(err.into()),
        };
        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return AttemptOutcome::Loading;
        }
        if !status.is_success() {
            return AttemptOutcome::Failed(LexiError::EmbedderStatus {
                status: status.as_u16(),
            });
        }
        let value = match response.json::<Value>() {
            Ok(value) => value,
            Err(err) => return AttemptOutcome::Failed(err.into()),
        };
        match parse_embedding_response(&value, expected_rows, self.dimension) {
            Ok(rows) => AttemptOutcome::Ready(rows),
            Err(err) => AttemptOutcome::Failed(err),
        }
    }
}

impl EmbeddingProvider for HttpEmbedder {
    fn name(&self) -> &str {
        "http"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "inputs": texts,
            "options": { "wait_for_model": true },
        });
        run_with_retry(
            self.retry,
            |attempt| {
                debug!(attempt, batch = texts.len(), endpoint = %self.endpoint, "embedding request");
                self.request_once(&body, texts.len())
            },
            std::thread::sleep,
        )
        .inspect_err(|err| warn!(code = err.code(), error = %err, "embedding request failed"))
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|err| LexiError::Validation(format!("invalid embedding endpoint: {err}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(LexiError::Validation(format!(
                "unsupported embedding endpoint scheme: {other}"
            )));
        }
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(LexiError::Validation(
            "embedding endpoint must not include credentials".to_string(),
        ));
    }
    if url.host_str().is_none() {
        return Err(LexiError::Validation(
            "embedding endpoint host is missing".to_string(),
        ));
    }
    Ok(url)
}

fn is_loopback_host(url: &Url) -> bool {
    matches!(
        url.host_str(),
        Some("127.0.0.1" | "localhost" | "::1" | "[::1]")
    )
}
