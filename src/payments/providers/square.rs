//! Square REST transport
//!
//! Sends payment bodies to Square's versioned API over reqwest. Square's own
//! `errors` payloads are reshaped into a single `error` mapping and handed
//! back as data; only requests that never produced a usable answer become
//! `Err`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::config::SquareConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::payments::traits::PaymentTransport;

/// reqwest-backed [`PaymentTransport`] for the Square API
#[derive(Debug, Clone)]
pub struct SquareTransport {
    client: Client,
    api_version: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl SquareTransport {
    pub fn new(config: &SquareConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                GatewayError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_version: config.api_version.clone(),
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_backoff.saturating_mul(2_u32.saturating_pow(attempt))
    }
}

#[async_trait]
impl PaymentTransport for SquareTransport {
    async fn post(&self, url: &str, bearer_token: &str, body: &Value) -> GatewayResult<Value> {
        debug!("POST {} - Square-Version: {}", url, self.api_version);

        let request = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", bearer_token))
            .header("Square-Version", &self.api_version)
            .header("Content-Type", "application/json")
            .json(body);

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            let Some(req) = request.try_clone() else {
                return Err(GatewayError::transport("Failed to clone request", None));
            };

            match req.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!("Response status: {}", status);

                    let retry_status =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    if retry_status && attempt < self.max_retries {
                        let backoff = self.backoff(attempt);
                        warn!(
                            "Square returned {}, retrying after {:?} (attempt {})",
                            status,
                            backoff,
                            attempt + 1
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    let text = response.text().await.map_err(|e| {
                        GatewayError::transport(
                            format!("Failed to read response body: {}", e),
                            None,
                        )
                    })?;

                    return interpret_response(status, &text);
                }
                Err(e) => {
                    let err = GatewayError::transport(
                        format!("Failed to send request to {}: {}", url, e),
                        None,
                    );
                    if attempt < self.max_retries {
                        let backoff = self.backoff(attempt);
                        warn!(
                            "Request error, retrying after {:?} (attempt {}): {}",
                            backoff,
                            attempt + 1,
                            err
                        );
                        last_error = Some(err);
                        tokio::time::sleep(backoff).await;
                        continue;
                    }
                    error!("Square request failed: {}", err);
                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            GatewayError::transport(
                format!("Request failed after {} retries", self.max_retries),
                None,
            )
        }))
    }
}

/// Turn a Square HTTP response into the mapping the builder understands
pub fn interpret_response(status: StatusCode, text: &str) -> GatewayResult<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if has_square_errors(&value) => {
            let mapped = square_error_mapping(status, &value);
            error!("Square API error: {}", mapped["error"]["message"]);
            Ok(mapped)
        }
        Ok(value) if status.is_success() => Ok(value),
        Err(e) if status.is_success() => Err(GatewayError::transport(
            format!("Failed to parse response: {}", e),
            Some(status.as_u16()),
        )),
        _ => {
            error!("Square API error: HTTP {}: {}", status, text);
            Err(GatewayError::transport(
                format!("HTTP {}: {}", status, truncate(text, 200)),
                Some(status.as_u16()),
            ))
        }
    }
}

fn has_square_errors(value: &Value) -> bool {
    value
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| !errors.is_empty())
        .unwrap_or(false)
}

/// Square's `{"errors": [{category, code, detail}]}` as `{"error": {...}}`
fn square_error_mapping(status: StatusCode, value: &Value) -> Value {
    let errors = value.get("errors").cloned().unwrap_or(Value::Null);
    let first = errors.get(0);
    let field = |name: &str| {
        first
            .and_then(|error| error.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let code = field("code");
    let message = field("detail")
        .or_else(|| code.clone())
        .unwrap_or_else(|| "Square API error".to_string());

    json!({
        "error": {
            "message": message,
            "code": code,
            "category": field("category"),
            "status": status.as_u16(),
            "retryable": status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
            "errors": errors,
        }
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
