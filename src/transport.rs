//! Resilient HTTP transport.
//!
//! One logical call = up to `1 + max_retries` attempts, each bounded by a
//! hard timeout, with exponential backoff between transient failures. The
//! outcome is classified for the caller: success (JSON or binary payload),
//! transient network failure, or fatal protocol failure. Nothing is cached
//! at this layer.

use crate::error::{AnalyticsError, AnalyticsResult};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// One prepared HTTP request.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    pub method: reqwest::Method,
    pub url: String,
    /// Extra headers as (name, value) pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body for POST-style requests.
    pub body: Option<serde_json::Value>,
}

impl RequestSpec {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: reqwest::Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: reqwest::Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }
}

/// Completed-exchange response, before classification.
#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl HttpResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_binary(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| {
                ct.starts_with("application/pdf") || ct.starts_with("application/octet-stream")
            })
    }
}

/// Classified successful payload.
#[derive(Clone, Debug)]
pub enum Payload {
    Json(serde_json::Value),
    /// Opaque bytes for binary content types (report artifacts).
    Binary(Bytes),
}

impl Payload {
    /// Deserialize a JSON payload into a typed value.
    pub fn decode<T: serde::de::DeserializeOwned>(self) -> AnalyticsResult<T> {
        match self {
            Payload::Json(value) => serde_json::from_value(value).map_err(|e| {
                AnalyticsError::Protocol {
                    status: 200,
                    message: format!("unexpected response shape: {e}"),
                }
            }),
            Payload::Binary(_) => Err(AnalyticsError::Protocol {
                status: 200,
                message: "expected JSON response, got binary payload".to_string(),
            }),
        }
    }
}

/// Low-level dispatch seam. Production uses reqwest; tests count attempts
/// through mock implementations. An `Err` here is always a transient
/// network-level failure; completed exchanges come back as `HttpResponse`
/// whatever their status.
#[async_trait]
pub trait HttpDispatch: Send + Sync {
    async fn dispatch(&self, spec: &RequestSpec) -> Result<HttpResponse, String>;
}

/// Synchronous "is the device online" probe, checked before any attempt.
pub trait NetworkProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Default probe for environments without a connectivity signal.
pub struct AlwaysOnline;

impl NetworkProbe for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// reqwest-backed dispatcher.
pub struct ReqwestDispatch {
    client: reqwest::Client,
}

impl ReqwestDispatch {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestDispatch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpDispatch for ReqwestDispatch {
    async fn dispatch(&self, spec: &RequestSpec) -> Result<HttpResponse, String> {
        let mut request = self.client.request(spec.method.clone(), &spec.url);
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| e.to_string())?;

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// Upstream error body shape (`{"message": "..."}`).
#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Retry/timeout/classification wrapper around an [`HttpDispatch`].
pub struct Transport {
    dispatch: Arc<dyn HttpDispatch>,
    probe: Arc<dyn NetworkProbe>,
    retry_base_delay: Duration,
}

impl Transport {
    pub fn new(dispatch: Arc<dyn HttpDispatch>, probe: Arc<dyn NetworkProbe>) -> Self {
        Self {
            dispatch,
            probe,
            retry_base_delay: Duration::from_millis(500),
        }
    }

    /// Override the first backoff delay (doubles per attempt).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Issue one logical call with bounded retries and a hard per-attempt
    /// timeout.
    ///
    /// Offline fails immediately without consuming an attempt. Transient
    /// network failures (connect, DNS, timeout) are retried up to
    /// `max_retries` times with `base × 2^attempt` backoff; a completed
    /// exchange with a non-2xx status is a protocol failure and is never
    /// retried.
    pub async fn send(
        &self,
        spec: &RequestSpec,
        max_retries: u32,
        timeout: Duration,
    ) -> AnalyticsResult<Payload> {
        if !self.probe.is_online() {
            return Err(AnalyticsError::NetworkUnavailable);
        }

        let mut attempt: u32 = 0;
        loop {
            let outcome = tokio::time::timeout(timeout, self.dispatch.dispatch(spec)).await;
            let failure = match outcome {
                Err(_) => format!("timed out after {timeout:?}"),
                Ok(Err(reason)) => reason,
                Ok(Ok(response)) => return classify(response),
            };

            if attempt >= max_retries {
                return Err(AnalyticsError::Transient {
                    attempts: attempt + 1,
                    message: failure,
                });
            }

            let delay = self.retry_base_delay * 2u32.saturating_pow(attempt);
            log::debug!(
                "transient failure for {} ({failure}), retrying in {delay:?}",
                spec.url
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn classify(response: HttpResponse) -> AnalyticsResult<Payload> {
    if !response.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(&response.body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| format!("request failed with status {}", response.status));
        return Err(AnalyticsError::Protocol {
            status: response.status,
            message,
        });
    }

    if response.is_binary() {
        return Ok(Payload::Binary(response.body));
    }

    let value = serde_json::from_slice(&response.body).map_err(|e| AnalyticsError::Protocol {
        status: response.status,
        message: format!("malformed response body: {e}"),
    })?;
    Ok(Payload::Json(value))
}
