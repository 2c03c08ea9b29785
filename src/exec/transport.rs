//! Outbound transports: HTTP calls and AI completions.
//!
//! Node execution never talks to the network directly; it goes through the
//! [`HttpTransport`] and [`AiBackend`] traits so tests can script responses
//! and deployments can swap implementations. A [`RetryPolicy`] wraps every
//! transport call with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use rand::Rng;
use thiserror::Error;

use crate::flow::HttpMethod;

/// A fully interpolated HTTP request, ready for the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpCall {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Response surface the engine cares about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Failure of a single transport attempt.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum TransportError {
    /// No implementation is configured for this transport.
    #[error("{what} transport not configured")]
    #[diagnostic(
        code(convoflow::transport::unavailable),
        help("attach an implementation via FlowRunner::with_http / with_ai")
    )]
    Unavailable { what: &'static str },

    /// The attempt reached the backend and failed.
    #[error("{what} request failed: {message}")]
    #[diagnostic(code(convoflow::transport::failed))]
    Failed { what: &'static str, message: String },
}

impl TransportError {
    pub fn failed(what: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            what,
            message: message.into(),
        }
    }
}

/// Executes HTTP request nodes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, call: HttpCall) -> Result<HttpResponse, TransportError>;
}

/// Executes AI assistant nodes.
#[async_trait]
pub trait AiBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError>;
}

/// Default transport that rejects every call.
///
/// Flows without HTTP or AI nodes never notice it; flows that do hit one of
/// those nodes fail the attempt with `Unavailable`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHttpTransport;

#[async_trait]
impl HttpTransport for NullHttpTransport {
    async fn send(&self, _call: HttpCall) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Unavailable { what: "http" })
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullAiBackend;

#[async_trait]
impl AiBackend for NullAiBackend {
    async fn complete(&self, _prompt: &str) -> Result<String, TransportError> {
        Err(TransportError::Unavailable { what: "ai" })
    }
}

/// Bounded retry with exponential backoff and uniform jitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never zero.
    pub attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    /// Policy without delays, for tests.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_for(&self, retry_index: u32) -> Duration {
        let base = self.base_delay.saturating_mul(1 << retry_index.min(16));
        if base.is_zero() {
            return base;
        }
        let jitter_ms = rand::rng().random_range(0..=base.as_millis() as u64 / 2);
        base + Duration::from_millis(jitter_ms)
    }

    /// Run `op` until it succeeds or the attempt budget is exhausted,
    /// returning the last error.
    pub async fn run<T, F, Fut>(&self, what: &'static str, mut op: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let attempts = self.attempts.max(1);
        let mut last = None;
        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.delay_for(attempt - 1)).await;
            }
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    tracing::warn!(
                        what,
                        attempt = attempt + 1,
                        attempts,
                        error = %err,
                        "transport attempt failed"
                    );
                    last = Some(err);
                }
            }
        }
        Err(last.unwrap_or(TransportError::Unavailable { what }))
    }
}
