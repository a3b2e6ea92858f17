//! Azure Resource Manager REST client
//!
//! Thin wrapper over `reqwest` that attaches a bearer token, appends the
//! `api-version` query parameter, retries transient failures and turns the
//! ARM error envelope into [`ArmError::Api`]. Mutating calls hand back a
//! [`Poller`].

use crate::credential::{TokenProvider, arm_scope};
use crate::error::{ArmError, Result};
use crate::poller::{Poller, PollerOptions, retry_after};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com";

/// Statuses worth another attempt; everything else is final
const TRANSIENT_STATUSES: [StatusCode; 6] = [
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// Exponential backoff for transient failures
#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(800),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryOptions {
    /// Backoff before retry number `attempt` (0-based), when the service
    /// sends no `Retry-After`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

/// ARM client for a single cloud endpoint
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: String,
    scope: String,
    credential: Arc<dyn TokenProvider>,
    poller_options: PollerOptions,
    retry_options: RetryOptions,
}

impl ArmClient {
    pub fn new(credential: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            scope: arm_scope(DEFAULT_ENDPOINT),
            credential,
            poller_options: PollerOptions::default(),
            retry_options: RetryOptions::default(),
        }
    }

    /// Use another ARM endpoint (sovereign clouds, Azure Stack); tokens are
    /// requested for the same audience
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self.scope = arm_scope(&self.endpoint);
        self
    }

    pub fn with_poller_options(mut self, options: PollerOptions) -> Self {
        self.poller_options = options;
        self
    }

    pub fn with_retry_options(mut self, options: RetryOptions) -> Self {
        self.retry_options = options;
        self
    }

    pub fn poller_options(&self) -> &PollerOptions {
        &self.poller_options
    }

    /// Acquire a token up front so credential problems surface before any mutation
    pub async fn authenticate(&self) -> Result<()> {
        self.credential.bearer_token(&self.scope).await.map(|_| ())
    }

    /// Resolve a resource path such as `/subscriptions/...` against the endpoint
    pub fn resource_url(&self, path: &str, api_version: &str) -> Result<Url> {
        let raw = format!("{}{}", self.endpoint.trim_end_matches('/'), path);
        let mut url = Url::parse(&raw).map_err(|e| ArmError::InvalidUrl(format!("{}: {}", raw, e)))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    /// Start a create-or-update (`PUT`) of the resource at `path`
    pub async fn put<T>(self: &Arc<Self>, path: &str, api_version: &str, body: &T) -> Result<Poller>
    where
        T: Serialize + ?Sized,
    {
        let url = self.resource_url(path, api_version)?;
        let body = serde_json::to_vec(body)?;
        let response = self.send(Method::PUT, url.clone(), Some(body)).await?;

        Poller::from_response(Arc::clone(self), Method::PUT, url, response).await
    }

    /// Start a deletion of the resource at `path`
    pub async fn delete(self: &Arc<Self>, path: &str, api_version: &str) -> Result<Poller> {
        let url = self.resource_url(path, api_version)?;
        let response = self.send(Method::DELETE, url.clone(), None).await?;

        Poller::from_response(Arc::clone(self), Method::DELETE, url, response).await
    }

    /// Authenticated `GET` of an absolute URL, used while polling
    pub(crate) async fn get(&self, url: Url) -> Result<reqwest::Response> {
        self.send(Method::GET, url, None).await
    }

    async fn send(&self, method: Method, url: Url, body: Option<Vec<u8>>) -> Result<reqwest::Response> {
        let mut attempt = 0;

        loop {
            tracing::debug!("{} {}", method, url);
            let mut request = self
                .http
                .request(method.clone(), url.clone())
                .bearer_auth(self.credential.bearer_token(&self.scope).await?);
            if let Some(body) = &body {
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(body.clone());
            }
            let outcome = request.send().await;

            let transient = match &outcome {
                Ok(response) if TRANSIENT_STATUSES.contains(&response.status()) => {
                    Some(retry_after(response.headers()))
                }
                Err(e) if e.is_connect() || e.is_timeout() => Some(None),
                _ => None,
            };
            let Some(server_delay) = transient.filter(|_| attempt < self.retry_options.max_retries)
            else {
                return check_status(outcome?).await;
            };

            let delay =
                server_delay.unwrap_or_else(|| self.retry_options.delay_for_attempt(attempt));
            match &outcome {
                Ok(response) => tracing::debug!(
                    "{} {} answered {}, retrying in {:?}",
                    method,
                    url,
                    response.status(),
                    delay
                ),
                Err(e) => tracing::debug!("{} {} failed ({}), retrying in {:?}", method, url, e, delay),
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

// ============ Error envelope ============

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorEnvelope>(&body)
        .ok()
        .and_then(|e| e.error);

    Err(match detail {
        Some(detail) => ArmError::Api {
            status: status.as_u16(),
            code: detail.code,
            message: detail.message,
        },
        None => ArmError::Api {
            status: status.as_u16(),
            code: status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: body,
        },
    })
}
