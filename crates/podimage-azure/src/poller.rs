//! Long-running operation polling
//!
//! ARM reports the progress of an asynchronous create or delete in one of
//! three ways, checked in this order:
//!
//! 1. an `Azure-AsyncOperation` header naming a status resource
//! 2. a `Location` header that answers 202 until the work is finished
//! 3. `properties.provisioningState` on the resource itself
//!
//! Waiting is unbounded; only the service decides when an operation ends.

use crate::client::{ArmClient, ErrorDetail};
use crate::error::{ArmError, Result};
use reqwest::header::{HeaderMap, LOCATION, RETRY_AFTER};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const AZURE_ASYNC_OPERATION: &str = "azure-asyncoperation";
const DEFAULT_POLL_FREQUENCY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct PollerOptions {
    /// Delay between status checks when the service sends no `Retry-After`
    pub frequency: Duration,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_POLL_FREQUENCY,
        }
    }
}

/// Status of an operation or provisioning state, compared case-insensitively
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::InProgress,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != Self::InProgress
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Canceled => "Canceled",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
enum PollState {
    Done(Option<Value>),
    /// Accepted, but already reported as failed
    Failed(ArmError),
    AsyncOperation(Url),
    Location(Url),
    ProvisioningState,
}

#[derive(Debug, Deserialize)]
struct OperationResource {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

/// Handle on a submitted ARM operation
pub struct Poller {
    arm: Arc<ArmClient>,
    method: Method,
    resource_url: Url,
    state: PollState,
    delay: Duration,
}

impl fmt::Debug for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("method", &self.method)
            .field("resource_url", &self.resource_url.as_str())
            .field("state", &self.state)
            .finish()
    }
}

impl Poller {
    pub(crate) async fn from_response(
        arm: Arc<ArmClient>,
        method: Method,
        resource_url: Url,
        response: reqwest::Response,
    ) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = read_body(response).await?;
        let delay = next_delay(&headers, arm.poller_options());

        let state = if let Some(url) = header_url(&headers, AZURE_ASYNC_OPERATION)? {
            PollState::AsyncOperation(url)
        } else if status == StatusCode::ACCEPTED {
            match header_url(&headers, LOCATION.as_str())? {
                Some(url) => PollState::Location(url),
                None => {
                    return Err(ArmError::UnexpectedResponse(format!(
                        "202 Accepted for {} without a polling URL",
                        resource_url.path()
                    )));
                }
            }
        } else if method == Method::PUT {
            match provisioning_state(body.as_ref()) {
                OperationStatus::InProgress => PollState::ProvisioningState,
                OperationStatus::Succeeded => PollState::Done(body),
                failed => PollState::Failed(resource_failed(&resource_url, failed, body.as_ref())),
            }
        } else {
            PollState::Done(body)
        };

        Ok(Self {
            arm,
            method,
            resource_url,
            state,
            delay,
        })
    }

    /// Whether the operation had already finished when it was submitted
    pub fn is_done(&self) -> bool {
        matches!(self.state, PollState::Done(_))
    }

    /// Wait for a terminal state; returns the final resource body, if any
    pub async fn poll_until_done(mut self) -> Result<Option<Value>> {
        loop {
            match self.state {
                PollState::Done(body) => return Ok(body),
                PollState::Failed(err) => return Err(err),
                _ => {}
            }
            tokio::time::sleep(self.delay).await;
            self.state = self.poll().await?;
        }
    }

    async fn poll(&mut self) -> Result<PollState> {
        let state = std::mem::replace(&mut self.state, PollState::Done(None));

        match state {
            PollState::Done(body) => Ok(PollState::Done(body)),
            PollState::Failed(err) => Err(err),
            PollState::AsyncOperation(url) => {
                tracing::debug!("Polling operation status {}", url);
                let response = self.arm.get(url.clone()).await?;
                self.delay = next_delay(response.headers(), self.arm.poller_options());
                let operation: OperationResource = response.json().await?;

                let status = operation
                    .status
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        ArmError::UnexpectedResponse(format!("operation status at {} has no status", url))
                    })?;

                match OperationStatus::parse(&status) {
                    OperationStatus::InProgress => Ok(PollState::AsyncOperation(url)),
                    OperationStatus::Succeeded => self.final_state().await,
                    failed => Err(ArmError::OperationFailed {
                        operation: self.resource_url.path().to_string(),
                        status: failed.to_string(),
                        message: operation.error.map(|e| e.message).unwrap_or_default(),
                    }),
                }
            }
            PollState::Location(url) => {
                tracing::debug!("Polling location {}", url);
                let response = self.arm.get(url.clone()).await?;
                self.delay = next_delay(response.headers(), self.arm.poller_options());

                if response.status() == StatusCode::ACCEPTED {
                    let next = header_url(response.headers(), LOCATION.as_str())?.unwrap_or(url);
                    return Ok(PollState::Location(next));
                }
                if self.method == Method::PUT {
                    return self.final_state().await;
                }
                Ok(PollState::Done(read_body(response).await?))
            }
            PollState::ProvisioningState => {
                tracing::debug!("Polling provisioning state of {}", self.resource_url.path());
                let response = self.arm.get(self.resource_url.clone()).await?;
                self.delay = next_delay(response.headers(), self.arm.poller_options());
                let body = read_body(response).await?;

                match provisioning_state(body.as_ref()) {
                    OperationStatus::InProgress => Ok(PollState::ProvisioningState),
                    OperationStatus::Succeeded => Ok(PollState::Done(body)),
                    failed => Err(resource_failed(&self.resource_url, failed, body.as_ref())),
                }
            }
        }
    }

    /// Resource body once the operation has succeeded
    async fn final_state(&self) -> Result<PollState> {
        if self.method == Method::DELETE {
            return Ok(PollState::Done(None));
        }
        let response = self.arm.get(self.resource_url.clone()).await?;
        Ok(PollState::Done(read_body(response).await?))
    }
}

async fn read_body(response: reqwest::Response) -> Result<Option<Value>> {
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// A resource without a provisioning state is treated as provisioned.
fn provisioning_state(body: Option<&Value>) -> OperationStatus {
    body.and_then(|b| b.pointer("/properties/provisioningState"))
        .and_then(Value::as_str)
        .map(OperationStatus::parse)
        .unwrap_or(OperationStatus::Succeeded)
}

fn resource_failed(url: &Url, status: OperationStatus, body: Option<&Value>) -> ArmError {
    let message = body
        .and_then(|b| b.pointer("/properties/error/message").or_else(|| b.pointer("/error/message")))
        .and_then(Value::as_str)
        .unwrap_or("provisioning did not succeed")
        .to_string();

    ArmError::OperationFailed {
        operation: url.path().to_string(),
        status: status.to_string(),
        message,
    }
}

/// Delay requested by a `Retry-After` header given in seconds
pub(crate) fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn next_delay(headers: &HeaderMap, options: &PollerOptions) -> Duration {
    retry_after(headers).unwrap_or(options.frequency)
}

fn header_url(headers: &HeaderMap, name: &str) -> Result<Option<Url>> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|e| ArmError::InvalidUrl(format!("{} header: {}", name, e)))?;
    Url::parse(value)
        .map(Some)
        .map_err(|e| ArmError::InvalidUrl(format!("{}: {}", value, e)))
}
