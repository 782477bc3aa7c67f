use crate::net::FaultInjector;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

/// Failure of one outbound call
#[derive(Debug, Clone, PartialEq)]
pub enum CallError {
    /// No response within the policy timeout
    Timeout,
    /// Could not reach the remote side
    Connect(String),
    /// Remote answered with a non-success status
    Status(u16),
    /// Response body did not parse
    Decode(String),
    /// Dropped by fault injection
    Dropped,
}

impl CallError {
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            CallError::Timeout
        } else if let Some(status) = e.status() {
            CallError::Status(status.as_u16())
        } else if e.is_decode() {
            CallError::Decode(e.to_string())
        } else {
            CallError::Connect(e.to_string())
        }
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Timeout => write!(f, "request timed out"),
            CallError::Connect(msg) => write!(f, "connection error: {}", msg),
            CallError::Status(code) => write!(f, "non-success status {}", code),
            CallError::Decode(msg) => write!(f, "malformed response: {}", msg),
            CallError::Dropped => write!(f, "request dropped by fault injection"),
        }
    }
}

impl std::error::Error for CallError {}

/// Policy composed around any outbound call.
///
/// Each attempt (including injected latency) is bounded by `timeout`;
/// failed attempts are retried after a fixed `backoff` until `attempts`
/// is exhausted, and the last error is returned.
#[derive(Clone, Debug)]
pub struct CallPolicy {
    pub timeout: Duration,
    pub attempts: u32,
    pub backoff: Duration,
    pub fault: Option<FaultInjector>,
}

impl CallPolicy {
    /// Single attempt bounded by `timeout`
    pub fn once(timeout: Duration) -> Self {
        Self {
            timeout,
            attempts: 1,
            backoff: Duration::ZERO,
            fault: None,
        }
    }

    pub fn with_retries(mut self, attempts: u32, backoff: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.backoff = backoff;
        self
    }

    pub fn with_faults(mut self, fault: Option<FaultInjector>) -> Self {
        self.fault = fault;
        self
    }

    /// Run `op` under this policy
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(&mut op).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => return Err(e),
                Err(e) => {
                    warn!(
                        attempt = attempt,
                        max_attempts = attempts,
                        error = %e,
                        "Outbound call failed, will retry"
                    );
                    sleep(self.backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt<T, F, Fut>(&self, op: &mut F) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let call = async {
            if let Some(fault) = &self.fault {
                fault.perturb().await?;
            }
            op().await
        };

        match timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CallError::Timeout),
        }
    }
}
