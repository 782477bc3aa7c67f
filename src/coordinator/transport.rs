use crate::net::CallError;
use crate::protocol::{StepAck, StepCommand};
use crate::registry::WorkerRecord;
use async_trait::async_trait;

/// Delivers a step command to one worker
#[async_trait]
pub trait StepTransport: Send + Sync {
    async fn send_step(
        &self,
        worker: &WorkerRecord,
        command: &StepCommand,
    ) -> Result<StepAck, CallError>;
}

/// HTTP transport: `POST {address}/api/step`
#[derive(Clone, Default)]
pub struct HttpStepTransport {
    client: reqwest::Client,
}

impl HttpStepTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl StepTransport for HttpStepTransport {
    async fn send_step(
        &self,
        worker: &WorkerRecord,
        command: &StepCommand,
    ) -> Result<StepAck, CallError> {
        let url = format!("{}/api/step", worker.address.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(command)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;

        if !response.status().is_success() {
            return Err(CallError::Status(response.status().as_u16()));
        }

        response
            .json::<StepAck>()
            .await
            .map_err(|e| CallError::Decode(e.to_string()))
    }
}
