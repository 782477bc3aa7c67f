//! Worker Agent: owns one zone's simulation and talks to the controller.
//!
//! Lifecycle is `Unregistered → Registering → Active`. There is no way back;
//! a worker that exhausts its registration attempts is expected to exit.

use crate::config::WorkerConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use trafficgrid::net::{CallError, CallPolicy};
use trafficgrid::protocol::{
    ErrorResponse, MessageResponse, RegisterRequest, ReportRequest, ZoneSnapshot,
};
use trafficgrid::sim::Zone;

/// Registration progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentState {
    Unregistered,
    Registering,
    Active,
}

/// Registration gave up after every attempt failed
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationError {
    Exhausted { attempts: u32, last: CallError },
}

impl std::fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationError::Exhausted { attempts, last } => write!(
                f,
                "Registration failed after {} attempts: {}",
                attempts, last
            ),
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Controller refused a report (unknown zone or superseded instance)
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRejected {
    pub reason: String,
}

impl std::fmt::Display for ReportRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "report rejected by controller: {}", self.reason)
    }
}

impl std::error::Error for ReportRejected {}

/// What happened to one best-effort report push
#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Accepted,
    Rejected(ReportRejected),
    Failed(CallError),
}

struct Simulation {
    zone: Zone,
    rng: StdRng,
}

pub struct WorkerAgent {
    zone: String,
    instance_id: String,
    advertised_url: String,
    controller_url: String,
    client: reqwest::Client,
    registration_policy: CallPolicy,
    report_policy: CallPolicy,
    state: Mutex<AgentState>,
    sim: Mutex<Simulation>,
    steps: AtomicU64,
}

impl WorkerAgent {
    /// Build an agent with a freshly populated zone and a new instance id
    pub fn new(config: &WorkerConfig, advertised_url: String) -> Self {
        let mut rng = match config.sim.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut zone = Zone::new(config.zone.clone(), config.sim.clone(), Instant::now());
        zone.populate(&mut rng);

        let registration_policy = CallPolicy::once(config.registration.timeout())
            .with_retries(config.registration.attempts, config.registration.backoff())
            .with_faults(config.fault.clone());
        let report_policy =
            CallPolicy::once(config.report_timeout()).with_faults(config.fault.clone());

        Self {
            zone: config.zone.clone(),
            instance_id: format!("worker-{}", uuid::Uuid::now_v7()),
            advertised_url,
            controller_url: config.controller_base().to_string(),
            client: reqwest::Client::new(),
            registration_policy,
            report_policy,
            state: Mutex::new(AgentState::Unregistered),
            sim: Mutex::new(Simulation { zone, rng }),
            steps: AtomicU64::new(0),
        }
    }

    pub fn zone(&self) -> &str {
        &self.zone
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn advertised_url(&self) -> &str {
        &self.advertised_url
    }

    pub fn state(&self) -> AgentState {
        *lock(&self.state)
    }

    /// Local ticks completed so far
    pub fn steps(&self) -> u64 {
        self.steps.load(Ordering::SeqCst)
    }

    /// Current vehicle count
    pub fn vehicle_count(&self) -> usize {
        lock(&self.sim).zone.len()
    }

    /// Register this zone with the controller, retrying per policy
    pub async fn register(&self) -> Result<(), RegistrationError> {
        *lock(&self.state) = AgentState::Registering;

        info!(
            zone = %self.zone,
            instance_id = %self.instance_id,
            controller = %self.controller_url,
            address = %self.advertised_url,
            "Registering with controller"
        );

        let request = RegisterRequest {
            zone: self.zone.clone(),
            address: self.advertised_url.clone(),
            instance_id: self.instance_id.clone(),
        };

        match self
            .registration_policy
            .run(|| self.post_register(&request))
            .await
        {
            Ok(response) => {
                *lock(&self.state) = AgentState::Active;
                info!(zone = %self.zone, message = %response.message, "Registered");
                Ok(())
            }
            Err(last) => {
                let attempts = self.registration_policy.attempts;
                error!(
                    zone = %self.zone,
                    attempts = attempts,
                    error = %last,
                    "Giving up on registration"
                );
                Err(RegistrationError::Exhausted { attempts, last })
            }
        }
    }

    async fn post_register(&self, request: &RegisterRequest) -> Result<MessageResponse, CallError> {
        self.client
            .post(format!("{}/api/workers/register", self.controller_url))
            .json(request)
            .send()
            .await
            .map_err(CallError::from_reqwest)?
            .error_for_status()
            .map_err(CallError::from_reqwest)?
            .json::<MessageResponse>()
            .await
            .map_err(|e| CallError::Decode(e.to_string()))
    }

    /// Run one local tick for `step_number`, then push the result.
    ///
    /// The tick always completes and the local counter always advances,
    /// whatever happens to the push.
    pub async fn handle_step(&self, step_number: u64) -> ZoneSnapshot {
        let (snapshot, report) = {
            let mut sim = lock(&self.sim);
            let Simulation { zone, rng } = &mut *sim;
            let report = zone.advance(Instant::now(), rng);
            (zone.snapshot(), report)
        };
        let local = self.steps.fetch_add(1, Ordering::SeqCst) + 1;

        debug!(
            zone = %self.zone,
            step = step_number,
            local_step = local,
            vehicles = snapshot.entities.len(),
            spawned = ?report.spawned,
            removed = ?report.removed,
            signal_toggled = report.signal_toggled,
            "Tick complete"
        );

        match self.push_report(snapshot.clone()).await {
            ReportOutcome::Accepted => {}
            ReportOutcome::Rejected(rejected) => {
                warn!(
                    zone = %self.zone,
                    instance_id = %self.instance_id,
                    step = step_number,
                    reason = %rejected.reason,
                    "Controller rejected report"
                );
            }
            ReportOutcome::Failed(e) => {
                warn!(
                    zone = %self.zone,
                    step = step_number,
                    error = %e,
                    "Failed to push report"
                );
            }
        }

        snapshot
    }

    /// Push one snapshot to the controller. Never retried.
    pub async fn push_report(&self, snapshot: ZoneSnapshot) -> ReportOutcome {
        let report = ReportRequest::new(&self.zone, &self.instance_id, snapshot);

        match self.report_policy.run(|| self.post_report(&report)).await {
            Ok(outcome) => outcome,
            Err(e) => ReportOutcome::Failed(e),
        }
    }

    async fn post_report(&self, report: &ReportRequest) -> Result<ReportOutcome, CallError> {
        let response = self
            .client
            .post(format!("{}/api/report", self.controller_url))
            .json(report)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            Ok(ReportOutcome::Accepted)
        } else if status == StatusCode::NOT_FOUND {
            let reason = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| status.to_string());
            Ok(ReportOutcome::Rejected(ReportRejected { reason }))
        } else {
            Err(CallError::Status(status.as_u16()))
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistrationConfig;
    use mockito::Matcher;
    use serde_json::json;

    fn test_config(controller_url: String) -> WorkerConfig {
        let mut config = WorkerConfig {
            zone: "North".to_string(),
            controller_url,
            registration: RegistrationConfig {
                attempts: 3,
                backoff_ms: 10,
                timeout_ms: 1_000,
            },
            report_timeout_ms: 1_000,
            ..WorkerConfig::default()
        };
        config.sim.seed = Some(7);
        config
    }

    fn agent_for(url: String) -> WorkerAgent {
        WorkerAgent::new(&test_config(url), "http://localhost:5101".to_string())
    }

    #[test]
    fn test_new_agent_is_unregistered_and_populated() {
        let agent = agent_for("http://localhost:5000".to_string());
        assert_eq!(agent.state(), AgentState::Unregistered);
        assert!(agent.instance_id().starts_with("worker-"));
        assert!((20..=35).contains(&agent.vehicle_count()));
        assert_eq!(agent.steps(), 0);
    }

    #[test]
    fn test_instance_ids_are_unique() {
        let a = agent_for("http://localhost:5000".to_string());
        let b = agent_for("http://localhost:5000".to_string());
        assert_ne!(a.instance_id(), b.instance_id());
    }

    #[tokio::test]
    async fn test_register_success() {
        let mut server = mockito::Server::new_async().await;
        let agent = agent_for(server.url());

        let mock = server
            .mock("POST", "/api/workers/register")
            .match_body(Matcher::PartialJson(json!({
                "zone": "North",
                "address": "http://localhost:5101",
                "instance_id": agent.instance_id(),
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message":"Worker registered successfully"}"#)
            .create_async()
            .await;

        let result = agent.register().await;
        assert!(result.is_ok(), "Expected Ok, got {:?}", result);
        assert_eq!(agent.state(), AgentState::Active);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_register_retries_then_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/workers/register")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let agent = agent_for(server.url());
        let result = agent.register().await;

        assert_eq!(
            result,
            Err(RegistrationError::Exhausted {
                attempts: 3,
                last: CallError::Status(500),
            })
        );
        // No way back to Unregistered
        assert_eq!(agent.state(), AgentState::Registering);

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_register_malformed_response_is_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/workers/register")
            .with_status(200)
            .with_body("not json")
            .expect(3)
            .create_async()
            .await;

        let agent = agent_for(server.url());
        let result = agent.register().await;

        assert!(matches!(
            result,
            Err(RegistrationError::Exhausted {
                last: CallError::Decode(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_handle_step_pushes_report() {
        let mut server = mockito::Server::new_async().await;
        let agent = agent_for(server.url());

        let mock = server
            .mock("POST", "/api/report")
            .match_body(Matcher::PartialJson(json!({
                "zone": "North",
                "instance_id": agent.instance_id(),
            })))
            .with_status(200)
            .with_body(r#"{"message":"Update received"}"#)
            .create_async()
            .await;

        let snapshot = agent.handle_step(1).await;

        assert_eq!(agent.steps(), 1);
        assert_eq!(snapshot.entities.len(), agent.vehicle_count());
        assert!(snapshot.signal.is_some());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_report_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/report")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"instance identity does not match"}"#)
            .expect(1)
            .create_async()
            .await;

        let agent = agent_for(server.url());
        let outcome = agent.push_report(ZoneSnapshot::default()).await;

        assert_eq!(
            outcome,
            ReportOutcome::Rejected(ReportRejected {
                reason: "instance identity does not match".to_string(),
            })
        );

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_step_completes_without_controller() {
        let agent = agent_for("http://127.0.0.1:1".to_string());

        agent.handle_step(1).await;
        agent.handle_step(2).await;

        assert_eq!(agent.steps(), 2);
    }

    #[tokio::test]
    async fn test_server_error_report_is_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/report")
            .with_status(503)
            .create_async()
            .await;

        let agent = agent_for(server.url());
        let outcome = agent.push_report(ZoneSnapshot::default()).await;

        assert_eq!(outcome, ReportOutcome::Failed(CallError::Status(503)));
    }
}
