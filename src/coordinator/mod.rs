// Step coordinator: lockstep cycles across all registered workers

pub mod config;
mod transport;

pub use config::CoordinatorConfig;
pub use transport::{HttpStepTransport, StepTransport};

use crate::net::CallPolicy;
use crate::protocol::StepCommand;
use crate::state::ControllerState;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Fatal coordinator conditions
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorError {
    /// Nobody registered within the startup window
    StartupTimeout { waited: Duration },
}

impl std::fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinatorError::StartupTimeout { waited } => write!(
                f,
                "No workers registered within {:.1}s, nothing to coordinate",
                waited.as_secs_f64()
            ),
        }
    }
}

impl std::error::Error for CoordinatorError {}

/// Result of one cycle
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub step: u64,
    /// Re-summed total recorded in history for this step
    pub total: usize,
    pub acknowledged: usize,
    /// Zones whose step command failed this cycle
    pub failed: Vec<String>,
    pub duration: Duration,
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub cycles: u64,
    pub last_step: u64,
    pub mean_cycle: Option<Duration>,
}

/// Drives lockstep cycles.
///
/// Owns nothing but configuration; all shared state lives in
/// [`ControllerState`].
pub struct StepCoordinator<T: StepTransport> {
    state: Arc<ControllerState>,
    transport: Arc<T>,
    config: CoordinatorConfig,
    policy: CallPolicy,
    controller_id: String,
}

impl<T: StepTransport> StepCoordinator<T> {
    pub fn new(state: Arc<ControllerState>, transport: Arc<T>, config: CoordinatorConfig) -> Self {
        let policy = CallPolicy::once(config.step_timeout()).with_faults(config.fault.clone());

        Self {
            state,
            transport,
            config,
            policy,
            controller_id: format!("controller-{}", uuid::Uuid::now_v7()),
        }
    }

    pub fn controller_id(&self) -> &str {
        &self.controller_id
    }

    /// Block until enough workers registered or the startup window closes
    pub async fn wait_for_workers(&self) -> Result<usize, CoordinatorError> {
        let started = Instant::now();
        let window = self.config.startup_timeout();
        let wanted = self.config.min_workers.max(1);

        info!(
            min_workers = wanted,
            timeout_ms = self.config.startup_timeout_ms,
            "Waiting for workers to register"
        );

        loop {
            let count = self.state.worker_count();
            if count >= wanted {
                return Ok(count);
            }

            let waited = started.elapsed();
            if waited >= window {
                if count > 0 {
                    warn!(
                        registered = count,
                        wanted = wanted,
                        "Startup window elapsed, starting with available workers"
                    );
                    return Ok(count);
                }
                return Err(CoordinatorError::StartupTimeout { waited });
            }

            sleep(self.config.registration_poll().min(window - waited)).await;
        }
    }

    /// Run one cycle: increment step, fan out, collect, record
    pub async fn run_cycle(&self) -> CycleOutcome {
        let started = Instant::now();
        let (step, workers) = self.state.begin_cycle();

        let command = StepCommand {
            step_number: step,
            controller_id: self.controller_id.clone(),
        };

        let calls = workers.iter().map(|worker| {
            let command = &command;
            async move {
                let result = self
                    .policy
                    .run(|| self.transport.send_step(worker, command))
                    .await;
                (worker, result)
            }
        });

        let mut acknowledged = 0;
        let mut failed = Vec::new();
        for (worker, result) in join_all(calls).await {
            match result {
                Ok(ack) => {
                    if ack.instance_id != worker.instance_id {
                        debug!(
                            zone = %worker.zone,
                            expected = %worker.instance_id,
                            got = %ack.instance_id,
                            "Step acknowledged by a different instance"
                        );
                    }
                    acknowledged += 1;
                }
                Err(e) => {
                    warn!(
                        zone = %worker.zone,
                        address = %worker.address,
                        step = step,
                        error = %e,
                        "Step command failed"
                    );
                    failed.push(worker.zone.clone());
                }
            }
        }

        let total = self.state.finish_cycle(step);
        let duration = started.elapsed();

        debug!(
            step = step,
            total = total,
            acknowledged = acknowledged,
            failed = failed.len(),
            duration_ms = duration.as_millis() as u64,
            "Cycle complete"
        );

        CycleOutcome {
            step,
            total,
            acknowledged,
            failed,
            duration,
        }
    }

    /// Wait for workers, then cycle until the configured duration elapses
    /// (or forever).
    pub async fn run(&self) -> Result<RunSummary, CoordinatorError> {
        let workers = match self.wait_for_workers().await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "Coordinator startup failed");
                self.state.set_active(false);
                return Err(e);
            }
        };

        info!(
            workers = workers,
            controller_id = %self.controller_id,
            "Starting simulation loop"
        );

        self.state.set_active(true);
        // A deadline past what Instant can represent means no deadline
        let deadline = self
            .config
            .duration()
            .and_then(|d| Instant::now().checked_add(d));
        let interval = self.config.cycle_interval();

        let mut cycle_times = Vec::new();
        while deadline.map_or(true, |d| Instant::now() < d) {
            let outcome = self.run_cycle().await;
            cycle_times.push(outcome.duration);
            sleep(interval).await;
        }

        self.state.set_active(false);

        let summary = RunSummary {
            cycles: cycle_times.len() as u64,
            last_step: self.state.step(),
            mean_cycle: mean(&cycle_times),
        };

        info!(
            cycles = summary.cycles,
            last_step = summary.last_step,
            "Simulation loop finished"
        );

        Ok(summary)
    }
}

fn mean(durations: &[Duration]) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }
    let total: Duration = durations.iter().sum();
    Some(total / durations.len() as u32)
}
