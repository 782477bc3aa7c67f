use crate::net::FaultInjector;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Step coordinator configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// How long to wait for the first registrations (milliseconds)
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,

    /// How often to re-check the registry while waiting (milliseconds)
    #[serde(default = "default_registration_poll_ms")]
    pub registration_poll_ms: u64,

    /// Start cycling as soon as this many zones are registered
    #[serde(default = "default_min_workers")]
    pub min_workers: usize,

    /// Per-worker bound on a step command (milliseconds)
    #[serde(default = "default_step_timeout_ms")]
    pub step_timeout_ms: u64,

    /// Pause between cycles (milliseconds)
    #[serde(default = "default_cycle_interval_ms")]
    pub cycle_interval_ms: u64,

    /// Stop cycling after this long; run forever when unset (milliseconds)
    #[serde(default)]
    pub duration_ms: Option<u64>,

    /// Report mean cycle duration on completion and exit
    #[serde(default)]
    pub headless: bool,

    /// Impair outbound step commands (testing aid)
    #[serde(default)]
    pub fault: Option<FaultInjector>,
}

fn default_startup_timeout_ms() -> u64 {
    30_000
}

fn default_registration_poll_ms() -> u64 {
    1_000
}

fn default_min_workers() -> usize {
    1
}

fn default_step_timeout_ms() -> u64 {
    3_000
}

fn default_cycle_interval_ms() -> u64 {
    500
}

impl CoordinatorConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn registration_poll(&self) -> Duration {
        Duration::from_millis(self.registration_poll_ms.max(1))
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.step_timeout_ms)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            startup_timeout_ms: default_startup_timeout_ms(),
            registration_poll_ms: default_registration_poll_ms(),
            min_workers: default_min_workers(),
            step_timeout_ms: default_step_timeout_ms(),
            cycle_interval_ms: default_cycle_interval_ms(),
            duration_ms: None,
            headless: false,
            fault: None,
        }
    }
}
