use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trafficgrid::config::{FaultInjector, SimConfig};

/// Zone worker configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Zone this worker simulates (required)
    #[serde(default)]
    pub zone: String,

    #[serde(default = "default_controller_url")]
    pub controller_url: String,

    #[serde(default = "default_host")]
    pub host: String,

    /// Fixed listen port; otherwise the first free one above the controller's
    #[serde(default)]
    pub port: Option<u16>,

    /// Address the controller should use to reach this worker
    #[serde(default)]
    pub advertised_url: Option<String>,

    #[serde(default)]
    pub registration: RegistrationConfig,

    #[serde(default = "default_report_timeout_ms")]
    pub report_timeout_ms: u64,

    #[serde(default)]
    pub sim: SimConfig,

    /// Simulated network impairment on outbound calls (off when absent)
    #[serde(default)]
    pub fault: Option<FaultInjector>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_registration_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_controller_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_report_timeout_ms() -> u64 {
    5_000
}

fn default_attempts() -> u32 {
    10
}

fn default_backoff_ms() -> u64 {
    2_000
}

fn default_registration_timeout_ms() -> u64 {
    5_000
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            zone: String::new(),
            controller_url: default_controller_url(),
            host: default_host(),
            port: None,
            advertised_url: None,
            registration: RegistrationConfig::default(),
            report_timeout_ms: default_report_timeout_ms(),
            sim: SimConfig::default(),
            fault: None,
        }
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
            timeout_ms: default_registration_timeout_ms(),
        }
    }
}

impl RegistrationConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl WorkerConfig {
    pub fn report_timeout(&self) -> Duration {
        Duration::from_millis(self.report_timeout_ms)
    }

    /// Port of the controller URL, used to derive this worker's port range
    pub fn controller_port(&self) -> u16 {
        reqwest::Url::parse(&self.controller_url)
            .ok()
            .and_then(|url| url.port_or_known_default())
            .unwrap_or(5000)
    }

    /// Controller URL without a trailing slash
    pub fn controller_base(&self) -> &str {
        self.controller_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<()> {
        if self.zone.trim().is_empty() {
            bail!("Zone name is required (set ZONE_WORKER_ZONE or `zone` in the config file)");
        }
        if self.registration.attempts == 0 {
            bail!("registration.attempts must be at least 1");
        }

        let sim = &self.sim;
        if !(sim.zone_size.is_finite() && sim.zone_size > 0.0) {
            bail!("sim.zone_size must be a positive number, got {}", sim.zone_size);
        }
        if !(sim.vehicle_size.is_finite() && sim.vehicle_size >= 0.0) {
            bail!("sim.vehicle_size must not be negative, got {}", sim.vehicle_size);
        }
        for (name, p) in [
            ("sim.spawn_probability", sim.spawn_probability),
            ("sim.attrition_probability", sim.attrition_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                bail!("{} must be within [0, 1], got {}", name, p);
            }
        }
        if let Some(fault) = &self.fault {
            if !(0.0..=1.0).contains(&fault.drop_probability) {
                bail!(
                    "fault.drop_probability must be within [0, 1], got {}",
                    fault.drop_probability
                );
            }
        }
        Ok(())
    }

    /// Apply `ZONE_WORKER_*` environment overrides
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("ZONE_WORKER_ZONE") {
            self.zone = v;
        }
        if let Some(v) = get("ZONE_WORKER_CONTROLLER_URL") {
            self.controller_url = v;
        }
        if let Some(v) = get("ZONE_WORKER_ADVERTISED_URL") {
            self.advertised_url = Some(v);
        }
        if let Some(port) = get("ZONE_WORKER_PORT").and_then(|v| v.trim().parse().ok()) {
            self.port = Some(port);
        }
        if let Some(seed) = get("ZONE_WORKER_SEED").and_then(|v| v.trim().parse().ok()) {
            self.sim.seed = Some(seed);
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &str) -> Result<WorkerConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))
}

/// Config from `ZONE_WORKER_CONFIG` (if set) plus environment overrides
pub fn from_env() -> Result<WorkerConfig> {
    let mut config = match std::env::var("ZONE_WORKER_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => WorkerConfig::default(),
    };
    config.apply_env();
    Ok(config)
}
