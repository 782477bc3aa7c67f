use anyhow::{Context, Result};
use serde::Deserialize;

// Re-export per-module config types
pub use crate::coordinator::config::CoordinatorConfig;
pub use crate::net::FaultInjector;
pub use crate::sim::config::SimConfig;

/// Complete controller configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Broadcast channel configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BroadcastConfig {
    /// Emission period per subscriber (milliseconds)
    #[serde(default = "default_broadcast_interval_ms")]
    pub interval_ms: u64,
    /// Number of (step, total) samples kept
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_broadcast_interval_ms() -> u64 {
    500
}

fn default_history_capacity() -> usize {
    crate::state::DEFAULT_HISTORY_CAPACITY
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_broadcast_interval_ms(),
            history_capacity: default_history_capacity(),
        }
    }
}

impl ControllerConfig {
    /// Apply `TRAFFICGRID_*` environment overrides.
    ///
    /// Unparseable values are ignored and the configured value kept.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("TRAFFICGRID_HOST") {
            self.server.host = v;
        }
        if let Some(n) = parse(&get, "TRAFFICGRID_PORT") {
            self.server.port = n;
        }
        if let Some(n) = parse::<u64>(&get, "TRAFFICGRID_DURATION_SECS") {
            self.coordinator.duration_ms = Some(n.saturating_mul(1000));
        }
        if let Some(b) = parse(&get, "TRAFFICGRID_HEADLESS") {
            self.coordinator.headless = b;
        }
        if let Some(n) = parse(&get, "TRAFFICGRID_MIN_WORKERS") {
            self.coordinator.min_workers = n;
        }
        if let Some(n) = parse(&get, "TRAFFICGRID_STEP_TIMEOUT_MS") {
            self.coordinator.step_timeout_ms = n;
        }
        if let Some(n) = parse(&get, "TRAFFICGRID_CYCLE_INTERVAL_MS") {
            self.coordinator.cycle_interval_ms = n;
        }
    }
}

fn parse<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|v| v.trim().parse().ok())
}

/// Load configuration from a TOML file
pub fn load_config(path: &str) -> Result<ControllerConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path))?;
    let config: ControllerConfig =
        toml::from_str(&contents).with_context(|| format!("Failed to parse config file {}", path))?;
    Ok(config)
}

/// Config from `TRAFFICGRID_CONFIG` (if set) plus environment overrides
pub fn from_env() -> Result<ControllerConfig> {
    let mut config = match std::env::var("TRAFFICGRID_CONFIG") {
        Ok(path) => load_config(&path)?,
        Err(_) => ControllerConfig::default(),
    };
    config.apply_env();
    Ok(config)
}
