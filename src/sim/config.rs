use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a single zone's local simulation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimConfig {
    /// Side length of the square zone
    #[serde(default = "default_zone_size")]
    pub zone_size: f64,

    /// Side length of a (square) vehicle
    #[serde(default = "default_vehicle_size")]
    pub vehicle_size: f64,

    /// Distance travelled per tick
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Maximum vehicles alive in the zone
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Per-tick chance of spawning one vehicle
    #[serde(default = "default_spawn_probability")]
    pub spawn_probability: f64,

    /// Per-tick chance of removing one vehicle
    #[serde(default = "default_attrition_probability")]
    pub attrition_probability: f64,

    /// Attrition only happens above this count
    #[serde(default = "default_attrition_floor")]
    pub attrition_floor: usize,

    /// Time a signal holds one state before toggling (milliseconds)
    #[serde(default = "default_signal_cycle_ms")]
    pub signal_cycle_ms: u64,

    /// Inclusive range for the starting population
    #[serde(default = "default_initial_min")]
    pub initial_min: usize,
    #[serde(default = "default_initial_max")]
    pub initial_max: usize,

    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_zone_size() -> f64 {
    200.0
}

fn default_vehicle_size() -> f64 {
    5.0
}

fn default_speed() -> f64 {
    7.0
}

fn default_capacity() -> usize {
    80
}

fn default_spawn_probability() -> f64 {
    0.4
}

fn default_attrition_probability() -> f64 {
    0.02
}

fn default_attrition_floor() -> usize {
    20
}

fn default_signal_cycle_ms() -> u64 {
    2000
}

fn default_initial_min() -> usize {
    20
}

fn default_initial_max() -> usize {
    35
}

impl SimConfig {
    pub fn signal_cycle(&self) -> Duration {
        Duration::from_millis(self.signal_cycle_ms)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            zone_size: default_zone_size(),
            vehicle_size: default_vehicle_size(),
            speed: default_speed(),
            capacity: default_capacity(),
            spawn_probability: default_spawn_probability(),
            attrition_probability: default_attrition_probability(),
            attrition_floor: default_attrition_floor(),
            signal_cycle_ms: default_signal_cycle_ms(),
            initial_min: default_initial_min(),
            initial_max: default_initial_max(),
            seed: None,
        }
    }
}
