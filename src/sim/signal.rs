use crate::protocol::SignalState;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Binary signal state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Light {
    Stop,
    Go,
}

impl Light {
    pub fn toggled(self) -> Self {
        match self {
            Light::Stop => Light::Go,
            Light::Go => Light::Stop,
        }
    }
}

/// Fixed-cycle traffic signal, one per zone
#[derive(Clone, Debug)]
pub struct Signal {
    pub x: f64,
    pub y: f64,
    light: Light,
    last_transition: Instant,
    cycle: Duration,
}

impl Signal {
    /// New signal in the `Stop` state, last transition at `now`
    pub fn new(x: f64, y: f64, cycle: Duration, now: Instant) -> Self {
        Self {
            x,
            y,
            light: Light::Stop,
            last_transition: now,
            cycle,
        }
    }

    pub fn light(&self) -> Light {
        self.light
    }

    /// Toggle once more than one cycle has elapsed since the last transition.
    ///
    /// Returns true if the light changed.
    pub fn update(&mut self, now: Instant) -> bool {
        if now.saturating_duration_since(self.last_transition) > self.cycle {
            self.light = self.light.toggled();
            self.last_transition = now;
            true
        } else {
            false
        }
    }

    pub fn state(&self) -> SignalState {
        SignalState {
            x: self.x,
            y: self.y,
            state: self.light,
        }
    }
}
