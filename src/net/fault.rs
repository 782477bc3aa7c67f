use crate::net::CallError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simulated network impairment applied before an outbound call
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaultInjector {
    /// Mean added latency (milliseconds)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: f64,

    /// Uniform jitter around the mean (milliseconds)
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: f64,

    /// Chance that the call is dropped outright
    #[serde(default = "default_drop_probability")]
    pub drop_probability: f64,
}

fn default_latency_ms() -> f64 {
    15.0
}

fn default_jitter_ms() -> f64 {
    8.0
}

fn default_drop_probability() -> f64 {
    0.01
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
            jitter_ms: default_jitter_ms(),
            drop_probability: default_drop_probability(),
        }
    }
}

impl FaultInjector {
    /// Draw this call's delay and drop decision
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> (Duration, bool) {
        let jitter = if self.jitter_ms > 0.0 {
            rng.gen_range(-self.jitter_ms..=self.jitter_ms)
        } else {
            0.0
        };
        let delay_ms = (self.latency_ms + jitter).max(0.0);
        let dropped = rng.gen::<f64>() < self.drop_probability;
        (Duration::from_secs_f64(delay_ms / 1000.0), dropped)
    }

    /// Sleep for the sampled delay, then fail if the call was dropped
    pub async fn perturb(&self) -> Result<(), CallError> {
        // ThreadRng is !Send, so sample before awaiting
        let (delay, dropped) = self.sample(&mut rand::thread_rng());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if dropped {
            return Err(CallError::Dropped);
        }
        Ok(())
    }
}
