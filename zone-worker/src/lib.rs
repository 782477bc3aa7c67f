//! Zone Worker - simulates one zone of the traffic grid.
//!
//! A worker owns its zone's vehicles and signal. It registers with the
//! controller, then waits to be stepped:
//!
//! ```text
//!   Controller                      Zone Worker
//!      │  POST /api/workers/register   │
//!      │ ◄──────────────────────────── │  (retried, fatal on exhaustion)
//!      │                               │
//!      │  POST /api/step {step_number} │
//!      │ ────────────────────────────► │  one local tick
//!      │  POST /api/report {entities}  │
//!      │ ◄──────────────────────────── │  (best effort, never retried)
//!      │  200 {acknowledged}           │
//!      │ ◄──────────────────────────── │
//! ```
//!
//! # Core Types
//!
//! - [`WorkerAgent`] - registration state machine and step handling
//! - [`WorkerConfig`] - zone identity, controller address, simulation tunables

pub mod agent;
pub mod api;
pub mod config;
pub mod port;

pub use agent::{AgentState, RegistrationError, ReportOutcome, ReportRejected, WorkerAgent};
pub use config::WorkerConfig;
