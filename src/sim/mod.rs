// Per-zone entity simulation: vehicles, signal, spawn and attrition

pub mod config;
mod signal;
mod vehicle;
mod zone;

pub use config::SimConfig;
pub use signal::{Light, Signal};
pub use vehicle::{Bounds, Heading, Vehicle};
pub use zone::{TickReport, Zone};
