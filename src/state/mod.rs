// Authoritative aggregate state and its shared container

mod aggregate;
mod controller;
mod view;

pub use aggregate::{AggregateState, History, HistorySample, DEFAULT_HISTORY_CAPACITY};
pub use controller::ControllerState;
pub use view::{AggregateStateView, RunStatus};
