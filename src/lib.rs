// Per-zone vehicle and signal simulation
pub mod sim;

// Wire types shared with workers
pub mod protocol;

// Worker registry
pub mod registry;

// Aggregate state and its shared container
pub mod state;

// Outbound call policy
pub mod net;

// Lockstep step coordinator
pub mod coordinator;

// Live state fan-out
pub mod broadcast;

// HTTP, SSE and WebSocket APIs
pub mod api;

// Controller configuration
pub mod config;

pub use broadcast::{BroadcastEvent, Broadcaster, EventKind};
pub use coordinator::{CoordinatorError, StepCoordinator};
pub use protocol::ZoneSnapshot;
pub use state::{AggregateStateView, ControllerState};
