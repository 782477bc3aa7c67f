// Outbound call policy: timeout, retry with fixed backoff, fault injection

mod fault;
mod policy;

pub use fault::FaultInjector;
pub use policy::{CallError, CallPolicy};
