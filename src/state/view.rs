use crate::protocol::ZoneSnapshot;
use crate::registry::WorkerRecord;
use crate::state::aggregate::HistorySample;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether the coordinator loop is currently cycling
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Active,
    Inactive,
}

/// Read-only copy of the whole aggregate, as published to observers
#[derive(Clone, Debug, Serialize)]
pub struct AggregateStateView {
    pub status: RunStatus,
    pub step: u64,
    pub total_count: usize,
    pub worker_count: usize,
    pub zones: BTreeMap<String, ZoneSnapshot>,
    pub history: Vec<HistorySample>,
    pub workers: BTreeMap<String, WorkerRecord>,
}
