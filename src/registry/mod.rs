// Controller-side table of known workers, keyed by zone

use crate::protocol::ZoneSnapshot;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::info;


/// Everything the controller knows about one zone's worker
#[derive(Clone, Debug, Serialize)]
pub struct WorkerRecord {
    pub zone: String,

    /// Base URL the controller uses for step commands
    pub address: String,

    /// Identity of the worker process currently owning the zone
    pub instance_id: String,

    pub last_seen: DateTime<Utc>,

    /// Vehicle count from the last accepted report
    pub count: usize,

    /// Snapshot from the last accepted report; the zone's entry in views
    #[serde(skip)]
    pub snapshot: ZoneSnapshot,
}

/// Why a report was not applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Zone was never registered
    UnknownZone,
    /// Zone is registered to a different worker instance
    IdentityMismatch,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnknownZone => write!(f, "Worker not registered"),
            RejectReason::IdentityMismatch => write!(f, "Worker instance ID mismatch"),
        }
    }
}

impl std::error::Error for RejectReason {}

/// Registry of workers.
///
/// Records are replaced or mutated under the map's per-shard lock, so a
/// reader never sees a half-applied update. Records are never removed: a
/// worker that stops answering simply goes stale.
pub struct Registry {
    workers: DashMap<String, WorkerRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            workers: DashMap::new(),
        }
    }

    /// Insert or replace the record for `zone`.
    ///
    /// Returns the replaced record, if any.
    pub fn register(&self, zone: &str, address: &str, instance_id: &str) -> Option<WorkerRecord> {
        let record = WorkerRecord {
            zone: zone.to_string(),
            address: address.to_string(),
            instance_id: instance_id.to_string(),
            last_seen: Utc::now(),
            count: 0,
            snapshot: ZoneSnapshot::default(),
        };

        let previous = self.workers.insert(zone.to_string(), record);

        info!(
            zone = %zone,
            address = %address,
            instance_id = %instance_id,
            replaced = previous.is_some(),
            "Registered worker"
        );

        previous
    }

    /// Apply a report from `instance_id` for `zone`
    pub fn accept_update(
        &self,
        zone: &str,
        instance_id: &str,
        snapshot: ZoneSnapshot,
        count: usize,
    ) -> Result<(), RejectReason> {
        let mut record = self
            .workers
            .get_mut(zone)
            .ok_or(RejectReason::UnknownZone)?;

        if record.instance_id != instance_id {
            return Err(RejectReason::IdentityMismatch);
        }

        record.last_seen = Utc::now();
        record.count = count;
        record.snapshot = snapshot;

        Ok(())
    }

    /// Get a copy of one record
    pub fn get(&self, zone: &str) -> Option<WorkerRecord> {
        self.workers.get(zone).map(|r| r.clone())
    }

    /// Copy of every record, ordered by zone
    pub fn snapshot_all(&self) -> Vec<WorkerRecord> {
        let mut records: Vec<WorkerRecord> =
            self.workers.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.zone.cmp(&b.zone));
        records
    }

    /// Sum of every zone's last reported count
    pub fn total_count(&self) -> usize {
        self.workers.iter().map(|r| r.count).sum()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
