use crate::protocol::ZoneSnapshot;
use crate::registry::{RejectReason, Registry, WorkerRecord};
use crate::state::aggregate::AggregateState;
use crate::state::view::{AggregateStateView, RunStatus};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Single owner of the registry and the aggregate.
///
/// Every read-modify-write happens inside one method call holding the
/// relevant lock; no guard is ever handed out or held across an await.
pub struct ControllerState {
    registry: Registry,
    aggregate: RwLock<AggregateState>,
}

impl ControllerState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            registry: Registry::new(),
            aggregate: RwLock::new(AggregateState::new(history_capacity)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AggregateState> {
        self.aggregate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AggregateState> {
        self.aggregate.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register (or re-register) a worker for `zone`
    pub fn register(&self, zone: &str, address: &str, instance_id: &str) {
        self.registry.register(zone, address, instance_id);
    }

    /// Apply a worker report.
    ///
    /// Identity check, count and snapshot land on the zone's record under
    /// one registry guard; views read zones from those same records.
    pub fn accept_report(
        &self,
        zone: &str,
        instance_id: &str,
        snapshot: ZoneSnapshot,
        count: usize,
    ) -> Result<(), RejectReason> {
        self.registry
            .accept_update(zone, instance_id, snapshot, count)?;

        debug!(zone = %zone, count = count, "Accepted zone report");
        Ok(())
    }

    /// Registry contents at this instant, ordered by zone
    pub fn workers(&self) -> Vec<WorkerRecord> {
        self.registry.snapshot_all()
    }

    pub fn worker(&self, zone: &str) -> Option<WorkerRecord> {
        self.registry.get(zone)
    }

    pub fn worker_count(&self) -> usize {
        self.registry.len()
    }

    pub fn step(&self) -> u64 {
        self.read().step()
    }

    pub fn set_active(&self, active: bool) {
        self.write().set_active(active);
    }

    pub fn is_active(&self) -> bool {
        self.read().is_active()
    }

    /// Start a cycle: bump the step counter and snapshot the registry
    pub fn begin_cycle(&self) -> (u64, Vec<WorkerRecord>) {
        let step = self.write().advance_step();
        (step, self.registry.snapshot_all())
    }

    /// Close a cycle: re-sum every zone's last count and append it to history
    pub fn finish_cycle(&self, step: u64) -> usize {
        let total = self.registry.total_count();
        self.write().record_total(step, total);
        total
    }

    /// Full read-only copy for observers
    pub fn view(&self) -> AggregateStateView {
        let (status, step, history) = {
            let aggregate = self.read();
            let status = if aggregate.is_active() {
                RunStatus::Active
            } else {
                RunStatus::Inactive
            };
            (status, aggregate.step(), aggregate.history().to_vec())
        };

        let workers = self.registry.snapshot_all();
        let total_count = workers.iter().map(|w| w.count).sum();
        let zones = workers
            .iter()
            .map(|w| (w.zone.clone(), w.snapshot.clone()))
            .collect();

        AggregateStateView {
            status,
            step,
            total_count,
            worker_count: workers.len(),
            zones,
            history,
            workers: workers.into_iter().map(|w| (w.zone.clone(), w)).collect(),
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(crate::state::DEFAULT_HISTORY_CAPACITY)
    }
}
