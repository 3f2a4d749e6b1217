use std::time::Duration;

use moka::future::Cache;

use crate::model::policy::{GeoFence, ShiftWindow};

/// Read-through cache for directory policy rows that change rarely.
///
/// Keys are department ids for shifts and branch ids for geofences.
#[derive(Clone)]
pub struct PolicyCache {
    shifts: Cache<u64, ShiftWindow>,
    geofences: Cache<u64, GeoFence>,
}

impl PolicyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            shifts: Cache::builder()
                .max_capacity(10_000) // tune based on memory
                .time_to_live(ttl)
                .build(),
            geofences: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn shift(&self, department_id: u64) -> Option<ShiftWindow> {
        self.shifts.get(&department_id).await
    }

    pub async fn remember_shift(&self, department_id: u64, shift: ShiftWindow) {
        self.shifts.insert(department_id, shift).await;
    }

    pub async fn geofence(&self, branch_id: u64) -> Option<GeoFence> {
        self.geofences.get(&branch_id).await
    }

    pub async fn remember_geofence(&self, branch_id: u64, fence: GeoFence) {
        self.geofences.insert(branch_id, fence).await;
    }

    /// Batch insert shifts concurrently
    pub async fn remember_shifts(&self, batch: &[(u64, ShiftWindow)]) {
        let futures: Vec<_> = batch
            .iter()
            .map(|(id, shift)| self.shifts.insert(*id, shift.clone()))
            .collect();

        futures::future::join_all(futures).await;
    }

    pub fn invalidate_all(&self) {
        self.shifts.invalidate_all();
        self.geofences.invalidate_all();
    }
}
