//! Registry of external model snapshots with a single active entry.

use crate::domain::{Digest32, ModelSnapshot, NewModelSnapshot, Timestamp, MAX_PERFORMANCE_SCORE};

use super::error::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePlan {
    snapshot: ModelSnapshot,
}

impl CreatePlan {
    pub fn index(&self) -> u64 {
        self.snapshot.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivatePlan {
    pub index: u64,
    pub deactivated: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelSnapshotRegistry {
    snapshots: Vec<ModelSnapshot>,
    active: Option<u64>,
}

impl ModelSnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.snapshots.len() as u64
    }

    pub fn active_index(&self) -> Option<u64> {
        self.active
    }

    pub fn plan_create(
        &self,
        snapshot: NewModelSnapshot,
        at: Timestamp,
    ) -> Result<CreatePlan, LedgerError> {
        if snapshot.version.trim().is_empty() {
            return Err(LedgerError::InvalidVersion);
        }
        if snapshot.performance_score > MAX_PERFORMANCE_SCORE {
            return Err(LedgerError::InvalidPerformanceScore(snapshot.performance_score));
        }
        let index = self
            .count()
            .checked_add(1)
            .ok_or(LedgerError::ArithmeticOverflow("model snapshot index"))?;
        Ok(CreatePlan {
            snapshot: ModelSnapshot::new(index, snapshot, at),
        })
    }

    pub fn apply_create(&mut self, plan: CreatePlan) -> &ModelSnapshot {
        self.snapshots.push(plan.snapshot);
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Activating the already-active snapshot is a no-op that still succeeds.
    pub fn plan_activate(&self, index: u64) -> Result<ActivatePlan, LedgerError> {
        if self.get(index).is_none() {
            return Err(LedgerError::NotFound(format!("model snapshot {}", index)));
        }
        Ok(ActivatePlan {
            index,
            deactivated: self.active.filter(|current| *current != index),
        })
    }

    pub fn apply_activate(&mut self, plan: ActivatePlan) {
        if let Some(previous) = plan.deactivated {
            if let Some(snapshot) = self.slot_mut(previous) {
                snapshot.active = false;
            }
        }
        if let Some(snapshot) = self.slot_mut(plan.index) {
            snapshot.active = true;
        }
        self.active = Some(plan.index);
    }

    /// `None` for index zero, out-of-range or never-created indices.
    pub fn get(&self, index: u64) -> Option<&ModelSnapshot> {
        if index == 0 {
            return None;
        }
        self.snapshots.get((index - 1) as usize)
    }

    /// Active snapshot with its integrity digest.
    pub fn latest_active(&self) -> Result<(&ModelSnapshot, Digest32), LedgerError> {
        let snapshot = self
            .active
            .and_then(|index| self.get(index))
            .ok_or(LedgerError::NoActiveModel)?;
        Ok((snapshot, snapshot.integrity_digest()))
    }

    pub fn active_count(&self) -> usize {
        self.snapshots.iter().filter(|s| s.active).count()
    }

    fn slot_mut(&mut self, index: u64) -> Option<&mut ModelSnapshot> {
        if index == 0 {
            return None;
        }
        self.snapshots.get_mut((index - 1) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_snapshot(version: &str, score: u32) -> NewModelSnapshot {
        NewModelSnapshot {
            version: version.to_string(),
            external_file_ref: "0.0.4242".to_string(),
            content_hash: Digest32([9; 32]),
            performance_score: score,
            description: String::new(),
        }
    }

    fn create(registry: &mut ModelSnapshotRegistry, version: &str) -> u64 {
        let plan = registry
            .plan_create(new_snapshot(version, 5_000), Timestamp::new(100))
            .unwrap();
        registry.apply_create(plan).index
    }

    fn activate(registry: &mut ModelSnapshotRegistry, index: u64) -> ActivatePlan {
        let plan = registry.plan_activate(index).unwrap();
        registry.apply_activate(plan);
        plan
    }

    #[test]
    fn test_create_validates_version_and_score() {
        let registry = ModelSnapshotRegistry::new();
        assert_eq!(
            registry.plan_create(new_snapshot("  ", 1), Timestamp::new(1)),
            Err(LedgerError::InvalidVersion)
        );
        assert_eq!(
            registry.plan_create(new_snapshot("v1", 10_001), Timestamp::new(1)),
            Err(LedgerError::InvalidPerformanceScore(10_001))
        );
        assert!(registry
            .plan_create(new_snapshot("v1", 10_000), Timestamp::new(1))
            .is_ok());
        assert!(registry
            .plan_create(new_snapshot("v1", 0), Timestamp::new(1))
            .is_ok());
    }

    #[test]
    fn test_new_snapshots_start_inactive() {
        let mut registry = ModelSnapshotRegistry::new();
        create(&mut registry, "v1");
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.latest_active().unwrap_err(), LedgerError::NoActiveModel);
    }

    #[test]
    fn test_activation_swaps_single_active_snapshot() {
        let mut registry = ModelSnapshotRegistry::new();
        let v1 = create(&mut registry, "v1");
        let v2 = create(&mut registry, "v2");

        assert_eq!(activate(&mut registry, v1).deactivated, None);
        assert_eq!(activate(&mut registry, v2).deactivated, Some(v1));
        assert_eq!(registry.active_count(), 1);
        assert!(!registry.get(v1).unwrap().active);

        let (snapshot, digest) = registry.latest_active().unwrap();
        assert_eq!(snapshot.version, "v2");
        assert_eq!(digest, snapshot.integrity_digest());
    }

    #[test]
    fn test_reactivating_active_snapshot_is_noop() {
        let mut registry = ModelSnapshotRegistry::new();
        let v1 = create(&mut registry, "v1");
        activate(&mut registry, v1);
        assert_eq!(activate(&mut registry, v1).deactivated, None);
        assert_eq!(registry.active_count(), 1);
    }

    #[test]
    fn test_activate_unknown_index_is_not_found() {
        let registry = ModelSnapshotRegistry::new();
        assert!(matches!(
            registry.plan_activate(1),
            Err(LedgerError::NotFound(_))
        ));
        assert!(registry.get(0).is_none());
        assert!(registry.get(7).is_none());
    }
}
