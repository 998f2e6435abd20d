//! Per-kind allocator and recycler of small instance identifiers.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use thiserror::Error;

use super::{FeatureKind, InstanceId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    /// All ids of the kind are in use. Surfaced to the user as a
    /// "maximum windows reached" condition, never a crash.
    #[error("{kind} already has {max} open windows")]
    Exhausted { kind: FeatureKind, max: usize },
}

/// Process-wide bookkeeping of which instance ids are live per feature
/// kind.
///
/// Each kind has its own critical section, so two windows of different
/// kinds never contend, while two windows of the same kind can never
/// race for the same id. The pool holds no durable state of its own; on
/// restart it is rebuilt from the store by [`RecoveryCoordinator`].
///
/// [`RecoveryCoordinator`]: super::RecoveryCoordinator
pub struct InstanceIdPool {
    active: BTreeMap<FeatureKind, Mutex<BTreeSet<InstanceId>>>,
}

impl InstanceIdPool {
    pub fn new() -> Self {
        let active = FeatureKind::ALL
            .into_iter()
            .map(|kind| (kind, Mutex::new(BTreeSet::new())))
            .collect();
        Self { active }
    }

    fn slot(&self, kind: FeatureKind) -> &Mutex<BTreeSet<InstanceId>> {
        // new() seeds every kind, so the lookup cannot miss.
        &self.active[&kind]
    }

    /// Hand out the smallest unused positive id for the kind.
    pub fn allocate(&self, kind: FeatureKind) -> Result<InstanceId, PoolError> {
        let max = kind.max_instances();
        let mut active = self.slot(kind).lock().unwrap_or_else(|e| e.into_inner());
        if active.len() >= max {
            tracing::debug!(%kind, max, "allocation refused, pool exhausted");
            return Err(PoolError::Exhausted { kind, max });
        }
        let id = (1..).find(|id| !active.contains(id)).unwrap_or(1);
        active.insert(id);
        tracing::debug!(%kind, instance = id, "allocated instance id");
        Ok(id)
    }

    /// Return an id to the pool. Releasing an id the pool does not know
    /// is a no-op.
    pub fn release(&self, kind: FeatureKind, id: InstanceId) {
        let mut active = self.slot(kind).lock().unwrap_or_else(|e| e.into_inner());
        if active.remove(&id) {
            tracing::debug!(%kind, instance = id, "released instance id");
        } else {
            tracing::trace!(%kind, instance = id, "release of unknown id ignored");
        }
    }

    /// Adopt an id found in the durable store. Idempotent; returns true
    /// when the id was newly adopted. Adopting past the kind's cap is
    /// refused so the cap invariant survives a corrupt store.
    pub fn register_existing(&self, kind: FeatureKind, id: InstanceId) -> bool {
        let max = kind.max_instances();
        let mut active = self.slot(kind).lock().unwrap_or_else(|e| e.into_inner());
        if active.contains(&id) {
            return false;
        }
        if active.len() >= max {
            tracing::warn!(%kind, instance = id, max, "refusing to adopt id past the cap");
            return false;
        }
        active.insert(id);
        true
    }

    pub fn active_ids(&self, kind: FeatureKind) -> BTreeSet<InstanceId> {
        self.slot(kind)
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn active_count(&self, kind: FeatureKind) -> usize {
        self.slot(kind)
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl Default for InstanceIdPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_smallest_free_id_and_exhausts_at_cap() {
        let pool = InstanceIdPool::new();
        let kind = FeatureKind::Clock;
        for expected in 1..=4 {
            assert_eq!(pool.allocate(kind), Ok(expected));
        }
        assert_eq!(pool.allocate(kind), Err(PoolError::Exhausted { kind, max: 4 }));

        pool.release(kind, 2);
        assert_eq!(pool.allocate(kind), Ok(2));
    }

    #[test]
    fn kinds_do_not_share_id_space() {
        let pool = InstanceIdPool::new();
        assert_eq!(pool.allocate(FeatureKind::Clock), Ok(1));
        assert_eq!(pool.allocate(FeatureKind::Timer), Ok(1));
        assert_eq!(pool.active_count(FeatureKind::Clock), 1);
        assert_eq!(pool.active_count(FeatureKind::Timer), 1);
    }

    #[test]
    fn timer_cap_is_seven() {
        let pool = InstanceIdPool::new();
        for _ in 0..7 {
            pool.allocate(FeatureKind::Timer).unwrap();
        }
        assert!(pool.allocate(FeatureKind::Timer).is_err());
    }

    #[test]
    fn release_is_idempotent() {
        let pool = InstanceIdPool::new();
        pool.allocate(FeatureKind::Spotlight).unwrap();
        pool.release(FeatureKind::Spotlight, 9);
        pool.release(FeatureKind::Spotlight, 1);
        pool.release(FeatureKind::Spotlight, 1);
        assert_eq!(pool.active_count(FeatureKind::Spotlight), 0);
    }

    #[test]
    fn register_existing_then_release_frees_the_id() {
        let pool = InstanceIdPool::new();
        assert!(pool.register_existing(FeatureKind::ScreenMask, 3));
        assert!(!pool.register_existing(FeatureKind::ScreenMask, 3));
        assert!(pool.active_ids(FeatureKind::ScreenMask).contains(&3));

        pool.release(FeatureKind::ScreenMask, 3);
        assert!(!pool.active_ids(FeatureKind::ScreenMask).contains(&3));
    }

    #[test]
    fn registered_ids_are_skipped_by_allocate() {
        let pool = InstanceIdPool::new();
        pool.register_existing(FeatureKind::Clock, 1);
        pool.register_existing(FeatureKind::Clock, 3);
        assert_eq!(pool.allocate(FeatureKind::Clock), Ok(2));
        assert_eq!(pool.allocate(FeatureKind::Clock), Ok(4));
    }
}
