//! Startup reconciliation between the id pool and the durable store.

use std::sync::Arc;

use super::{FeatureKind, InstanceIdPool};
use crate::store::{StoreError, WindowStateStore};

/// Repairs the in-memory pool after an unclean shutdown.
///
/// A process killed mid-session leaves durable rows for windows the pool
/// has never heard of; those ids are adopted so relaunching the feature
/// reattaches to the persisted windows instead of allocating duplicates.
/// The reverse case, an in-memory id with no durable row, is a freshly
/// allocated instance whose first commit has not landed yet and is left
/// alone. Reconciliation never deletes durable rows.
pub struct RecoveryCoordinator {
    pool: Arc<InstanceIdPool>,
    store: Arc<dyn WindowStateStore>,
}

impl RecoveryCoordinator {
    pub fn new(pool: Arc<InstanceIdPool>, store: Arc<dyn WindowStateStore>) -> Self {
        Self { pool, store }
    }

    /// Run once per kind at service start. Returns how many orphaned ids
    /// were adopted.
    pub async fn reconcile(&self, kind: FeatureKind) -> Result<usize, StoreError> {
        let durable = self.store.list_active(kind).await?;
        let known = self.pool.active_ids(kind);
        let mut adopted = 0;
        for id in durable {
            if known.contains(&id) {
                continue;
            }
            if self.pool.register_existing(kind, id) {
                tracing::info!(%kind, instance = id, "adopted orphaned instance from store");
                adopted += 1;
            }
        }
        if adopted > 0 {
            tracing::info!(%kind, adopted, "recovery reconciled id pool");
        }
        Ok(adopted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::WindowGeometry;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn adopts_orphans_and_leaves_fresh_ids_alone() {
        let store = Arc::new(MemoryStore::new());
        let kind = FeatureKind::Timer;
        for id in [1, 2, 5] {
            store
                .put_geometry(kind, id, WindowGeometry::new(0, 0, 200, 150))
                .await
                .unwrap();
        }

        let pool = Arc::new(InstanceIdPool::new());
        // A freshly allocated id with no durable row yet.
        assert_eq!(pool.allocate(kind).unwrap(), 1);

        let coordinator = RecoveryCoordinator::new(pool.clone(), store.clone());
        let adopted = coordinator.reconcile(kind).await.unwrap();
        assert_eq!(adopted, 2);
        assert!(pool.active_ids(kind).contains(&5));
        // Fresh id survived, durable rows untouched.
        assert!(pool.active_ids(kind).contains(&1));
        assert_eq!(store.list_active(kind).await.unwrap(), vec![1, 2, 5]);

        // A second run is a no-op.
        assert_eq!(coordinator.reconcile(kind).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn recovered_ids_are_not_reallocated() {
        let store = Arc::new(MemoryStore::new());
        let kind = FeatureKind::Spotlight;
        store
            .put_geometry(kind, 1, WindowGeometry::new(0, 0, 300, 200))
            .await
            .unwrap();

        let pool = Arc::new(InstanceIdPool::new());
        RecoveryCoordinator::new(pool.clone(), store)
            .reconcile(kind)
            .await
            .unwrap();
        assert_eq!(pool.allocate(kind).unwrap(), 2);
    }
}
