use std::sync::Arc;

use overlay_wm::{
    FeatureKind, InstanceIdPool, JsonFileStore, OverlayService, PoolError, RecoveryCoordinator,
    ScreenBounds, WindowStateStore,
};

#[test]
fn allocate_five_times_with_cap_four() {
    let pool = InstanceIdPool::new();
    let kind = FeatureKind::ScreenMask;
    let mut ids = Vec::new();
    for _ in 0..4 {
        ids.push(pool.allocate(kind).unwrap());
    }
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(
        pool.allocate(kind),
        Err(PoolError::Exhausted { kind, max: 4 })
    );

    pool.release(kind, 2);
    assert_eq!(pool.allocate(kind), Ok(2));
}

#[test]
fn active_count_never_exceeds_the_cap() {
    let pool = InstanceIdPool::new();
    let kind = FeatureKind::Timer;
    // Interleave allocations and releases; the cap holds throughout.
    for round in 0..20u32 {
        let _ = pool.allocate(kind);
        if round % 3 == 0 {
            pool.release(kind, (round % 7) + 1);
        }
        assert!(pool.active_count(kind) <= kind.max_instances());
        let ids = pool.active_ids(kind);
        assert_eq!(ids.len(), pool.active_count(kind));
    }
}

#[tokio::test]
async fn simulated_crash_and_restart_reattaches_windows() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("overlay-state.json");
    let bounds = ScreenBounds::new(1920, 1080);

    // First process: open two timers and a spotlight, then "crash"
    // without releasing anything.
    {
        let store = Arc::new(JsonFileStore::open(&path).unwrap());
        let service = OverlayService::new(store, bounds);
        service.open_window(FeatureKind::Timer).await.unwrap();
        service.open_window(FeatureKind::Timer).await.unwrap();
        service.open_window(FeatureKind::Spotlight).await.unwrap();
        service.writer().drain().await;
    }

    // Second process: a fresh pool knows nothing until recovery runs.
    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    let service = OverlayService::new(store.clone(), bounds);
    assert_eq!(service.pool().active_count(FeatureKind::Timer), 0);

    let adopted = service.recover_all().await.unwrap();
    assert_eq!(adopted, 3);
    assert_eq!(service.pool().active_count(FeatureKind::Timer), 2);
    assert_eq!(service.pool().active_count(FeatureKind::Spotlight), 1);

    // New windows allocate around the recovered ids instead of
    // duplicating them.
    let fresh = service.open_window(FeatureKind::Timer).await.unwrap();
    assert_eq!(fresh.instance, 3);

    // Reconciliation never deleted the durable rows.
    assert_eq!(
        store.list_active(FeatureKind::Timer).await.unwrap(),
        vec![1, 2]
    );
}

#[tokio::test]
async fn reconcile_is_idempotent_across_reruns() {
    let directory = tempfile::tempdir().unwrap();
    let path = directory.path().join("overlay-state.json");
    let store: Arc<dyn WindowStateStore> = Arc::new(JsonFileStore::open(&path).unwrap());
    store
        .put_geometry(
            FeatureKind::Clock,
            4,
            overlay_wm::WindowGeometry::new(10, 10, 420, 280),
        )
        .await
        .unwrap();

    let pool = Arc::new(InstanceIdPool::new());
    let coordinator = RecoveryCoordinator::new(pool.clone(), store);
    assert_eq!(coordinator.reconcile(FeatureKind::Clock).await.unwrap(), 1);
    assert_eq!(coordinator.reconcile(FeatureKind::Clock).await.unwrap(), 0);
    assert_eq!(pool.active_ids(FeatureKind::Clock).into_iter().collect::<Vec<_>>(), vec![4]);
}
