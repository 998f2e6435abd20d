//! Launch/close orchestration over the pool, the store, and the
//! geometry controllers.

use std::sync::Arc;

use thiserror::Error;

use crate::constants::COMMIT_LANES;
use crate::geometry::{
    ControllerConfig, HitTest, NoControls, ScreenBounds, WindowGeometryController,
};
use crate::instance::{
    FeatureKind, InstanceId, InstanceIdPool, PoolError, RecoveryCoordinator,
};
use crate::opening::OverlayOpeningSet;
use crate::store::writer::StateWriter;
use crate::store::{StoreError, WindowStateStore};

#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One live overlay window: its identity plus the controller that owns
/// its geometry.
pub struct OverlayWindow {
    pub kind: FeatureKind,
    pub instance: InstanceId,
    pub controller: WindowGeometryController,
}

impl std::fmt::Debug for OverlayWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayWindow")
            .field("kind", &self.kind)
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

/// Ties the engine together: id allocation, crash recovery, persisted
/// geometry, and the shared commit writer.
pub struct OverlayService {
    pool: Arc<InstanceIdPool>,
    store: Arc<dyn WindowStateStore>,
    writer: StateWriter,
    bounds: ScreenBounds,
    density: f32,
}

impl OverlayService {
    /// Must be called from within a tokio runtime; the commit workers
    /// are spawned here.
    pub fn new(store: Arc<dyn WindowStateStore>, bounds: ScreenBounds) -> Self {
        let writer = StateWriter::spawn(store.clone(), COMMIT_LANES);
        Self {
            pool: Arc::new(InstanceIdPool::new()),
            store,
            writer,
            bounds,
            density: 1.0,
        }
    }

    pub fn set_density(&mut self, density: f32) {
        self.density = density;
    }

    pub fn pool(&self) -> &Arc<InstanceIdPool> {
        &self.pool
    }

    pub fn writer(&self) -> StateWriter {
        self.writer.clone()
    }

    pub fn store(&self) -> &Arc<dyn WindowStateStore> {
        &self.store
    }

    /// Reconcile one kind's id bookkeeping against the durable store.
    /// Run at service start, before the first `open_window` of the kind.
    pub async fn recover(&self, kind: FeatureKind) -> Result<usize, StoreError> {
        RecoveryCoordinator::new(self.pool.clone(), self.store.clone())
            .reconcile(kind)
            .await
    }

    /// Reconcile every feature kind. Returns the total adopted count.
    pub async fn recover_all(&self) -> Result<usize, StoreError> {
        let mut adopted = 0;
        for kind in FeatureKind::ALL {
            adopted += self.recover(kind).await?;
        }
        Ok(adopted)
    }

    /// Open a new window of the kind: allocate the smallest free id,
    /// restore its persisted geometry (or center a default), and attach
    /// a controller wired to the commit writer.
    pub async fn open_window(&self, kind: FeatureKind) -> Result<OverlayWindow, OpenError> {
        self.open_window_with(kind, Arc::new(NoControls)).await
    }

    /// Like [`open_window`](Self::open_window) with the feature's own
    /// hit-test collaborator.
    pub async fn open_window_with(
        &self,
        kind: FeatureKind,
        hit_test: Arc<dyn HitTest>,
    ) -> Result<OverlayWindow, OpenError> {
        let instance = self.pool.allocate(kind)?;
        let persisted = self
            .store
            .get_state(kind, instance)
            .await?
            .and_then(|state| state.geometry);
        let geometry = persisted
            .map(|geometry| geometry.clamped_to(self.bounds))
            .unwrap_or_else(|| kind.default_geometry(self.bounds));

        // Make the instance durably active right away so an unclean
        // shutdown before the first gesture is still recoverable. A
        // failure here is not fatal: the id stays allocated and the next
        // gesture commit re-creates the row.
        if let Err(err) = self.store.put_geometry(kind, instance, geometry).await {
            tracing::warn!(%kind, instance, error = %err, "initial activation write failed");
        }

        let config = ControllerConfig {
            density: self.density,
            min_size: kind.min_window_size(),
        };
        tracing::info!(%kind, instance, "opened overlay window");
        Ok(OverlayWindow {
            kind,
            instance,
            controller: WindowGeometryController::new(
                kind,
                instance,
                geometry,
                self.bounds,
                config,
                hit_test,
                self.writer.clone(),
            ),
        })
    }

    /// Attach a controller to an instance the pool already knows,
    /// typically one adopted by recovery. The persisted geometry is
    /// restored as-is (re-clamped to the current screen).
    pub async fn reattach_window(
        &self,
        kind: FeatureKind,
        instance: InstanceId,
        hit_test: Arc<dyn HitTest>,
    ) -> Result<OverlayWindow, OpenError> {
        let persisted = self
            .store
            .get_state(kind, instance)
            .await?
            .and_then(|state| state.geometry);
        let geometry = persisted
            .map(|geometry| geometry.clamped_to(self.bounds))
            .unwrap_or_else(|| kind.default_geometry(self.bounds));
        let config = ControllerConfig {
            density: self.density,
            min_size: kind.min_window_size(),
        };
        tracing::info!(%kind, instance, "reattached overlay window");
        Ok(OverlayWindow {
            kind,
            instance,
            controller: WindowGeometryController::new(
                kind,
                instance,
                geometry,
                self.bounds,
                config,
                hit_test,
                self.writer.clone(),
            ),
        })
    }

    /// Load the opening collection for a spotlight-style window, sized
    /// to the window's current content area.
    pub async fn open_opening_set(
        &self,
        window: &OverlayWindow,
    ) -> Result<OverlayOpeningSet, StoreError> {
        let bounds = window.controller.current_bounds();
        OverlayOpeningSet::load(
            window.kind,
            window.instance,
            bounds.width as f32,
            bounds.height as f32,
            &self.store,
            self.writer.clone(),
        )
        .await
    }

    /// Close a window for good: delete its durable state and return its
    /// id to the pool. For process teardown with the window surviving,
    /// use the controller's `flush` instead.
    pub async fn close_window(&self, window: OverlayWindow) -> Result<(), StoreError> {
        let OverlayWindow { kind, instance, .. } = window;
        self.store.delete_state(kind, instance).await?;
        self.pool.release(kind, instance);
        tracing::info!(%kind, instance, "closed overlay window");
        Ok(())
    }
}
