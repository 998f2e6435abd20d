//! Floating overlay widget engine.
//
//! Hosts several independently positioned, always-on-top widget
//! surfaces (clock, timers, spotlight masks and friends) that can be
//! dragged and resized by touch and survive process death without
//! losing position, size, or feature state. The crate owns instance
//! lifecycle, window geometry, the spotlight opening model, and the
//! asynchronous persistence path; rendering and feature business logic
//! live with the embedder.

pub mod constants;
pub mod geometry;
pub mod instance;
pub mod opening;
pub mod service;
pub mod store;
pub mod tracing_sub;

pub use geometry::{
    ControllerConfig, GesturePhase, HitTest, MinSize, NoControls, Point, ScreenBounds, TouchEvent,
    WindowGeometry, WindowGeometryController,
};
pub use instance::{FeatureKind, InstanceId, InstanceIdPool, PoolError, RecoveryCoordinator};
pub use opening::{
    CommittedOpenings, Opening, OpeningError, OpeningId, OpeningShape, OpeningSubscription,
    OverlayOpeningSet, OverlayUiState,
};
pub use service::{OpenError, OverlayService, OverlayWindow};
pub use store::{InstanceState, JsonFileStore, MemoryStore, StoreError, WindowStateStore};
