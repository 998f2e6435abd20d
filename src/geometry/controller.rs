//! Touch-driven drag/resize state machine for one overlay window.

use std::sync::Arc;

use crate::constants::{MOVE_THRESHOLD_DP, RESIZE_ZONE_DP};
use crate::geometry::{MinSize, Point, ScreenBounds, WindowGeometry};
use crate::instance::{FeatureKind, InstanceId};
use crate::store::writer::StateWriter;

/// Raw pointer event in screen coordinates. Deliberately free of any
/// platform event type so the state machine is testable on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchEvent {
    Down(Point),
    Move(Point),
    Up(Point),
    Cancel,
}

/// Collaborator that knows where the feature's interactive controls are.
/// A touch the collaborator claims is never interpreted as drag or
/// resize.
pub trait HitTest: Send + Sync {
    fn is_interactive(&self, point: Point) -> bool;
}

/// Hit-test for windows without interactive controls.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoControls;

impl HitTest for NoControls {
    fn is_interactive(&self, _point: Point) -> bool {
        false
    }
}

/// Tunables for one controller.
#[derive(Debug, Clone, Copy)]
pub struct ControllerConfig {
    /// Device pixels per density-independent pixel.
    pub density: f32,
    /// Smallest size the owning feature allows.
    pub min_size: MinSize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            density: 1.0,
            min_size: MinSize {
                width: 120,
                height: 90,
            },
        }
    }
}

/// Which part of the gesture state machine the controller is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Dragging,
    Resizing,
}

#[derive(Debug, Clone, Copy)]
enum Gesture {
    Idle,
    Dragging {
        origin: Point,
        start: WindowGeometry,
        engaged: bool,
    },
    Resizing {
        origin: Point,
        start: WindowGeometry,
        engaged: bool,
    },
}

/// Owns one overlay window's live geometry and turns raw touch events
/// into clamped moves and aspect-preserving resizes.
///
/// Touch handling is synchronous and never waits on storage; the final
/// geometry of an engaged gesture is handed to the [`StateWriter`] on
/// touch-up and written in the background.
pub struct WindowGeometryController {
    kind: FeatureKind,
    instance: InstanceId,
    geometry: WindowGeometry,
    bounds: ScreenBounds,
    config: ControllerConfig,
    hit_test: Arc<dyn HitTest>,
    writer: StateWriter,
    gesture: Gesture,
}

impl WindowGeometryController {
    pub fn new(
        kind: FeatureKind,
        instance: InstanceId,
        geometry: WindowGeometry,
        bounds: ScreenBounds,
        config: ControllerConfig,
        hit_test: Arc<dyn HitTest>,
        writer: StateWriter,
    ) -> Self {
        Self {
            kind,
            instance,
            geometry: geometry.clamped_to(bounds),
            bounds,
            config,
            hit_test,
            writer,
            gesture: Gesture::Idle,
        }
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// The live geometry, including any in-progress gesture mutation.
    pub fn current_bounds(&self) -> WindowGeometry {
        self.geometry
    }

    pub fn phase(&self) -> GesturePhase {
        match self.gesture {
            Gesture::Idle => GesturePhase::Idle,
            Gesture::Dragging { .. } => GesturePhase::Dragging,
            Gesture::Resizing { .. } => GesturePhase::Resizing,
        }
    }

    /// Replace the screen bounds (rotation, resolution change). The live
    /// geometry is re-clamped and committed when it had to change.
    pub fn set_screen_bounds(&mut self, bounds: ScreenBounds) {
        self.bounds = bounds;
        let clamped = self.geometry.clamped_to(bounds);
        if clamped != self.geometry {
            self.geometry = clamped;
            self.commit();
        }
    }

    /// Best-effort final commit of the live geometry, used when the
    /// owning window is torn down mid-gesture.
    pub fn flush(&mut self) {
        if !matches!(self.gesture, Gesture::Idle) {
            self.gesture = Gesture::Idle;
        }
        self.commit();
    }

    /// Feed one touch event through the state machine. Returns whether
    /// the controller claimed the event; an unclaimed event belongs to
    /// the feature's own controls.
    pub fn on_touch_event(&mut self, event: TouchEvent) -> bool {
        match event {
            TouchEvent::Down(point) => self.on_down(point),
            TouchEvent::Move(point) => self.on_move(point),
            TouchEvent::Up(_) | TouchEvent::Cancel => self.on_finish(),
        }
    }

    fn on_down(&mut self, point: Point) -> bool {
        // A stray down while a gesture is live restarts tracking.
        self.gesture = Gesture::Idle;
        if !self.geometry.contains(point) {
            return false;
        }
        if self.hit_test.is_interactive(point) {
            return false;
        }
        let zone = RESIZE_ZONE_DP * self.config.density;
        let start = self.geometry;
        if self.geometry.in_resize_zone(point, zone) {
            self.gesture = Gesture::Resizing {
                origin: point,
                start,
                engaged: false,
            };
            tracing::trace!(instance = self.instance, "resize armed");
        } else {
            self.gesture = Gesture::Dragging {
                origin: point,
                start,
                engaged: false,
            };
            tracing::trace!(instance = self.instance, "drag armed");
        }
        true
    }

    fn on_move(&mut self, point: Point) -> bool {
        let threshold = MOVE_THRESHOLD_DP * self.config.density;
        match &mut self.gesture {
            Gesture::Idle => false,
            Gesture::Dragging {
                origin,
                start,
                engaged,
            } => {
                let dx = point.x - origin.x;
                let dy = point.y - origin.y;
                if !*engaged && dx.abs() < threshold && dy.abs() < threshold {
                    return true;
                }
                *engaged = true;
                self.geometry = start.moved_by(dx, dy, self.bounds);
                true
            }
            Gesture::Resizing {
                origin,
                start,
                engaged,
            } => {
                let dw = point.x - origin.x;
                let dh = point.y - origin.y;
                if !*engaged && dw.abs() < threshold && dh.abs() < threshold {
                    return true;
                }
                *engaged = true;
                self.geometry = start.resized_by(dw, dh, self.config.min_size, self.bounds);
                true
            }
        }
    }

    fn on_finish(&mut self) -> bool {
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => false,
            Gesture::Dragging { engaged, .. } | Gesture::Resizing { engaged, .. } => {
                if engaged {
                    self.commit();
                }
                true
            }
        }
    }

    fn commit(&self) {
        tracing::debug!(
            kind = %self.kind,
            instance = self.instance,
            x = self.geometry.x,
            y = self.geometry.y,
            width = self.geometry.width,
            height = self.geometry.height,
            "geometry commit"
        );
        self.writer
            .commit_geometry(self.kind, self.instance, self.geometry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    struct FixedControls(Vec<WindowGeometry>);

    impl HitTest for FixedControls {
        fn is_interactive(&self, point: Point) -> bool {
            self.0.iter().any(|rect| rect.contains(point))
        }
    }

    fn controller(writer: StateWriter) -> WindowGeometryController {
        WindowGeometryController::new(
            FeatureKind::Clock,
            1,
            WindowGeometry::new(100, 100, 300, 200),
            ScreenBounds::new(1000, 800),
            ControllerConfig::default(),
            Arc::new(NoControls),
            writer,
        )
    }

    fn spawn_writer() -> (StateWriter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (StateWriter::spawn(store.clone(), 2), store)
    }

    #[tokio::test]
    async fn drag_moves_and_commits_on_up() {
        let (writer, store) = spawn_writer();
        let mut controller = controller(writer.clone());

        assert!(controller.on_touch_event(TouchEvent::Down(Point::new(150.0, 150.0))));
        assert_eq!(controller.phase(), GesturePhase::Dragging);
        assert!(controller.on_touch_event(TouchEvent::Move(Point::new(190.0, 170.0))));
        assert_eq!(controller.current_bounds().x, 140);
        assert_eq!(controller.current_bounds().y, 120);
        assert!(controller.on_touch_event(TouchEvent::Up(Point::new(190.0, 170.0))));
        assert_eq!(controller.phase(), GesturePhase::Idle);

        writer.drain().await;
        let state = store
            .snapshot(FeatureKind::Clock, 1)
            .await
            .expect("committed state");
        assert_eq!(state.geometry.unwrap().x, 140);
    }

    #[tokio::test]
    async fn moves_below_threshold_do_not_engage() {
        let (writer, store) = spawn_writer();
        let mut controller = controller(writer.clone());

        controller.on_touch_event(TouchEvent::Down(Point::new(150.0, 150.0)));
        controller.on_touch_event(TouchEvent::Move(Point::new(155.0, 154.0)));
        assert_eq!(controller.current_bounds().x, 100);
        controller.on_touch_event(TouchEvent::Up(Point::new(155.0, 154.0)));

        writer.drain().await;
        assert!(store.snapshot(FeatureKind::Clock, 1).await.is_none());
    }

    #[tokio::test]
    async fn down_in_trailing_band_resizes_with_aspect_kept() {
        let (writer, _store) = spawn_writer();
        let mut controller = controller(writer);

        controller.on_touch_event(TouchEvent::Down(Point::new(395.0, 295.0)));
        assert_eq!(controller.phase(), GesturePhase::Resizing);
        controller.on_touch_event(TouchEvent::Move(Point::new(455.0, 335.0)));
        let bounds = controller.current_bounds();
        assert!((bounds.aspect() - 1.5).abs() < 0.01);
        assert!(bounds.width > 300);
    }

    #[tokio::test]
    async fn interactive_controls_are_not_hijacked() {
        let (writer, _store) = spawn_writer();
        let mut controller = WindowGeometryController::new(
            FeatureKind::Timer,
            2,
            WindowGeometry::new(0, 0, 400, 300),
            ScreenBounds::new(1000, 800),
            ControllerConfig::default(),
            Arc::new(FixedControls(vec![WindowGeometry::new(10, 10, 80, 40)])),
            writer,
        );
        assert!(!controller.on_touch_event(TouchEvent::Down(Point::new(20.0, 20.0))));
        assert_eq!(controller.phase(), GesturePhase::Idle);
        // Outside the control the surface is still draggable.
        assert!(controller.on_touch_event(TouchEvent::Down(Point::new(200.0, 200.0))));
        assert_eq!(controller.phase(), GesturePhase::Dragging);
    }

    #[tokio::test]
    async fn cancel_commits_engaged_gesture() {
        let (writer, store) = spawn_writer();
        let mut controller = controller(writer.clone());

        controller.on_touch_event(TouchEvent::Down(Point::new(150.0, 150.0)));
        controller.on_touch_event(TouchEvent::Move(Point::new(260.0, 150.0)));
        controller.on_touch_event(TouchEvent::Cancel);

        writer.drain().await;
        let state = store
            .snapshot(FeatureKind::Clock, 1)
            .await
            .expect("committed state");
        assert_eq!(state.geometry.unwrap().x, 210);
    }

    #[tokio::test]
    async fn shrinking_screen_reclamps_and_commits() {
        let (writer, store) = spawn_writer();
        let mut controller = WindowGeometryController::new(
            FeatureKind::Clock,
            3,
            WindowGeometry::new(700, 500, 300, 200),
            ScreenBounds::new(1000, 800),
            ControllerConfig::default(),
            Arc::new(NoControls),
            writer.clone(),
        );
        controller.set_screen_bounds(ScreenBounds::new(800, 600));
        let bounds = controller.current_bounds();
        assert_eq!(bounds.x, 500);
        assert_eq!(bounds.y, 400);

        writer.drain().await;
        assert!(store.snapshot(FeatureKind::Clock, 3).await.is_some());
    }
}
