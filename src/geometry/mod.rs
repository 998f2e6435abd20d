//! Window geometry primitives and the pure math behind drag and resize.
//
//! Everything here is free of I/O and platform types so the clamp and
//! scale rules can be tested in isolation. `controller` builds the
//! gesture state machine on top of these helpers.

mod controller;

use serde::{Deserialize, Serialize};

pub use controller::{
    ControllerConfig, GesturePhase, HitTest, NoControls, TouchEvent, WindowGeometryController,
};

/// A touch point in device pixels, screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Usable screen area in device pixels. Overlay windows are always kept
/// fully inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenBounds {
    pub width: u32,
    pub height: u32,
}

impl ScreenBounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Minimum window dimensions a feature is willing to shrink to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinSize {
    pub width: u32,
    pub height: u32,
}

/// Position and size of one overlay window, in device pixels.
///
/// The origin is signed like the intermediate values produced during a
/// gesture; every committed geometry satisfies `0 <= x <= screen - width`
/// on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl WindowGeometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Geometry of the given size centered on the screen.
    pub fn centered(width: u32, height: u32, bounds: ScreenBounds) -> Self {
        let x = (bounds.width.saturating_sub(width) / 2) as i32;
        let y = (bounds.height.saturating_sub(height) / 2) as i32;
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when the point falls inside the window rectangle.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x as f32
            && point.x < (self.x + self.width as i32) as f32
            && point.y >= self.y as f32
            && point.y < (self.y + self.height as i32) as f32
    }

    /// True when the point lands in the trailing-edge resize band of the
    /// given width (device pixels): the rightmost or bottommost strip of
    /// the window.
    pub fn in_resize_zone(&self, point: Point, zone: f32) -> bool {
        if !self.contains(point) {
            return false;
        }
        let right_edge = (self.x + self.width as i32) as f32;
        let bottom_edge = (self.y + self.height as i32) as f32;
        point.x >= right_edge - zone || point.y >= bottom_edge - zone
    }

    /// Translate by a drag delta and clamp so the window stays fully
    /// on-screen.
    pub fn moved_by(&self, dx: f32, dy: f32, bounds: ScreenBounds) -> Self {
        let mut next = *self;
        next.x += dx.round() as i32;
        next.y += dy.round() as i32;
        next.clamped_to(bounds)
    }

    /// Clamp the origin into `[0, screen - size]` on both axes. A window
    /// larger than the screen is shrunk to fit first.
    pub fn clamped_to(&self, bounds: ScreenBounds) -> Self {
        let width = self.width.min(bounds.width);
        let height = self.height.min(bounds.height);
        let max_x = (bounds.width - width) as i32;
        let max_y = (bounds.height - height) as i32;
        Self {
            x: self.x.clamp(0, max_x),
            y: self.y.clamp(0, max_y),
            width,
            height,
        }
    }

    /// Apply a resize delta with the equal-scaling policy.
    ///
    /// Candidate dimensions are the old ones plus the delta, floored at
    /// the feature minimums; a single uniform factor
    /// `min(candidate_w / w, candidate_h / h)` then scales both axes so
    /// the aspect ratio survives the gesture. Results are floored again
    /// at the minimums (a degenerate candidate becomes the floor, never
    /// an error) and clamped back on-screen.
    pub fn resized_by(&self, dw: f32, dh: f32, min: MinSize, bounds: ScreenBounds) -> Self {
        let old_w = self.width.max(1) as f64;
        let old_h = self.height.max(1) as f64;
        let candidate_w = (old_w + dw as f64).max(min.width as f64);
        let candidate_h = (old_h + dh as f64).max(min.height as f64);
        let scale = (candidate_w / old_w).min(candidate_h / old_h);
        let width = ((old_w * scale).round() as u32).max(min.width);
        let height = ((old_h * scale).round() as u32).max(min.height);
        Self {
            x: self.x,
            y: self.y,
            width,
            height,
        }
        .clamped_to(bounds)
    }

    /// Aspect ratio as width over height.
    pub fn aspect(&self) -> f64 {
        self.width.max(1) as f64 / self.height.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: ScreenBounds = ScreenBounds {
        width: 1000,
        height: 800,
    };

    #[test]
    fn drag_clamps_to_screen_edges() {
        let start = WindowGeometry::new(900, 10, 300, 200);
        let moved = start.moved_by(200.0, 5.0, BOUNDS);
        assert_eq!(moved.x, 700);
        assert_eq!(moved.y, 15);
        assert_eq!(moved.width, 300);
        assert_eq!(moved.height, 200);
    }

    #[test]
    fn drag_never_goes_negative() {
        let start = WindowGeometry::new(5, 5, 300, 200);
        let moved = start.moved_by(-50.0, -50.0, BOUNDS);
        assert_eq!((moved.x, moved.y), (0, 0));
    }

    #[test]
    fn resize_preserves_aspect_ratio() {
        let start = WindowGeometry::new(100, 100, 300, 200);
        let min = MinSize {
            width: 60,
            height: 40,
        };
        let resized = start.resized_by(90.0, 120.0, min, BOUNDS);
        // The width delta is the tighter constraint: scale = 390/300.
        assert_eq!(resized.width, 390);
        assert_eq!(resized.height, 260);
        assert!((resized.aspect() - start.aspect()).abs() < 0.01);
    }

    #[test]
    fn resize_floors_at_minimums() {
        let start = WindowGeometry::new(100, 100, 300, 200);
        let min = MinSize {
            width: 120,
            height: 80,
        };
        let resized = start.resized_by(-1000.0, -1000.0, min, BOUNDS);
        assert_eq!(resized.width, 120);
        assert_eq!(resized.height, 80);
    }

    #[test]
    fn oversized_window_is_shrunk_into_bounds() {
        let start = WindowGeometry::new(0, 0, 2000, 900);
        let clamped = start.clamped_to(BOUNDS);
        assert_eq!(clamped.width, 1000);
        assert_eq!(clamped.height, 800);
        assert_eq!((clamped.x, clamped.y), (0, 0));
    }

    #[test]
    fn resize_zone_hits_trailing_edges_only() {
        let geometry = WindowGeometry::new(100, 100, 300, 200);
        assert!(geometry.in_resize_zone(Point::new(395.0, 150.0), 20.0));
        assert!(geometry.in_resize_zone(Point::new(200.0, 295.0), 20.0));
        assert!(!geometry.in_resize_zone(Point::new(105.0, 105.0), 20.0));
        assert!(!geometry.in_resize_zone(Point::new(500.0, 150.0), 20.0));
    }
}
