//! Spotlight openings: the draggable, resizable, lockable cutouts one
//! overlay instance manages.

mod set;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_OPENINGS, MIN_OPENING_RADIUS};
use crate::instance::InstanceId;

pub use set::{
    CommittedOpenings, OpeningError, OpeningPublisher, OpeningSubscription, OverlayOpeningSet,
};

pub type OpeningId = u32;

/// Geometric class of an opening. Circle and Square are uniform: a
/// single dimension is replicated into width, height and size. Oval and
/// Rectangle keep an independently set width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpeningShape {
    Circle,
    Square,
    Oval,
    Rectangle,
}

impl OpeningShape {
    /// The only legal direct transitions are within a pair:
    /// Circle <-> Square and Oval <-> Rectangle.
    pub fn toggled(self) -> Self {
        match self {
            OpeningShape::Circle => OpeningShape::Square,
            OpeningShape::Square => OpeningShape::Circle,
            OpeningShape::Oval => OpeningShape::Rectangle,
            OpeningShape::Rectangle => OpeningShape::Oval,
        }
    }

    pub fn is_uniform(self) -> bool {
        matches!(self, OpeningShape::Circle | OpeningShape::Square)
    }
}

/// One cutout within a spotlight-style overlay instance.
///
/// Dimension consistency per shape:
/// - uniform shapes keep `width == height == size == 2 * radius`;
/// - free shapes keep `size == max(width, height)`, and Oval also keeps
///   `radius == size / 2` for its renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opening {
    pub id: OpeningId,
    pub center_x: f32,
    pub center_y: f32,
    pub radius: f32,
    pub width: f32,
    pub height: f32,
    pub size: f32,
    pub shape: OpeningShape,
    pub locked: bool,
    pub display_order: u32,
}

impl Opening {
    /// A circular opening, the shape every instance starts with.
    pub fn circular(id: OpeningId, center_x: f32, center_y: f32, radius: f32, order: u32) -> Self {
        let radius = radius.max(MIN_OPENING_RADIUS);
        Self {
            id,
            center_x,
            center_y,
            radius,
            width: radius * 2.0,
            height: radius * 2.0,
            size: radius * 2.0,
            shape: OpeningShape::Circle,
            locked: false,
            display_order: order,
        }
    }

    /// Swap to the paired shape and recompute dimensions.
    ///
    /// Entering a uniform shape collapses width and height to their
    /// average, which keeps the covered area close to what the user had.
    /// Entering a free shape preserves the width/height pair. Toggling
    /// twice restores the original dimensions.
    pub fn toggle_shape(&mut self) {
        let next = self.shape.toggled();
        if next.is_uniform() {
            let average = (self.width + self.height) / 2.0;
            self.width = average;
            self.height = average;
            self.size = average;
            self.radius = average / 2.0;
        } else {
            self.size = self.width.max(self.height);
            if next == OpeningShape::Oval {
                self.radius = self.size / 2.0;
            }
        }
        self.shape = next;
    }

    /// Apply a resize, keeping the per-shape dimension invariants. For
    /// uniform shapes a provided radius wins; width/height fall back to
    /// governing the radius via their larger half. Free shapes update
    /// width and height independently.
    pub fn set_dimensions(&mut self, radius: Option<f32>, width: Option<f32>, height: Option<f32>) {
        let min_side = MIN_OPENING_RADIUS * 2.0;
        if self.shape.is_uniform() {
            let next_radius = radius
                .or_else(|| width.zip(height).map(|(w, h)| w.max(h) / 2.0))
                .or(width.map(|w| w / 2.0))
                .or(height.map(|h| h / 2.0));
            let Some(next_radius) = next_radius else {
                return;
            };
            self.radius = next_radius.max(MIN_OPENING_RADIUS);
            self.width = self.radius * 2.0;
            self.height = self.radius * 2.0;
            self.size = self.radius * 2.0;
        } else {
            if let Some(width) = width {
                self.width = width.max(min_side);
            }
            if let Some(height) = height {
                self.height = height.max(min_side);
            }
            self.size = self.width.max(self.height);
            if self.shape == OpeningShape::Oval {
                self.radius = self.size / 2.0;
            }
        }
    }
}

/// Reactive projection of one instance's opening collection, recomputed
/// deterministically on every commit. Never a source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayUiState {
    pub instance: InstanceId,
    pub openings: Vec<Opening>,
    pub is_any_locked: bool,
    pub are_all_locked: bool,
    pub can_add_more: bool,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl OverlayUiState {
    pub fn project(
        instance: InstanceId,
        openings: &[Opening],
        is_loading: bool,
        error: Option<String>,
    ) -> Self {
        Self {
            instance,
            openings: openings.to_vec(),
            is_any_locked: openings.iter().any(|opening| opening.locked),
            are_all_locked: !openings.is_empty() && openings.iter().all(|opening| opening.locked),
            can_add_more: openings.len() < MAX_OPENINGS,
            is_loading,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_to_square_and_back_is_lossless() {
        let mut opening = Opening::circular(1, 400.0, 300.0, 125.0, 0);
        opening.toggle_shape();
        assert_eq!(opening.shape, OpeningShape::Square);
        assert_eq!(opening.width, 250.0);
        assert_eq!(opening.height, 250.0);
        assert_eq!(opening.size, 250.0);
        assert_eq!(opening.radius, 125.0);

        opening.toggle_shape();
        assert_eq!(opening.shape, OpeningShape::Circle);
        assert_eq!(opening.width, 250.0);
        assert_eq!(opening.height, 250.0);
        assert_eq!(opening.radius, 125.0);
    }

    #[test]
    fn rectangle_to_oval_keeps_width_height_and_sets_radius() {
        let mut opening = Opening::circular(1, 0.0, 0.0, 100.0, 0);
        opening.shape = OpeningShape::Rectangle;
        opening.set_dimensions(None, Some(300.0), Some(180.0));
        assert_eq!(opening.size, 300.0);

        opening.toggle_shape();
        assert_eq!(opening.shape, OpeningShape::Oval);
        assert_eq!(opening.width, 300.0);
        assert_eq!(opening.height, 180.0);
        assert_eq!(opening.radius, 150.0);

        opening.toggle_shape();
        assert_eq!(opening.shape, OpeningShape::Rectangle);
        assert_eq!(opening.width, 300.0);
        assert_eq!(opening.height, 180.0);
    }

    #[test]
    fn uniform_resize_floors_at_minimum_radius() {
        let mut opening = Opening::circular(1, 0.0, 0.0, 125.0, 0);
        opening.set_dimensions(Some(4.0), None, None);
        assert_eq!(opening.radius, MIN_OPENING_RADIUS);
        assert_eq!(opening.width, MIN_OPENING_RADIUS * 2.0);
        assert_eq!(opening.height, opening.width);
    }

    #[test]
    fn free_resize_updates_axes_independently() {
        let mut opening = Opening::circular(1, 0.0, 0.0, 100.0, 0);
        opening.toggle_shape(); // Square
        opening.shape = OpeningShape::Rectangle;
        opening.set_dimensions(None, Some(320.0), None);
        assert_eq!(opening.width, 320.0);
        assert_eq!(opening.height, 200.0);
        assert_eq!(opening.size, 320.0);
    }

    #[test]
    fn ui_state_aggregates_lock_flags() {
        let mut first = Opening::circular(1, 0.0, 0.0, 50.0, 0);
        let second = Opening::circular(2, 0.0, 0.0, 50.0, 1);
        first.locked = true;

        let state = OverlayUiState::project(7, &[first.clone(), second.clone()], false, None);
        assert!(state.is_any_locked);
        assert!(!state.are_all_locked);
        assert!(state.can_add_more);

        let mut second = second;
        second.locked = true;
        let state = OverlayUiState::project(7, &[first, second], false, None);
        assert!(state.are_all_locked);
    }
}
