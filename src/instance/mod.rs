//! Feature kinds and per-kind instance bookkeeping.

mod pool;
mod recovery;

use serde::{Deserialize, Serialize};

use crate::geometry::{MinSize, ScreenBounds, WindowGeometry};

pub use pool::{InstanceIdPool, PoolError};
pub use recovery::RecoveryCoordinator;

/// Identifier of one running occurrence of a feature, unique within its
/// kind. Ids start at 1 and the smallest free id is always reused first.
pub type InstanceId = u32;

/// The overlay widget families the engine hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Clock,
    Timer,
    Randomizer,
    ScreenMask,
    Spotlight,
    TrafficLight,
    Probability,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 7] = [
        FeatureKind::Clock,
        FeatureKind::Timer,
        FeatureKind::Randomizer,
        FeatureKind::ScreenMask,
        FeatureKind::Spotlight,
        FeatureKind::TrafficLight,
        FeatureKind::Probability,
    ];

    /// Maximum number of simultaneously open windows of this kind.
    pub fn max_instances(self) -> usize {
        match self {
            FeatureKind::Timer => 7,
            _ => 4,
        }
    }

    /// Smallest window size the kind's content stays legible at.
    pub fn min_window_size(self) -> MinSize {
        match self {
            FeatureKind::Clock | FeatureKind::Timer => MinSize {
                width: 160,
                height: 120,
            },
            FeatureKind::Randomizer | FeatureKind::Probability => MinSize {
                width: 180,
                height: 160,
            },
            FeatureKind::ScreenMask => MinSize {
                width: 200,
                height: 150,
            },
            FeatureKind::Spotlight => MinSize {
                width: 240,
                height: 180,
            },
            FeatureKind::TrafficLight => MinSize {
                width: 120,
                height: 260,
            },
        }
    }

    /// Launch geometry used when no persisted state exists: a kind-sized
    /// window centered on the screen.
    pub fn default_geometry(self, bounds: ScreenBounds) -> WindowGeometry {
        let (width, height) = match self {
            FeatureKind::Clock => (420, 280),
            FeatureKind::Timer => (380, 240),
            FeatureKind::Randomizer => (360, 300),
            FeatureKind::ScreenMask => (480, 360),
            FeatureKind::Spotlight => (640, 480),
            FeatureKind::TrafficLight => (160, 420),
            FeatureKind::Probability => (320, 320),
        };
        WindowGeometry::centered(width, height, bounds).clamped_to(bounds)
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureKind::Clock => "clock",
            FeatureKind::Timer => "timer",
            FeatureKind::Randomizer => "randomizer",
            FeatureKind::ScreenMask => "screen_mask",
            FeatureKind::Spotlight => "spotlight",
            FeatureKind::TrafficLight => "traffic_light",
            FeatureKind::Probability => "probability",
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
