//! Shared crate-wide constants.

/// Width of the resize band along a window's trailing (right and bottom)
/// edges, in density-independent pixels.
///
/// A touch-down inside this band starts a resize gesture; anywhere else
/// on the draggable surface starts a move. The value is multiplied by the
/// controller's density factor to get device pixels, so the band stays a
/// comfortable fingertip target on any screen.
pub const RESIZE_ZONE_DP: f32 = 20.0;

/// Jitter threshold for drag and resize gestures, in density-independent
/// pixels.
///
/// Pointer deltas smaller than this in both axes are ignored until the
/// gesture engages, so a shaky tap never moves a window or reaches the
/// store. Units: dp; multiplied by the density factor before comparison.
pub const MOVE_THRESHOLD_DP: f32 = 10.0;

/// Maximum number of openings a single spotlight-style instance may hold.
pub const MAX_OPENINGS: usize = 5;

/// Radius, in device pixels, of the single opening seeded when an
/// instance starts with no persisted openings.
pub const DEFAULT_OPENING_RADIUS: f32 = 125.0;

/// Smallest radius an opening may be resized to. Uniform shapes floor
/// their radius here; free shapes floor width and height at twice this.
pub const MIN_OPENING_RADIUS: f32 = 25.0;

/// Offset, in device pixels, applied per existing opening when a new one
/// is added, so successive openings never stack exactly on top of each
/// other.
pub const OPENING_STAGGER_PX: f32 = 50.0;

/// Number of background commit workers. Commits for one instance always
/// land on the same worker, so this bounds cross-instance write
/// concurrency, not per-instance ordering.
pub const COMMIT_LANES: usize = 4;
