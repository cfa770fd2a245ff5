use std::time::Duration;

// Screen-space convention for everything below:
// - Units are pixels, time in seconds unless the name says otherwise.
// - +Y points down, so gravity is positive and "above the viewport" is negative Y.

/// Fixed physics timestep. Ticks are paced externally at ~60 Hz but the world
/// always integrates with this value, never with the measured frame time.
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// How long a fragment produced by a split must wait before it may split again.
pub const SPLIT_COOLDOWN: Duration = Duration::from_millis(2000);

/// Distance below the viewport bottom at which a fragment is despawned.
pub const DESPAWN_MARGIN: f32 = 200.0;

/// Downward gravity (px/s^2).
pub const GRAVITY: f32 = 300.0;

/// Rapier tolerances scale with this; one "meter" is roughly one fragment width.
pub const LENGTH_UNIT: f32 = 100.0;

/// Display width contributed by each character of a fragment.
pub const CHAR_WIDTH: f32 = 14.0;

/// Narrowest fragment body, so one-character fragments still have some mass.
pub const MIN_FRAGMENT_WIDTH: f32 = 60.0;

/// Fragments are never wider than `viewport.width - FRAGMENT_WIDTH_INSET`.
pub const FRAGMENT_WIDTH_INSET: f32 = 40.0;

/// Height of every fragment body.
pub const FRAGMENT_HEIGHT: f32 = 40.0;

/// Y of the first spawned fragment (above the top edge).
pub const SPAWN_Y: f32 = -100.0;

/// Vertical gap between consecutive initial fragments, so they arrive one by one.
pub const SPAWN_STAGGER: f32 = 400.0;

/// Maximum absolute initial tilt (radians) given to new bodies.
pub const MAX_SPAWN_TILT: f32 = 0.15;

/// Horizontal clearance left between the two children of a split. Each child's
/// center sits half its own width plus half this gap away from the parent's center.
pub const SPLIT_GAP: f32 = 10.0;

/// Base horizontal speed added to (right child) or removed from (left child)
/// the parent's velocity on split (px/s).
pub const SPLIT_LATERAL_SPEED: f32 = 120.0;

/// Upper bound of the random extra lateral speed on split (px/s).
pub const SPLIT_LATERAL_JITTER: f32 = 30.0;

/// Upward kick given to both split children (px/s).
pub const SPLIT_LIFT_SPEED: f32 = 60.0;

pub const FRAGMENT_RESTITUTION: f32 = 0.4;
pub const FRAGMENT_FRICTION: f32 = 0.5;

/// Air drag on fragments (rapier linear damping, 1/s).
pub const FRAGMENT_LINEAR_DAMPING: f32 = 1.2;

/// Number of static pins forming the "floor" the fragments break against.
pub const PIN_COUNT: usize = 20;
pub const PIN_RADIUS: f32 = 6.0;

/// Horizontal padding of the pin row on both sides.
pub const PIN_ROW_PADDING: f32 = 16.0;

/// Distance of the pin row above the viewport bottom.
pub const PIN_ROW_LIFT: f32 = 20.0;

/// Thickness of the invisible side walls placed just outside the viewport.
pub const WALL_THICKNESS: f32 = 50.0;

/// Fraction of the remaining pointer offset closed per step by a dragged fragment.
pub const POINTER_STIFFNESS: f32 = 0.2;
