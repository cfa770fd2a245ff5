/*!
Simulation settings and viewport description.

Every field defaults to the matching constant in [`crate::constants`], so a
host only overrides what it cares about. Settings are plain data: they can be
deserialized from JSON (missing fields fall back to defaults) and must pass
[`SimulationSettings::validate`] before a simulation starts.

Notes
- Distances are in pixels, time in seconds (durations in milliseconds when
  deserialized).
- `seed = None` draws one seed from the OS at start; tests always pin it.
*/

use std::time::Duration;

use serde::Deserialize;

use crate::constants::*;

/// Size of the simulated area. The visible region spans `0..width` by `0..height`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// A viewport is usable only if both dimensions are finite and positive.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }

    /// Y beyond which a fragment counts as gone.
    #[inline]
    pub fn despawn_line(&self, margin: f32) -> f32 {
        self.height + margin
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub timestep: f32,
    #[serde(with = "millis")]
    pub split_cooldown: Duration,
    pub despawn_margin: f32,
    pub gravity: f32,
    pub char_width: f32,
    pub min_fragment_width: f32,
    pub fragment_width_inset: f32,
    pub fragment_height: f32,
    pub spawn_y: f32,
    pub spawn_stagger: f32,
    pub max_spawn_tilt: f32,
    pub split_gap: f32,
    pub split_lateral_speed: f32,
    pub split_lateral_jitter: f32,
    pub split_lift_speed: f32,
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
    pub pin_count: usize,
    pub pin_radius: f32,
    pub wall_thickness: f32,
    pub pointer_stiffness: f32,
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            timestep: FIXED_TIMESTEP,
            split_cooldown: SPLIT_COOLDOWN,
            despawn_margin: DESPAWN_MARGIN,
            gravity: GRAVITY,
            char_width: CHAR_WIDTH,
            min_fragment_width: MIN_FRAGMENT_WIDTH,
            fragment_width_inset: FRAGMENT_WIDTH_INSET,
            fragment_height: FRAGMENT_HEIGHT,
            spawn_y: SPAWN_Y,
            spawn_stagger: SPAWN_STAGGER,
            max_spawn_tilt: MAX_SPAWN_TILT,
            split_gap: SPLIT_GAP,
            split_lateral_speed: SPLIT_LATERAL_SPEED,
            split_lateral_jitter: SPLIT_LATERAL_JITTER,
            split_lift_speed: SPLIT_LIFT_SPEED,
            restitution: FRAGMENT_RESTITUTION,
            friction: FRAGMENT_FRICTION,
            linear_damping: FRAGMENT_LINEAR_DAMPING,
            pin_count: PIN_COUNT,
            pin_radius: PIN_RADIUS,
            wall_thickness: WALL_THICKNESS,
            pointer_stiffness: POINTER_STIFFNESS,
            seed: None,
        }
    }
}

impl SimulationSettings {
    /// Settings with a pinned rng seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Checks the values the tick loop relies on.
    ///
    /// Use this at the boundary (settings file, CLI) so the loop itself never
    /// has to guard against NaN timesteps or negative sizes.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err("timestep must be positive");
        }
        if self.split_cooldown.is_zero() {
            return Err("split_cooldown must be positive");
        }
        if !(self.despawn_margin.is_finite() && self.despawn_margin >= 0.0) {
            return Err("despawn_margin must be non-negative");
        }
        if !(self.char_width > 0.0 && self.min_fragment_width > 0.0 && self.fragment_height > 0.0)
        {
            return Err("fragment dimensions must be positive");
        }
        if !(self.split_gap >= 0.0) {
            return Err("split_gap must be non-negative");
        }
        if !(self.split_lateral_jitter >= 0.0) {
            return Err("split_lateral_jitter must be non-negative");
        }
        if !(self.max_spawn_tilt >= 0.0) {
            return Err("max_spawn_tilt must be non-negative");
        }
        if !(0.0..=1.0).contains(&self.pointer_stiffness) {
            return Err("pointer_stiffness must be within 0..=1");
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
