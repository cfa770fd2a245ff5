use std::time::Duration;

use crate::split::is_atomic;

/// Identifier of a fragment entity, unique for the lifetime of one simulation run.
pub type EntityId = u64;

/// Whether a fragment can still break apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Category {
    Normal,
    /// Exactly one character after trimming; terminal in the split hierarchy.
    Atomic,
}

impl Category {
    pub fn of(text: &str) -> Self {
        if is_atomic(text) {
            Category::Atomic
        } else {
            Category::Normal
        }
    }
}

/// A physical body carrying a text payload.
///
/// The entity is the sole owner of `body`. Whoever removes it from the
/// [`EntityStore`](crate::EntityStore) must hand the handle back to the physics
/// adapter for destruction.
#[derive(Clone, Debug)]
pub struct FragmentEntity<H> {
    pub id: EntityId,
    pub text: String,
    pub body: H,
    pub width: f32,
    pub category: Category,
    /// Splitting is disallowed while the simulation clock is before this instant.
    pub split_eligible_at: Duration,
}

impl<H> FragmentEntity<H> {
    /// Whether this entity may split at simulation time `now`.
    #[inline]
    pub fn can_split_at(&self, now: Duration) -> bool {
        self.category == Category::Normal && now >= self.split_eligible_at
    }

    #[inline]
    pub fn is_cooling_down(&self, now: Duration) -> bool {
        now < self.split_eligible_at
    }
}
