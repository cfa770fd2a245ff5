/*!
Physics adapter: the capability surface the simulation consumes from a rigid-body engine.

The simulation never integrates bodies or detects contacts itself. It asks an
adapter to create and destroy bodies, to step the world, and to report which
bodies *started* touching. Everything here is schema-agnostic: bodies are
described by [`BodyDesc`] and identified by the adapter's own `Handle` type plus
the packed [`BodyTag`] the simulation attaches to them.

- mod:          trait and plain data types
- rapier_world: the `rapier2d` implementation used by the host

Coordinates follow the screen: pixels, +Y down, angles in radians clockwise.
*/

pub mod rapier_world;

pub use rapier_world::RapierWorld;

use nalgebra as na;

use crate::settings::Viewport;
use crate::tag::BodyTag;

pub type Vec2 = na::Vector2<f32>;

/// Collider shape of a body, in local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BodyShape {
    /// Axis-aligned (before rotation) rectangle of full `width` x `height`.
    Rect { width: f32, height: f32 },
    Circle { radius: f32 },
}

/// Collision category of a body. Determines which other categories it touches.
///
/// - `Boundary` (walls, pins) touches `Fragment` only.
/// - `Fragment` touches everything.
/// - `Atomic` touches `Fragment` and `Atomic`, and falls through boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionGroup {
    Boundary,
    Fragment,
    Atomic,
}

impl CollisionGroup {
    /// Whether bodies in `self` and `other` generate contacts.
    pub fn interacts_with(self, other: CollisionGroup) -> bool {
        use CollisionGroup::*;
        match (self, other) {
            (Boundary, Boundary) => false,
            (Boundary, Atomic) | (Atomic, Boundary) => false,
            _ => true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyType {
    Dynamic,
    Fixed,
}

/// Surface response of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub linear_damping: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            restitution: 0.0,
            friction: 0.5,
            linear_damping: 0.0,
        }
    }
}

/// Everything needed to create one body.
#[derive(Clone, Copy, Debug)]
pub struct BodyDesc {
    pub shape: BodyShape,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub group: CollisionGroup,
    pub body_type: BodyType,
    pub tag: BodyTag,
    pub material: Material,
}

impl BodyDesc {
    /// A fixed body of the given shape; used for walls and pins.
    pub fn fixed(shape: BodyShape, position: Vec2, tag: BodyTag) -> Self {
        Self {
            shape,
            position,
            velocity: Vec2::zeros(),
            angle: 0.0,
            group: CollisionGroup::Boundary,
            body_type: BodyType::Fixed,
            tag,
            material: Material::default(),
        }
    }
}

/// World-space pose of a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// Two bodies started touching during the last step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionStart {
    pub a: BodyTag,
    pub b: BodyTag,
}

/// Proof of an active collision-start subscription.
///
/// Not `Clone`: exactly one owner, and giving it back through
/// [`PhysicsAdapter::unsubscribe_collisions`] ends the subscription.
#[derive(Debug, PartialEq, Eq)]
pub struct CollisionSubscription {
    id: u64,
}

impl CollisionSubscription {
    /// Adapters mint subscriptions; the simulation only holds and returns them.
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Proof of an attached pointer constraint. Not `Clone`, same contract as
/// [`CollisionSubscription`].
#[derive(Debug, PartialEq, Eq)]
pub struct PointerHandle {
    id: u64,
}

impl PointerHandle {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Capability surface of a rigid-body engine, as used by [`Simulation`](crate::Simulation).
///
/// Handles are owned by whoever created the body; destroying an unknown or
/// already-destroyed handle must be a no-op, and queries on it return `None`.
pub trait PhysicsAdapter {
    type Handle: Copy + Eq + std::fmt::Debug;

    fn create_body(&mut self, desc: &BodyDesc) -> Self::Handle;
    fn destroy_body(&mut self, handle: Self::Handle);

    fn set_velocity(&mut self, handle: Self::Handle, velocity: Vec2);
    fn velocity(&self, handle: Self::Handle) -> Option<Vec2>;
    fn pose(&self, handle: Self::Handle) -> Option<Pose>;

    /// Advance the world by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Start buffering collision-start events. Events from steps taken while no
    /// subscription is active are dropped.
    fn subscribe_collisions(&mut self) -> CollisionSubscription;
    /// Take every collision start buffered since the last drain.
    fn drain_collision_starts(&mut self, subscription: &CollisionSubscription) -> Vec<CollisionStart>;
    fn unsubscribe_collisions(&mut self, subscription: CollisionSubscription);

    /// Attach a drag constraint whose target is clamped to `bounds`.
    fn attach_pointer_constraint(&mut self, bounds: Viewport) -> PointerHandle;
    fn detach_pointer_constraint(&mut self, pointer: PointerHandle);
    /// Start dragging `handle`. Replaces any body already being dragged.
    fn pointer_grab(&mut self, pointer: &PointerHandle, handle: Self::Handle);
    fn pointer_move(&mut self, pointer: &PointerHandle, target: Vec2);
    fn pointer_release(&mut self, pointer: &PointerHandle);

    /// Number of bodies currently alive in the world.
    fn body_count(&self) -> usize;
}
