//! Rapier-backed physics world for the fragment simulation.
//!
//! This is the concrete [`PhysicsAdapter`] used by the host. It owns every Rapier
//! set needed to step a 2D dynamics world and translates between the adapter's
//! schema-agnostic types ([`BodyDesc`], [`Pose`], [`CollisionStart`]) and Rapier.
//!
//! Design notes
//! - Screen space: +Y is down, so gravity is `(0, +g)`. Units are pixels; the
//!   integration `length_unit` is raised accordingly so solver tolerances stay sane.
//! - Every collider carries the body's packed [`BodyTag`] in `user_data`. Collision
//!   events are reported as tag pairs, so callers never see Rapier handles for
//!   the *other* body.
//! - Only `Started` events are buffered, and only while a subscription is active.
//! - The pointer constraint is a soft velocity drive: each step the grabbed body's
//!   velocity is set to close `stiffness` of the gap to the target.

use std::sync::{Mutex, PoisonError};

// Re-export Rapier so the host can reach Rapier types (e.g. the handle type)
// without depending on `rapier2d` directly.
pub use rapier2d;

use rapier2d::prelude::*;

use super::{
    BodyDesc, BodyShape, BodyType, CollisionGroup, CollisionStart, CollisionSubscription,
    PhysicsAdapter, PointerHandle, Pose, Vec2,
};
use crate::constants::{GRAVITY, LENGTH_UNIT, POINTER_STIFFNESS};
use crate::settings::{SimulationSettings, Viewport};
use crate::tag::BodyTag;

const BOUNDARY_GROUP: Group = Group::GROUP_1;
const FRAGMENT_GROUP: Group = Group::GROUP_2;
const ATOMIC_GROUP: Group = Group::GROUP_3;

/// Map a [`CollisionGroup`] to Rapier membership/filter bits.
///
/// Rapier lets two colliders interact when each one's memberships intersect the
/// other's filter, which reproduces [`CollisionGroup::interacts_with`].
fn interaction_groups(group: CollisionGroup) -> InteractionGroups {
    let (memberships, filter) = match group {
        CollisionGroup::Boundary => (BOUNDARY_GROUP, FRAGMENT_GROUP),
        CollisionGroup::Fragment => (FRAGMENT_GROUP, BOUNDARY_GROUP | FRAGMENT_GROUP | ATOMIC_GROUP),
        CollisionGroup::Atomic => (ATOMIC_GROUP, FRAGMENT_GROUP | ATOMIC_GROUP),
    };
    InteractionGroups::all()
        .with_memberships(memberships)
        .with_filter(filter)
}

/// Build a Rapier collider from a [`BodyDesc`].
///
/// The collider has an identity local transform; the pose lives on the parent body.
fn collider_from_desc(desc: &BodyDesc) -> Collider {
    let builder = match desc.shape {
        BodyShape::Rect { width, height } => ColliderBuilder::cuboid(width * 0.5, height * 0.5),
        BodyShape::Circle { radius } => ColliderBuilder::ball(radius),
    };

    builder
        .restitution(desc.material.restitution)
        .friction(desc.material.friction)
        .collision_groups(interaction_groups(desc.group))
        .active_events(ActiveEvents::COLLISION_EVENTS)
        .user_data(desc.tag)
        .build()
}

/// Buffers collision-start events as tag pairs during a physics step.
///
/// Rapier calls the handler through `&self` (possibly from solver threads), so
/// the buffer sits behind a mutex.
#[derive(Default)]
struct CollisionStartCollector {
    started: Mutex<Vec<CollisionStart>>,
}

impl CollisionStartCollector {
    fn take(&mut self) -> Vec<CollisionStart> {
        let started = self
            .started
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(started)
    }

    fn clear(&mut self) {
        self.take();
    }
}

impl EventHandler for CollisionStartCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        let CollisionEvent::Started(c1, c2, _) = event else {
            return;
        };

        // A collider removed mid-step reports as untagged (0); the simulation
        // filters those out as non-fragment bodies.
        let tag_of = |handle: ColliderHandle| -> BodyTag {
            colliders.get(handle).map(|c| c.user_data).unwrap_or(0)
        };

        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CollisionStart {
                a: tag_of(c1),
                b: tag_of(c2),
            });
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// State of the attached pointer constraint.
#[derive(Debug)]
struct PointerState {
    id: u64,
    bounds: Viewport,
    target: Option<Vec2>,
    grabbed: Option<RigidBodyHandle>,
}

impl PointerState {
    fn clamp(&self, target: Vec2) -> Vec2 {
        Vec2::new(
            target.x.clamp(0.0, self.bounds.width),
            target.y.clamp(0.0, self.bounds.height),
        )
    }
}

/// In-memory Rapier structures needed to step a dynamics world.
pub struct RapierWorld {
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,

    collector: CollisionStartCollector,
    subscription: Option<u64>,
    pointer: Option<PointerState>,
    pointer_stiffness: f32,
    next_token: u64,
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(GRAVITY, POINTER_STIFFNESS)
    }
}

impl RapierWorld {
    /// An empty world with downward `gravity` (px/s^2).
    pub fn new(gravity: f32, pointer_stiffness: f32) -> Self {
        Self {
            gravity: vector![0.0, gravity],
            integration_parameters: IntegrationParameters {
                length_unit: LENGTH_UNIT,
                ..IntegrationParameters::default()
            },
            physics_pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: CollisionStartCollector::default(),
            subscription: None,
            pointer: None,
            pointer_stiffness,
            next_token: 1,
        }
    }

    pub fn from_settings(settings: &SimulationSettings) -> Self {
        Self::new(settings.gravity, settings.pointer_stiffness)
    }

    fn token(&mut self) -> u64 {
        let token = self.next_token;
        self.next_token += 1;
        token
    }

    fn pointer_mut(&mut self, pointer: &PointerHandle) -> Option<&mut PointerState> {
        self.pointer.as_mut().filter(|p| p.id == pointer.id())
    }

    /// Drive the grabbed body toward the pointer target for the upcoming step.
    fn apply_pointer(&mut self, dt: f32) {
        let stiffness = self.pointer_stiffness;
        let Some(pointer) = self.pointer.as_mut() else {
            return;
        };
        let (Some(handle), Some(target)) = (pointer.grabbed, pointer.target) else {
            return;
        };
        let Some(body) = self.bodies.get_mut(handle) else {
            // The dragged body was destroyed (split or despawned).
            pointer.grabbed = None;
            return;
        };

        let position = body.translation();
        let gap = Vec2::new(target.x - position.x, target.y - position.y);
        let drive = gap * (stiffness / dt);
        body.set_linvel(vector![drive.x, drive.y], true);
    }
}

impl PhysicsAdapter for RapierWorld {
    type Handle = RigidBodyHandle;

    fn create_body(&mut self, desc: &BodyDesc) -> RigidBodyHandle {
        let builder = match desc.body_type {
            BodyType::Dynamic => RigidBodyBuilder::dynamic(),
            BodyType::Fixed => RigidBodyBuilder::fixed(),
        };

        let rb = builder
            .pose(Isometry::new(vector![desc.position.x, desc.position.y], desc.angle))
            .linvel(vector![desc.velocity.x, desc.velocity.y])
            .linear_damping(desc.material.linear_damping)
            .user_data(desc.tag)
            .build();
        let handle = self.bodies.insert(rb);

        let collider = collider_from_desc(desc);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        handle
    }

    fn destroy_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );

        if let Some(pointer) = self.pointer.as_mut() {
            if pointer.grabbed == Some(handle) {
                pointer.grabbed = None;
            }
        }
    }

    fn set_velocity(&mut self, handle: RigidBodyHandle, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.set_linvel(vector![velocity.x, velocity.y], true);
        }
    }

    fn velocity(&self, handle: RigidBodyHandle) -> Option<Vec2> {
        let v = self.bodies.get(handle)?.linvel();
        Some(Vec2::new(v.x, v.y))
    }

    fn pose(&self, handle: RigidBodyHandle) -> Option<Pose> {
        let body = self.bodies.get(handle)?;
        let t = body.translation();
        Some(Pose {
            x: t.x,
            y: t.y,
            angle: body.rotation().angle(),
        })
    }

    fn step(&mut self, dt: f32) {
        self.apply_pointer(dt);
        self.integration_parameters.dt = dt;

        // Without a subscriber there is nobody to hand events to; drop them at the source.
        let events: &dyn EventHandler = if self.subscription.is_some() {
            &self.collector
        } else {
            &()
        };

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            events,
        );
    }

    fn subscribe_collisions(&mut self) -> CollisionSubscription {
        if let Some(previous) = self.subscription {
            log::warn!("collision subscription {previous} replaced before being cancelled");
        }
        let id = self.token();
        self.subscription = Some(id);
        self.collector.clear();
        CollisionSubscription::new(id)
    }

    fn drain_collision_starts(&mut self, subscription: &CollisionSubscription) -> Vec<CollisionStart> {
        if self.subscription != Some(subscription.id()) {
            return Vec::new();
        }
        self.collector.take()
    }

    fn unsubscribe_collisions(&mut self, subscription: CollisionSubscription) {
        if self.subscription == Some(subscription.id()) {
            self.subscription = None;
            self.collector.clear();
        }
    }

    fn attach_pointer_constraint(&mut self, bounds: Viewport) -> PointerHandle {
        let id = self.token();
        self.pointer = Some(PointerState {
            id,
            bounds,
            target: None,
            grabbed: None,
        });
        PointerHandle::new(id)
    }

    fn detach_pointer_constraint(&mut self, pointer: PointerHandle) {
        if self.pointer.as_ref().is_some_and(|p| p.id == pointer.id()) {
            self.pointer = None;
        }
    }

    fn pointer_grab(&mut self, pointer: &PointerHandle, handle: RigidBodyHandle) {
        let exists = self.bodies.contains(handle);
        if let Some(state) = self.pointer_mut(pointer) {
            state.grabbed = exists.then_some(handle);
        }
    }

    fn pointer_move(&mut self, pointer: &PointerHandle, target: Vec2) {
        if let Some(state) = self.pointer_mut(pointer) {
            state.target = Some(state.clamp(target));
        }
    }

    fn pointer_release(&mut self, pointer: &PointerHandle) {
        if let Some(state) = self.pointer_mut(pointer) {
            state.grabbed = None;
            state.target = None;
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
