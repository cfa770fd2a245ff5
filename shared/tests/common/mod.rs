//! Scripted physics adapter for deterministic simulation tests.
//!
//! Bodies are plain records with Euler-integrated motion (optional gravity, no
//! contacts). Collisions never happen on their own: a test queues collision
//! starts, and they are delivered by the next `step`, exactly like a real
//! engine reporting contacts that began during that step.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use fragfall_shared::physics::{
    BodyDesc, CollisionStart, CollisionSubscription, PhysicsAdapter, PointerHandle, Pose, Vec2,
};
use fragfall_shared::settings::Viewport;
use fragfall_shared::tag::BodyTag;

/// Resource counters that stay readable after the adapter has been moved into
/// (and dropped with) a simulation.
#[derive(Debug, Default)]
pub struct ProbeState {
    pub live_bodies: usize,
    pub created: usize,
    pub destroyed: usize,
    pub subscribed: bool,
    pub pointer_attached: bool,
}

pub type Probe = Rc<RefCell<ProbeState>>;

#[derive(Clone, Debug)]
pub struct ScriptedBody {
    pub desc: BodyDesc,
    pub pose: Pose,
    pub velocity: Vec2,
}

#[derive(Default)]
pub struct ScriptedPhysics {
    bodies: BTreeMap<u64, ScriptedBody>,
    next_handle: u64,
    next_token: u64,
    gravity: f32,
    queued: Vec<CollisionStart>,
    delivered: Vec<CollisionStart>,
    subscription: Option<u64>,
    pointer: Option<u64>,
    grabbed: Option<u64>,
    probe: Probe,
}

impl ScriptedPhysics {
    pub fn new() -> Self {
        Self {
            next_token: 1,
            ..Self::default()
        }
    }

    pub fn with_gravity(gravity: f32) -> Self {
        Self {
            gravity,
            ..Self::new()
        }
    }

    pub fn probe(&self) -> Probe {
        Rc::clone(&self.probe)
    }

    /// Queue a collision start to be reported by the next step.
    pub fn queue_collision(&mut self, a: BodyTag, b: BodyTag) {
        self.queued.push(CollisionStart { a, b });
    }

    pub fn set_y(&mut self, handle: u64, y: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pose.y = y;
        }
    }

    pub fn set_pose(&mut self, handle: u64, x: f32, y: f32) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.pose.x = x;
            body.pose.y = y;
        }
    }

    pub fn body(&self, handle: u64) -> Option<&ScriptedBody> {
        self.bodies.get(&handle)
    }

    pub fn grabbed(&self) -> Option<u64> {
        self.grabbed
    }
}

impl PhysicsAdapter for ScriptedPhysics {
    type Handle = u64;

    fn create_body(&mut self, desc: &BodyDesc) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.bodies.insert(
            handle,
            ScriptedBody {
                desc: *desc,
                pose: Pose {
                    x: desc.position.x,
                    y: desc.position.y,
                    angle: desc.angle,
                },
                velocity: desc.velocity,
            },
        );
        let mut probe = self.probe.borrow_mut();
        probe.live_bodies += 1;
        probe.created += 1;
        handle
    }

    fn destroy_body(&mut self, handle: u64) {
        if self.bodies.remove(&handle).is_some() {
            let mut probe = self.probe.borrow_mut();
            probe.live_bodies -= 1;
            probe.destroyed += 1;
        }
        if self.grabbed == Some(handle) {
            self.grabbed = None;
        }
    }

    fn set_velocity(&mut self, handle: u64, velocity: Vec2) {
        if let Some(body) = self.bodies.get_mut(&handle) {
            body.velocity = velocity;
        }
    }

    fn velocity(&self, handle: u64) -> Option<Vec2> {
        self.bodies.get(&handle).map(|b| b.velocity)
    }

    fn pose(&self, handle: u64) -> Option<Pose> {
        self.bodies.get(&handle).map(|b| b.pose)
    }

    fn step(&mut self, dt: f32) {
        for body in self.bodies.values_mut() {
            if body.desc.body_type == fragfall_shared::physics::BodyType::Fixed {
                continue;
            }
            body.velocity.y += self.gravity * dt;
            body.pose.x += body.velocity.x * dt;
            body.pose.y += body.velocity.y * dt;
        }

        let queued = std::mem::take(&mut self.queued);
        if self.subscription.is_some() {
            self.delivered.extend(queued);
        }
    }

    fn subscribe_collisions(&mut self) -> CollisionSubscription {
        let id = self.next_token;
        self.next_token += 1;
        self.subscription = Some(id);
        self.probe.borrow_mut().subscribed = true;
        CollisionSubscription::new(id)
    }

    fn drain_collision_starts(&mut self, subscription: &CollisionSubscription) -> Vec<CollisionStart> {
        if self.subscription != Some(subscription.id()) {
            return Vec::new();
        }
        std::mem::take(&mut self.delivered)
    }

    fn unsubscribe_collisions(&mut self, subscription: CollisionSubscription) {
        if self.subscription == Some(subscription.id()) {
            self.subscription = None;
            self.delivered.clear();
            self.probe.borrow_mut().subscribed = false;
        }
    }

    fn attach_pointer_constraint(&mut self, _bounds: Viewport) -> PointerHandle {
        let id = self.next_token;
        self.next_token += 1;
        self.pointer = Some(id);
        self.probe.borrow_mut().pointer_attached = true;
        PointerHandle::new(id)
    }

    fn detach_pointer_constraint(&mut self, pointer: PointerHandle) {
        if self.pointer == Some(pointer.id()) {
            self.pointer = None;
            self.grabbed = None;
            self.probe.borrow_mut().pointer_attached = false;
        }
    }

    fn pointer_grab(&mut self, pointer: &PointerHandle, handle: u64) {
        if self.pointer == Some(pointer.id()) && self.bodies.contains_key(&handle) {
            self.grabbed = Some(handle);
        }
    }

    fn pointer_move(&mut self, _pointer: &PointerHandle, _target: Vec2) {}

    fn pointer_release(&mut self, pointer: &PointerHandle) {
        if self.pointer == Some(pointer.id()) {
            self.grabbed = None;
        }
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

pub fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn viewport() -> Viewport {
    Viewport::new(800.0, 600.0)
}
