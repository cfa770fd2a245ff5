/*!
Lifecycle manager: creating fragment bodies, the static boundaries, and despawning.

Creation paths
- Start of a run: one fragment per input text, staggered above the viewport so
  they arrive one after another ([`Lifecycle::spawn_initial`]).
- Split commit: two children per parent ([`Lifecycle::create_fragment`], called by
  the collision resolver).

Destruction paths
- Split commit (the resolver removes the parent).
- Leaving the viewport: [`Lifecycle::despawn_exited`] runs once per tick. The
  same pass drops an entity whose body the adapter no longer knows.

Both paths remove the entity from the store *and* destroy its body; nothing
else removes fragments.
*/

use std::time::Duration;

use rand::Rng;

use crate::constants::{PIN_ROW_LIFT, PIN_ROW_PADDING};
use crate::entity::{Category, EntityId, FragmentEntity};
use crate::physics::{
    BodyDesc, BodyShape, BodyType, CollisionGroup, Material, PhysicsAdapter, Vec2,
};
use crate::settings::{SimulationSettings, Viewport};
use crate::split::char_count;
use crate::store::EntityStore;
use crate::tag::{BodyKind, fragment_tag, pack_tag};

/// Request to create one fragment.
#[derive(Clone, Debug)]
pub struct FragmentSpawn {
    pub text: String,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Earliest simulation time at which the new fragment may split.
    pub split_eligible_at: Duration,
}

/// Spawn/despawn rules for one viewport.
#[derive(Clone, Debug)]
pub struct Lifecycle {
    viewport: Viewport,
    settings: SimulationSettings,
}

impl Lifecycle {
    pub fn new(viewport: Viewport, settings: SimulationSettings) -> Self {
        Self { viewport, settings }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Display width of a fragment: trimmed `chars * char_width`, at least the minimum
    /// width, at most `viewport.width - inset` (which wins if the two disagree).
    pub fn fragment_width(&self, text: &str) -> f32 {
        let s = &self.settings;
        let max_width = (self.viewport.width - s.fragment_width_inset).max(1.0);
        let natural = char_count(text) as f32 * s.char_width;
        natural.max(s.min_fragment_width).min(max_width)
    }

    /// Where the `index`-th initial fragment starts: random x fully inside the
    /// viewport, y above the top edge, one stagger step higher per index.
    pub fn spawn_position(&self, index: usize, width: f32, rng: &mut impl Rng) -> Vec2 {
        let span = (self.viewport.width - width).max(0.0);
        let x = rng.random_range(0.0..=span) + width * 0.5;
        let y = self.settings.spawn_y - index as f32 * self.settings.spawn_stagger;
        Vec2::new(x, y)
    }

    /// Create one fragment body and its entity, and insert it into `store`.
    pub fn create_fragment<P: PhysicsAdapter>(
        &self,
        store: &mut EntityStore<P::Handle>,
        physics: &mut P,
        spawn: FragmentSpawn,
        rng: &mut impl Rng,
    ) -> EntityId {
        let s = &self.settings;
        let id = store.allocate();
        let width = self.fragment_width(&spawn.text);
        let category = Category::of(&spawn.text);
        let tilt = s.max_spawn_tilt;

        let body = physics.create_body(&BodyDesc {
            shape: BodyShape::Rect {
                width,
                height: s.fragment_height,
            },
            position: spawn.position,
            velocity: spawn.velocity,
            angle: rng.random_range(-tilt..=tilt),
            group: match category {
                Category::Normal => CollisionGroup::Fragment,
                Category::Atomic => CollisionGroup::Atomic,
            },
            body_type: BodyType::Dynamic,
            tag: fragment_tag(id),
            material: Material {
                restitution: s.restitution,
                friction: s.friction,
                linear_damping: s.linear_damping,
            },
        });

        if let Some(displaced) = store.insert(FragmentEntity {
            id,
            text: spawn.text,
            body,
            width,
            category,
            split_eligible_at: spawn.split_eligible_at,
        }) {
            physics.destroy_body(displaced.body);
        }

        id
    }

    /// Spawn one fragment per text, in order, with staggered start heights.
    ///
    /// Blank texts are skipped (fragments must be non-empty) but still consume
    /// their stagger slot, so the arrival rhythm follows the input order.
    pub fn spawn_initial<P: PhysicsAdapter>(
        &self,
        texts: &[String],
        store: &mut EntityStore<P::Handle>,
        physics: &mut P,
        rng: &mut impl Rng,
    ) -> Vec<EntityId> {
        let mut spawned = Vec::with_capacity(texts.len());
        for (index, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                log::warn!("skipping blank initial fragment at index {index}");
                continue;
            }
            let width = self.fragment_width(text);
            let position = self.spawn_position(index, width, rng);
            let id = self.create_fragment(
                store,
                physics,
                FragmentSpawn {
                    text: text.clone(),
                    position,
                    velocity: Vec2::zeros(),
                    split_eligible_at: Duration::ZERO,
                },
                rng,
            );
            spawned.push(id);
        }
        spawned
    }

    /// Remove every fragment whose center is below `viewport.height + margin`.
    ///
    /// A fragment whose body has disappeared from the physics world is removed
    /// too, restoring the one-entity-one-body invariant.
    pub fn despawn_exited<P: PhysicsAdapter>(
        &self,
        store: &mut EntityStore<P::Handle>,
        physics: &mut P,
    ) -> Vec<EntityId> {
        let line = self.viewport.despawn_line(self.settings.despawn_margin);

        let exited: Vec<EntityId> = store
            .iter()
            .filter(|e| match physics.pose(e.body) {
                Some(pose) => pose.y > line,
                None => {
                    log::warn!("fragment {} lost its body; removing", e.id);
                    true
                }
            })
            .map(|e| e.id)
            .collect();

        for &id in &exited {
            if let Some(entity) = store.remove(id) {
                physics.destroy_body(entity.body);
            }
        }

        if !exited.is_empty() {
            log::trace!("despawned {} fragment(s): {exited:?}", exited.len());
        }
        exited
    }

    /// Create the side walls and the pin row.
    pub fn build_boundaries<P: PhysicsAdapter>(&self, physics: &mut P) -> Vec<P::Handle> {
        let Viewport { width, height } = self.viewport;
        let s = &self.settings;
        let mut handles = Vec::with_capacity(2 + s.pin_count);

        let wall = BodyShape::Rect {
            width: s.wall_thickness,
            height,
        };
        let half = s.wall_thickness * 0.5;
        for (i, x) in [-half, width + half].into_iter().enumerate() {
            handles.push(physics.create_body(&BodyDesc::fixed(
                wall,
                Vec2::new(x, height * 0.5),
                pack_tag(i as u64, BodyKind::Wall),
            )));
        }

        for (i, x) in pin_positions(width, s.pin_count).into_iter().enumerate() {
            handles.push(physics.create_body(&BodyDesc::fixed(
                BodyShape::Circle {
                    radius: s.pin_radius,
                },
                Vec2::new(x, height - PIN_ROW_LIFT),
                pack_tag(i as u64, BodyKind::Pin),
            )));
        }

        handles
    }
}

/// X coordinates of `count` pins spread evenly across the padded viewport width.
fn pin_positions(width: f32, count: usize) -> Vec<f32> {
    match count {
        0 => Vec::new(),
        1 => vec![width * 0.5],
        _ => {
            let spacing = (width - 2.0 * PIN_ROW_PADDING) / (count - 1) as f32;
            (0..count)
                .map(|i| PIN_ROW_PADDING + i as f32 * spacing)
                .collect()
        }
    }
}
