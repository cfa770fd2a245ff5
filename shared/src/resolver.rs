/*!
Collision resolver: turns one tick's collision starts into split commits.

Per tick
1. Collect: the caller drains the adapter's collision starts for the tick.
2. Filter: drop pairs touching a non-fragment body (walls, pins, untagged), pairs
   whose ids are not live, and pairs with a member already scheduled to split
   this tick (it is as good as removed).
3. Dedupe: an order-independent [`PairKey`] is resolved at most once per tick.
   The key set lives only for the duration of one [`CollisionResolver::resolve`].
4. Decide: each member independently splits if it is off cooldown, not atomic,
   and [`try_split`] yields two halves. Both members may split (four children).
5. Commit: every scheduled parent is removed (body destroyed) before any child is
   created; children inherit the parent's velocity plus an outward lateral bias
   and a small lift, sit side by side with `split_gap` px of clearance between
   them (the split line stays at the parent's center), and start a cooldown.
*/

use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;

use crate::entity::EntityId;
use crate::lifecycle::{FragmentSpawn, Lifecycle};
use crate::physics::{CollisionStart, PhysicsAdapter, Vec2};
use crate::split::try_split;
use crate::store::EntityStore;
use crate::tag::fragment_id;

/// Order-independent identifier of a colliding pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PairKey(EntityId, EntityId);

impl PairKey {
    pub fn new(a: EntityId, b: EntityId) -> Self {
        if a <= b { PairKey(a, b) } else { PairKey(b, a) }
    }
}

/// A parent scheduled to split, with its two halves.
#[derive(Clone, Debug)]
struct SplitPlan {
    parent: EntityId,
    left: String,
    right: String,
}

/// What one resolve pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Collision starts handed to the resolver.
    pub pairs_seen: usize,
    /// Distinct live fragment pairs that reached the decide step.
    pub pairs_resolved: usize,
    /// Parents replaced by two children.
    pub splits: usize,
    /// Ids of the children created, in creation order.
    pub spawned: Vec<EntityId>,
}

#[derive(Debug, Default)]
pub struct CollisionResolver {
    seen: HashSet<PairKey>,
}

impl CollisionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one tick's collision starts at simulation time `now`.
    pub fn resolve<P: PhysicsAdapter>(
        &mut self,
        starts: &[CollisionStart],
        now: Duration,
        store: &mut EntityStore<P::Handle>,
        physics: &mut P,
        lifecycle: &Lifecycle,
        rng: &mut impl Rng,
    ) -> ResolveReport {
        self.seen.clear();

        let mut report = ResolveReport {
            pairs_seen: starts.len(),
            ..ResolveReport::default()
        };
        let mut scheduled: HashSet<EntityId> = HashSet::new();
        let mut plans: Vec<SplitPlan> = Vec::new();

        for start in starts {
            let (Some(a), Some(b)) = (fragment_id(start.a), fragment_id(start.b)) else {
                continue;
            };
            if a == b {
                continue;
            }
            let live = |id| store.contains(id) && !scheduled.contains(&id);
            if !live(a) || !live(b) {
                log::trace!("discarding collision ({a}, {b}): not live");
                continue;
            }
            if !self.seen.insert(PairKey::new(a, b)) {
                continue;
            }
            report.pairs_resolved += 1;

            for id in [a, b] {
                let Some(entity) = store.get(id) else {
                    continue;
                };
                if !entity.can_split_at(now) {
                    continue;
                }
                if let Some((left, right)) = try_split(&entity.text) {
                    scheduled.insert(id);
                    plans.push(SplitPlan {
                        parent: id,
                        left,
                        right,
                    });
                }
            }
        }

        self.seen.clear();

        if !plans.is_empty() {
            report.spawned = Self::commit(plans, now, store, physics, lifecycle, rng);
            report.splits = report.spawned.len() / 2;
        }
        report
    }

    /// Remove every planned parent, then create every child.
    fn commit<P: PhysicsAdapter>(
        plans: Vec<SplitPlan>,
        now: Duration,
        store: &mut EntityStore<P::Handle>,
        physics: &mut P,
        lifecycle: &Lifecycle,
        rng: &mut impl Rng,
    ) -> Vec<EntityId> {
        let settings = lifecycle.settings();
        let eligible_at = now + settings.split_cooldown;
        let mut births: Vec<FragmentSpawn> = Vec::with_capacity(plans.len() * 2);

        for plan in plans {
            let Some(parent) = store.remove(plan.parent) else {
                continue;
            };
            let pose = physics.pose(parent.body);
            let velocity = physics.velocity(parent.body).unwrap_or_else(Vec2::zeros);
            physics.destroy_body(parent.body);

            let Some(pose) = pose else {
                log::warn!("fragment {} had no body at split; dropping it", parent.id);
                continue;
            };

            let lateral = settings.split_lateral_speed
                + rng.random_range(0.0..=settings.split_lateral_jitter);
            let lift = settings.split_lift_speed;
            let half_gap = settings.split_gap * 0.5;
            let left_offset = lifecycle.fragment_width(&plan.left) * 0.5 + half_gap;
            let right_offset = lifecycle.fragment_width(&plan.right) * 0.5 + half_gap;

            log::debug!(
                "split {} {:?} -> {:?} + {:?}",
                parent.id,
                parent.text,
                plan.left,
                plan.right
            );

            births.push(FragmentSpawn {
                text: plan.left,
                position: Vec2::new(pose.x - left_offset, pose.y),
                velocity: Vec2::new(velocity.x - lateral, velocity.y - lift),
                split_eligible_at: eligible_at,
            });
            births.push(FragmentSpawn {
                text: plan.right,
                position: Vec2::new(pose.x + right_offset, pose.y),
                velocity: Vec2::new(velocity.x + lateral, velocity.y - lift),
                split_eligible_at: eligible_at,
            });
        }

        births
            .into_iter()
            .map(|spawn| lifecycle.create_fragment(store, physics, spawn, rng))
            .collect()
    }
}
