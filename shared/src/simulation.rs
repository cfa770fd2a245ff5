/*!
The fragmentation simulation: one owner for the store, the resolver, the physics
adapter and every resource acquired from it.

Tick pipeline (see [`Simulation::tick`])
1. step the physics world by the fixed timestep and advance the clock
2. drain collision starts from the subscription
3. resolve them (split commits)
4. despawn fragments that left the viewport
5. project the live fragments into the snapshot buffer

Resource discipline
- [`Simulation::start`] acquires the collision subscription, the pointer constraint,
  the boundary bodies and one body per initial fragment.
- [`Simulation::teardown`] gives all of them back. It is idempotent and also runs
  from `Drop`, so an early return or a panic unwinding through the host still
  releases everything.
*/

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::entity::{EntityId, FragmentEntity};
use crate::error::{Result, SimulationError};
use crate::lifecycle::Lifecycle;
use crate::physics::{CollisionSubscription, PhysicsAdapter, PointerHandle, Vec2};
use crate::resolver::{CollisionResolver, ResolveReport};
use crate::settings::{SimulationSettings, Viewport};
use crate::snapshot::{FragmentView, project};
use crate::store::EntityStore;

/// What happened during the most recent tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub resolve: ResolveReport,
    pub despawned: Vec<EntityId>,
}

pub struct Simulation<P: PhysicsAdapter> {
    physics: P,
    lifecycle: Lifecycle,
    store: EntityStore<P::Handle>,
    resolver: CollisionResolver,
    boundaries: Vec<P::Handle>,
    subscription: Option<CollisionSubscription>,
    pointer: Option<PointerHandle>,
    rng: StdRng,
    seed: u64,
    tick: u64,
    clock: Duration,
    snapshot: Vec<FragmentView>,
    last_report: TickReport,
    torn_down: bool,
}

fn check_start(viewport: Viewport, settings: &SimulationSettings) -> Result<()> {
    settings
        .validate()
        .map_err(SimulationError::InvalidSettings)?;
    if viewport.is_empty() {
        return Err(SimulationError::EmptyViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }
    Ok(())
}

impl<P: PhysicsAdapter> Simulation<P> {
    /// Build the world and spawn one fragment per text.
    ///
    /// Fails without spawning anything when the viewport has no area or the
    /// settings are invalid. An empty `texts` list is fine: the simulation
    /// simply idles.
    pub fn start(
        physics: P,
        texts: &[String],
        viewport: Viewport,
        settings: SimulationSettings,
    ) -> Result<Self> {
        check_start(viewport, &settings)?;

        let seed = settings.seed.unwrap_or_else(rand::random);
        let mut sim = Self {
            physics,
            lifecycle: Lifecycle::new(viewport, settings),
            store: EntityStore::new(),
            resolver: CollisionResolver::new(),
            boundaries: Vec::new(),
            subscription: None,
            pointer: None,
            rng: StdRng::seed_from_u64(seed),
            seed,
            tick: 0,
            clock: Duration::ZERO,
            snapshot: Vec::new(),
            last_report: TickReport::default(),
            torn_down: true,
        };
        sim.setup(texts);
        Ok(sim)
    }

    fn setup(&mut self, texts: &[String]) {
        self.torn_down = false;
        self.subscription = Some(self.physics.subscribe_collisions());
        self.pointer = Some(
            self.physics
                .attach_pointer_constraint(self.lifecycle.viewport()),
        );
        self.boundaries = self.lifecycle.build_boundaries(&mut self.physics);

        let spawned =
            self.lifecycle
                .spawn_initial(texts, &mut self.store, &mut self.physics, &mut self.rng);

        project(&self.store, &self.physics, &mut self.snapshot);

        let viewport = self.lifecycle.viewport();
        log::info!(
            "simulation started: {} fragment(s), viewport {}x{}, seed {}",
            spawned.len(),
            viewport.width,
            viewport.height,
            self.seed
        );
    }

    /// Tear down and start over with new texts and viewport. Ids restart at zero
    /// and the clock at zero; the rng continues from its current state.
    ///
    /// On error the simulation stays torn down.
    pub fn restart(
        &mut self,
        texts: &[String],
        viewport: Viewport,
    ) -> Result<()> {
        self.teardown();
        let settings = self.lifecycle.settings().clone();
        check_start(viewport, &settings)?;

        self.lifecycle = Lifecycle::new(viewport, settings);
        self.store = EntityStore::new();
        self.resolver = CollisionResolver::new();
        self.tick = 0;
        self.clock = Duration::ZERO;
        self.last_report = TickReport::default();
        self.setup(texts);
        Ok(())
    }

    /// Advance one fixed timestep and return the fresh snapshot.
    ///
    /// The returned slice borrows the simulation, so it cannot outlive the next
    /// tick. After teardown this is a no-op returning an empty slice.
    pub fn tick(&mut self) -> &[FragmentView] {
        if self.torn_down {
            self.snapshot.clear();
            return &self.snapshot;
        }

        let dt = self.lifecycle.settings().timestep;
        self.physics.step(dt);
        self.tick += 1;
        self.clock = Duration::from_secs_f64(self.tick as f64 * f64::from(dt));

        let starts = match &self.subscription {
            Some(subscription) => self.physics.drain_collision_starts(subscription),
            None => Vec::new(),
        };

        let resolve = self.resolver.resolve(
            &starts,
            self.clock,
            &mut self.store,
            &mut self.physics,
            &self.lifecycle,
            &mut self.rng,
        );

        let despawned = self
            .lifecycle
            .despawn_exited(&mut self.store, &mut self.physics);

        project(&self.store, &self.physics, &mut self.snapshot);

        if resolve.splits > 0 || !despawned.is_empty() {
            log::debug!(
                "tick {}: {} split(s), {} despawned, {} live",
                self.tick,
                resolve.splits,
                despawned.len(),
                self.store.len()
            );
        }

        self.last_report = TickReport {
            tick: self.tick,
            resolve,
            despawned,
        };
        &self.snapshot
    }

    /// Release everything acquired from the physics adapter.
    ///
    /// Order: cancel the collision subscription, destroy every fragment body, the
    /// boundary bodies, then the pointer constraint. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(subscription) = self.subscription.take() {
            self.physics.unsubscribe_collisions(subscription);
        }

        let fragments = self.store.drain();
        let fragment_count = fragments.len();
        for entity in fragments {
            self.physics.destroy_body(entity.body);
        }

        for handle in self.boundaries.drain(..) {
            self.physics.destroy_body(handle);
        }

        if let Some(pointer) = self.pointer.take() {
            self.physics.detach_pointer_constraint(pointer);
        }

        self.snapshot.clear();
        log::info!(
            "simulation torn down after {} tick(s); released {fragment_count} fragment(s)",
            self.tick
        );
    }

    /// Start dragging a fragment. Returns false if `id` is not live.
    pub fn pointer_grab(&mut self, id: EntityId) -> bool {
        let (Some(pointer), Some(entity)) = (&self.pointer, self.store.get(id)) else {
            return false;
        };
        self.physics.pointer_grab(pointer, entity.body);
        true
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if let Some(pointer) = &self.pointer {
            self.physics.pointer_move(pointer, Vec2::new(x, y));
        }
    }

    pub fn pointer_release(&mut self) {
        if let Some(pointer) = &self.pointer {
            self.physics.pointer_release(pointer);
        }
    }

    /// The snapshot produced by the latest tick (or by start).
    pub fn snapshot(&self) -> &[FragmentView] {
        &self.snapshot
    }

    pub fn last_report(&self) -> &TickReport {
        &self.last_report
    }

    /// Simulation time elapsed since start.
    pub fn now(&self) -> Duration {
        self.clock
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn viewport(&self) -> Viewport {
        self.lifecycle.viewport()
    }

    pub fn settings(&self) -> &SimulationSettings {
        self.lifecycle.settings()
    }

    pub fn entity(&self, id: EntityId) -> Option<&FragmentEntity<P::Handle>> {
        self.store.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &FragmentEntity<P::Handle>> {
        self.store.iter()
    }

    /// Number of live fragments.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    /// Mutable access to the adapter, e.g. for tests that script poses.
    /// Bodies owned by the simulation must not be destroyed through it.
    pub fn physics_mut(&mut self) -> &mut P {
        &mut self.physics
    }
}

impl<P: PhysicsAdapter> Drop for Simulation<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
