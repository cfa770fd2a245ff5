mod common;

use std::collections::HashSet;
use std::time::Duration;

use common::{ScriptedPhysics, texts, viewport};
use fragfall_shared::tag::{BodyKind, fragment_tag, pack_tag};
use fragfall_shared::{
    Category, PhysicsAdapter, Simulation, SimulationError, SimulationSettings, Viewport,
};

fn start(items: &[&str]) -> Simulation<ScriptedPhysics> {
    Simulation::start(
        ScriptedPhysics::new(),
        &texts(items),
        viewport(),
        SimulationSettings::seeded(7),
    )
    .expect("valid viewport")
}

fn collide(sim: &mut Simulation<ScriptedPhysics>, a: u64, b: u64) {
    sim.physics_mut()
        .queue_collision(fragment_tag(a), fragment_tag(b));
}

fn body_of(sim: &Simulation<ScriptedPhysics>, id: u64) -> u64 {
    sim.entity(id).expect("live entity").body
}

#[test]
fn two_char_fragment_splits_into_atomic_children_that_never_split_again() {
    let mut sim = start(&["AB", "x"]);
    assert_eq!(sim.entity(0).unwrap().category, Category::Normal);
    assert_eq!(sim.entity(1).unwrap().category, Category::Atomic);

    collide(&mut sim, 0, 1);
    sim.tick();

    let report = sim.last_report().resolve.clone();
    assert_eq!(report.splits, 1);
    assert_eq!(report.spawned, vec![2, 3]);
    assert!(sim.entity(0).is_none());

    let now = sim.now();
    let cooldown = sim.settings().split_cooldown;
    for (id, text) in [(2, "A"), (3, "B")] {
        let child = sim.entity(id).unwrap();
        assert_eq!(child.text, text);
        assert_eq!(child.category, Category::Atomic);
        assert_eq!(child.split_eligible_at, now + cooldown);
        assert!(child.split_eligible_at > now);
    }

    // During the cooldown and long after it, atomic children stay whole.
    for _ in 0..3 {
        collide(&mut sim, 2, 3);
        collide(&mut sim, 2, 1);
        sim.tick();
        assert_eq!(sim.last_report().resolve.splits, 0);
    }
    for _ in 0..150 {
        sim.tick();
    }
    assert!(sim.now() > now + cooldown);
    collide(&mut sim, 2, 3);
    sim.tick();
    assert_eq!(sim.last_report().resolve.splits, 0);
    assert_eq!(sim.len(), 3);
}

#[test]
fn empty_input_idles_with_empty_snapshots() {
    let mut sim = start(&[]);
    assert!(sim.is_empty());

    for _ in 0..120 {
        assert!(sim.tick().is_empty());
    }
    assert_eq!(sim.len(), 0);
    assert_eq!(sim.tick_count(), 120);
}

#[test]
fn blank_initial_texts_are_skipped() {
    let sim = start(&["   ", "hello"]);

    assert_eq!(sim.len(), 1);
    let only = sim.entities().next().unwrap();
    assert_eq!(only.text, "hello");
    // The blank text still consumed the first stagger slot.
    assert_eq!(sim.snapshot()[0].y, -500.0);
}

#[test]
fn duplicate_pair_in_one_tick_is_resolved_once() {
    let mut sim = start(&["hello", "x"]);

    collide(&mut sim, 0, 1);
    collide(&mut sim, 1, 0);
    collide(&mut sim, 0, 1);
    sim.tick();

    let report = &sim.last_report().resolve;
    assert_eq!(report.pairs_seen, 3);
    assert_eq!(report.pairs_resolved, 1);
    assert_eq!(report.splits, 1);
    assert_eq!(report.spawned.len(), 2);
    assert_eq!(sim.len(), 3);
}

#[test]
fn dedupe_set_does_not_leak_into_the_next_tick() {
    let mut sim = start(&["abcdefgh", "ijklmnop"]);
    let cooldown_ticks = 2 * 60 + 1;

    collide(&mut sim, 0, 1);
    sim.tick();
    assert_eq!(sim.last_report().resolve.pairs_resolved, 1);

    // Children 2..=5 exist now; after their cooldown the same key (2, 4) is
    // resolved again on a later tick.
    for _ in 0..cooldown_ticks {
        sim.tick();
    }
    collide(&mut sim, 2, 4);
    sim.tick();
    assert_eq!(sim.last_report().resolve.pairs_resolved, 1);
    assert_eq!(sim.last_report().resolve.splits, 2);
}

#[test]
fn both_eligible_members_split_in_one_commit() {
    let mut sim = start(&["hello", "world"]);

    collide(&mut sim, 0, 1);
    sim.tick();

    let report = &sim.last_report().resolve;
    assert_eq!(report.splits, 2);
    assert_eq!(report.spawned, vec![2, 3, 4, 5]);

    let texts: Vec<_> = report
        .spawned
        .iter()
        .map(|&id| sim.entity(id).unwrap().text.clone())
        .collect();
    assert_eq!(texts, vec!["he", "llo", "wo", "rld"]);
}

#[test]
fn children_are_offset_and_diverge_from_the_parent() {
    let mut sim = start(&["hello", "x"]);
    let parent = body_of(&sim, 0);
    sim.physics_mut().set_pose(parent, 400.0, 300.0);

    collide(&mut sim, 0, 1);
    sim.tick();

    let settings = sim.settings().clone();
    let left = sim.physics().body(body_of(&sim, 2)).unwrap().clone();
    let right = sim.physics().body(body_of(&sim, 3)).unwrap().clone();

    let (wl, wr) = (sim.entity(2).unwrap().width, sim.entity(3).unwrap().width);
    assert!(left.desc.position.x < 400.0 && right.desc.position.x > 400.0);
    let gap = (right.desc.position.x - wr / 2.0) - (left.desc.position.x + wl / 2.0);
    assert!((gap - settings.split_gap).abs() < 1e-3, "gap = {gap}");
    assert_eq!(left.desc.position.y, 300.0);
    assert!(left.velocity.x <= -settings.split_lateral_speed);
    assert!(right.velocity.x >= settings.split_lateral_speed);
    assert_eq!(left.velocity.y, -settings.split_lift_speed);
    assert_eq!(left.velocity.x, -right.velocity.x);
}

#[test]
fn wide_children_are_placed_without_overlap() {
    let mut sim = start(&["abcdefghijkl", "x"]);
    let parent = body_of(&sim, 0);
    sim.physics_mut().set_pose(parent, 347.3, 200.0);

    collide(&mut sim, 0, 1);
    sim.tick();

    let spawned = sim.last_report().resolve.spawned.clone();
    assert_eq!(spawned, vec![2, 3]);
    let edges: Vec<(f32, f32)> = spawned
        .iter()
        .map(|&id| {
            let child = sim.entity(id).unwrap();
            let x = sim.physics().body(child.body).unwrap().desc.position.x;
            (x - child.width / 2.0, x + child.width / 2.0)
        })
        .collect();

    assert_eq!(sim.entity(2).unwrap().width, 84.0);
    let gap = edges[1].0 - edges[0].1;
    assert!(gap >= 0.0, "children overlap by {}", -gap);
    // The split line stays at the parent's center.
    assert!(edges[0].1 < 347.3 && edges[1].0 > 347.3);
}

#[test]
fn cooldown_blocks_resplit_until_it_expires() {
    let mut sim = start(&["abcdefgh", "x"]);

    collide(&mut sim, 0, 1);
    sim.tick();
    let split_at = sim.now();
    let eligible_at = sim.entity(2).unwrap().split_eligible_at;
    assert_eq!(eligible_at, split_at + Duration::from_millis(2000));

    // Child "abcd" collides while cooling down: nothing happens.
    collide(&mut sim, 2, 1);
    sim.tick();
    assert_eq!(sim.last_report().resolve.splits, 0);
    assert!(sim.entity(2).is_some());

    while sim.now() < eligible_at {
        sim.tick();
    }
    collide(&mut sim, 2, 1);
    sim.tick();
    assert_eq!(sim.last_report().resolve.splits, 1);
    assert!(sim.entity(2).is_none());
    let texts: Vec<_> = sim.last_report().resolve.spawned
        .iter()
        .map(|&id| sim.entity(id).unwrap().text.clone())
        .collect();
    assert_eq!(texts, vec!["ab", "cd"]);
}

#[test]
fn fragment_in_several_pairs_splits_only_once_per_tick() {
    let mut sim = start(&["abcd", "efgh", "ijkl"]);

    collide(&mut sim, 0, 1);
    collide(&mut sim, 0, 2);
    sim.tick();

    let report = &sim.last_report().resolve;
    assert_eq!(report.pairs_resolved, 1);
    assert_eq!(report.splits, 2);
    assert!(sim.entity(2).is_some(), "third fragment is untouched");
}

#[test]
fn boundary_untagged_and_stale_pairs_are_discarded() {
    let mut sim = start(&["hello", "world"]);
    let wall = pack_tag(0, BodyKind::Wall);
    let pin = pack_tag(3, BodyKind::Pin);

    sim.physics_mut().queue_collision(fragment_tag(0), wall);
    sim.physics_mut().queue_collision(pin, fragment_tag(1));
    sim.physics_mut().queue_collision(fragment_tag(0), 0);
    collide(&mut sim, 0, 99);
    collide(&mut sim, 1, 1);
    sim.tick();

    let report = &sim.last_report().resolve;
    assert_eq!(report.pairs_seen, 5);
    assert_eq!(report.pairs_resolved, 0);
    assert_eq!(sim.len(), 2);
}

#[test]
fn fragment_past_the_despawn_line_is_removed_for_good() {
    let mut sim = start(&["hello", "world"]);
    let line = viewport().height + sim.settings().despawn_margin;
    let h = body_of(&sim, 0);

    sim.physics_mut().set_y(h, line);
    sim.tick();
    assert!(sim.entity(0).is_some(), "exactly on the line stays");

    sim.physics_mut().set_y(h, line + 0.5);
    let snapshot = sim.tick().to_vec();
    assert!(snapshot.iter().all(|v| v.id != 0));
    assert!(sim.entity(0).is_none());
    assert_eq!(sim.last_report().despawned, vec![0]);
    assert!(sim.physics().body(h).is_none(), "body destroyed with the entity");

    for _ in 0..30 {
        assert!(sim.tick().iter().all(|v| v.id != 0));
    }
}

#[test]
fn entity_whose_body_vanished_is_dropped_by_the_despawn_pass() {
    let mut sim = start(&["hello", "world"]);
    let h = body_of(&sim, 1);

    sim.physics_mut().destroy_body(h);
    sim.tick();

    assert!(sim.entity(1).is_none());
    assert_eq!(sim.last_report().despawned, vec![1]);
    assert!(sim.entity(0).is_some());
}

#[test]
fn gravity_carries_fragments_out_and_they_despawn_on_crossing() {
    let mut sim = Simulation::start(
        ScriptedPhysics::with_gravity(300.0),
        &texts(&["falling"]),
        viewport(),
        SimulationSettings::seeded(1),
    )
    .unwrap();
    let line = viewport().height + sim.settings().despawn_margin;

    let mut removed_at = None;
    for _ in 0..600 {
        let snapshot = sim.tick();
        assert!(snapshot.iter().all(|v| v.y <= line));
        if sim.is_empty() {
            removed_at = Some(sim.tick_count());
            break;
        }
    }

    let removed_at = removed_at.expect("fragment should fall out");
    assert_eq!(sim.last_report().tick, removed_at);
    assert_eq!(sim.last_report().despawned, vec![0]);
    for _ in 0..10 {
        assert!(sim.tick().is_empty());
    }
}

#[test]
fn ids_are_unique_across_a_run() {
    let mut sim = start(&["abcdefgh", "ijklmnop", "qrstuvwx"]);
    let mut issued: HashSet<u64> = sim.entities().map(|e| e.id).collect();

    for round in 0..6 {
        let live: Vec<u64> = sim.entities().map(|e| e.id).collect();
        for pair in live.windows(2) {
            collide(&mut sim, pair[0], pair[1]);
        }
        sim.tick();
        for &id in &sim.last_report().resolve.spawned {
            assert!(issued.insert(id), "id {id} reissued in round {round}");
        }
        for _ in 0..121 {
            sim.tick();
        }
    }

    assert!(issued.len() > 3);
}

#[test]
fn snapshot_mirrors_live_entities() {
    let mut sim = start(&["one", "two", "three"]);
    let snapshot = sim.tick().to_vec();

    assert_eq!(snapshot.len(), 3);
    for view in &snapshot {
        let entity = sim.entity(view.id).unwrap();
        assert_eq!(view.text, entity.text);
        assert_eq!(view.width, entity.width);
    }
    let ids: Vec<_> = snapshot.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn empty_viewport_is_reported_and_spawns_nothing() {
    let physics = ScriptedPhysics::new();
    let probe = physics.probe();

    let result = Simulation::start(
        physics,
        &texts(&["hello"]),
        Viewport::new(0.0, 600.0),
        SimulationSettings::seeded(1),
    );

    assert!(matches!(
        result,
        Err(SimulationError::EmptyViewport { width, .. }) if width == 0.0
    ));
    assert_eq!(probe.borrow().created, 0);
}

#[test]
fn invalid_settings_are_reported() {
    let settings = SimulationSettings {
        timestep: -1.0,
        ..SimulationSettings::seeded(1)
    };
    let result = Simulation::start(ScriptedPhysics::new(), &[], viewport(), settings);

    assert_eq!(
        result.err(),
        Some(SimulationError::InvalidSettings("timestep must be positive"))
    );
}

#[test]
fn teardown_releases_every_resource() {
    let physics = ScriptedPhysics::new();
    let probe = physics.probe();
    let mut sim = Simulation::start(
        physics,
        &texts(&["hello", "world"]),
        viewport(),
        SimulationSettings::seeded(1),
    )
    .unwrap();

    {
        let p = probe.borrow();
        assert!(p.subscribed && p.pointer_attached);
        // Two walls, twenty pins, two fragments.
        assert_eq!(p.live_bodies, 24);
    }

    sim.tick();
    sim.teardown();
    sim.teardown();

    let p = probe.borrow();
    assert_eq!(p.live_bodies, 0);
    assert_eq!(p.created, p.destroyed);
    assert!(!p.subscribed && !p.pointer_attached);
    drop(p);

    assert!(sim.is_torn_down());
    assert!(sim.tick().is_empty());
    assert_eq!(sim.physics().body_count(), 0);
}

#[test]
fn dropping_a_running_simulation_tears_it_down() {
    let physics = ScriptedPhysics::new();
    let probe = physics.probe();

    let run = || -> Result<(), &'static str> {
        let mut sim = Simulation::start(
            physics,
            &texts(&["early", "return"]),
            viewport(),
            SimulationSettings::seeded(1),
        )
        .map_err(|_| "start failed")?;
        sim.tick();
        Err("bail out mid-run")
    };

    assert!(run().is_err());
    let p = probe.borrow();
    assert_eq!(p.live_bodies, 0);
    assert!(!p.subscribed && !p.pointer_attached);
}

#[test]
fn restart_resets_ids_and_clock() {
    let mut sim = start(&["hello", "world"]);
    collide(&mut sim, 0, 1);
    sim.tick();
    assert_eq!(sim.len(), 4);

    sim.restart(&texts(&["again"]), Viewport::new(400.0, 300.0))
        .unwrap();

    assert_eq!(sim.len(), 1);
    assert!(sim.entity(0).is_some());
    assert_eq!(sim.now(), Duration::ZERO);
    assert_eq!(sim.viewport(), Viewport::new(400.0, 300.0));
    assert_eq!(sim.physics().body_count(), 2 + 20 + 1);
}

#[test]
fn pointer_grabs_only_live_fragments() {
    let mut sim = start(&["hello"]);

    assert!(!sim.pointer_grab(42));
    assert!(sim.pointer_grab(0));
    assert_eq!(sim.physics().grabbed(), Some(body_of(&sim, 0)));

    sim.pointer_move(100.0, 100.0);
    sim.pointer_release();
    assert_eq!(sim.physics().grabbed(), None);
}
