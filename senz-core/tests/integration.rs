//! Integration Tests: End-to-End Sensing Flows
//!
//! These tests drive a full [`SenseEngine`] through scan sequences:
//! detection, ranking, nearest-target retention, forgetting, and the
//! "no longer detectable" path through the registry.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use senz_core::acquisition::{RegistryScanSource, ToggleSource};
use senz_core::conditions;
use senz_core::config::{AcquisitionMode, SenzConfig};
use senz_core::engine::{SenseEngine, TickContext};
use senz_core::events::NearestChanged;
use senz_core::record::Modality;
use senz_core::registry::DetectableRegistry;
use senz_core::spatial::SpatialGrid;
use senz_core::types::{EntityId, Pose, SenseTime, Vec3};

fn at(secs: f64) -> TickContext {
    TickContext::new(SenseTime::from_secs(secs), Pose::default())
}

/// FOV 110°, vision 100, no scent or hearing, implicit 2, retention 5s, scan every tick.
fn example_config() -> SenzConfig {
    let mut config = SenzConfig::default();
    config.senses.fov_half_angle_deg = 110.0;
    config.senses.vision_range = 100.0;
    config.senses.scent_range = 0.0;
    config.senses.hearing_range = 0.0;
    config.senses.implicit_range = 2.0;
    config.targeting.retain_nearest_secs = 5.0;
    config.scan.interval = 1;
    config.scan.rng_seed = Some(7);
    config
}

fn engine_for(registry: &DetectableRegistry, config: SenzConfig) -> SenseEngine {
    let mut engine = SenseEngine::new(EntityId::new(), config, RegistryScanSource::new(registry.clone()))
        .expect("valid config")
        .with_detectability(registry.clone());
    engine.initialize();
    engine
}

fn record_changes(engine: &mut SenseEngine) -> Arc<Mutex<Vec<NearestChanged>>> {
    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&changes);
    let _sub = engine.on_nearest_changed(move |e| sink.lock().push(e));
    changes
}

// ---------------------------------------------------------------------------
// Seen target ahead, implicit target behind, expiry then promotion
// ---------------------------------------------------------------------------

#[test]
fn nearest_expires_then_fresh_target_is_promoted() {
    let registry = DetectableRegistry::new();
    let a = EntityId::new();
    let b = EntityId::new();
    registry.add(a, Vec3::new(0.0, 0.0, 3.0));
    registry.add(b, Vec3::new(0.0, 0.0, -1.0));

    let mut engine = engine_for(&registry, example_config());
    let changes = record_changes(&mut engine);

    engine.tick(&at(0.0));
    let ra = *engine.get(a).expect("A remembered");
    let rb = *engine.get(b).expect("B remembered");
    assert!(ra.seen && !ra.implicitly_detected);
    assert!((ra.distance - 3.0).abs() < 1e-6);
    assert!(rb.implicitly_detected && !rb.seen);
    assert_eq!(engine.ranked().map(|r| r.id).collect::<Vec<_>>(), vec![b, a]);
    assert_eq!(engine.nearest_id(), Some(b));
    assert_eq!(*changes.lock(), vec![NearestChanged { old: None, new: Some(b) }]);

    // B steps back out of implicit range, still behind the agent.
    registry.set_position(b, Vec3::new(0.0, 0.0, -5.0));
    for t in 1..=5 {
        engine.tick(&at(f64::from(t)));
        assert_eq!(engine.nearest_id(), Some(b), "B retained at t={t}");
    }

    engine.tick(&at(6.0));
    assert_eq!(engine.nearest_id(), None);
    assert!(engine.is_remembered(b), "expiry does not forget the record");
    assert_eq!(changes.lock().last(), Some(&NearestChanged { old: Some(b), new: None }));

    engine.tick(&at(7.0));
    assert_eq!(engine.nearest_id(), Some(a));
    assert_eq!(changes.lock().last(), Some(&NearestChanged { old: None, new: Some(a) }));

    for t in 8..=12 {
        engine.tick(&at(f64::from(t)));
    }
    assert_eq!(
        *changes.lock(),
        vec![
            NearestChanged { old: None, new: Some(b) },
            NearestChanged { old: Some(b), new: None },
            NearestChanged { old: None, new: Some(a) },
        ],
        "expiry is announced exactly once"
    );
    assert_eq!(engine.stats().nearest_expiries, 1);
}

#[test]
fn expired_memory_yields_its_slot_to_a_seen_target() {
    let registry = DetectableRegistry::new();
    let a = EntityId::new();
    let b = EntityId::new();
    registry.add(a, Vec3::new(0.0, 0.0, 3.0));
    registry.add(b, Vec3::new(0.0, 0.0, -1.0));

    let mut config = example_config();
    config.targeting.capacity = 1;
    let mut engine = engine_for(&registry, config);
    let changes = record_changes(&mut engine);
    let forgotten = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&forgotten);
    let _sub = engine.on_forgotten(move |r| sink.lock().push(r.id));

    engine.tick(&at(0.0));
    assert_eq!(engine.nearest_id(), Some(b));

    // B drops out of every sense; A stays in plain sight.
    registry.set_position(b, Vec3::new(0.0, 0.0, -5.0));
    for t in 1..=20 {
        engine.tick(&at(f64::from(t)));
    }

    assert_eq!(engine.nearest_id(), Some(a));
    assert!(engine.is_remembered(a));
    assert!(!engine.is_remembered(b));
    assert_eq!(engine.memory().len(), 1);
    assert_eq!(
        *changes.lock(),
        vec![
            NearestChanged { old: None, new: Some(b) },
            NearestChanged { old: Some(b), new: None },
            NearestChanged { old: None, new: Some(a) },
        ]
    );

    // A lost its slot only while B was inside the retention window.
    let a_trims = forgotten.lock().iter().filter(|id| **id == a).count();
    assert_eq!(a_trims, 7);
    assert_eq!(forgotten.lock().iter().filter(|id| **id == b).count(), 1);
    assert_eq!(registry.watch_count(), 1);
}

// ---------------------------------------------------------------------------
// Forgetting
// ---------------------------------------------------------------------------

#[test]
fn forgetting_nearest_promotes_next_fresh_record() {
    let registry = DetectableRegistry::new();
    let near = EntityId::new();
    let far = EntityId::new();
    registry.add(near, Vec3::new(0.0, 0.0, 4.0));
    registry.add(far, Vec3::new(0.0, 0.0, 20.0));
    let mut engine = engine_for(&registry, example_config());
    engine.tick(&at(0.0));

    let changes = record_changes(&mut engine);
    let forgotten = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&forgotten);
    let _sub = engine.on_forgotten(move |r| sink.lock().push(r.id));

    let removed = engine.forget(near).expect("was remembered");
    assert_eq!(removed.id, near);
    assert_eq!(engine.nearest_id(), Some(far));
    assert_eq!(*changes.lock(), vec![NearestChanged { old: Some(near), new: Some(far) }]);
    assert_eq!(*forgotten.lock(), vec![near]);
    assert!(!engine.sensed_by(Modality::Sight).contains(&near));
    assert!(engine.ranked().all(|r| r.id != near));

    // Forgetting something unknown changes nothing.
    assert!(engine.forget(EntityId::new()).is_none());
    assert_eq!(forgotten.lock().len(), 1);
}

#[test]
fn retired_entity_is_forgotten_on_next_tick() {
    let registry = DetectableRegistry::new();
    let prey = EntityId::new();
    registry.add(prey, Vec3::new(0.0, 0.0, 6.0));
    let mut engine = engine_for(&registry, example_config());
    engine.tick(&at(0.0));
    assert_eq!(engine.nearest_id(), Some(prey));

    let changes = record_changes(&mut engine);
    registry.retire(prey);
    engine.tick(&at(0.5));

    assert!(!engine.is_remembered(prey));
    assert_eq!(engine.nearest_id(), None);
    assert_eq!(*changes.lock(), vec![NearestChanged { old: Some(prey), new: None }]);
    assert_eq!(registry.watch_count(), 0);
}

#[test]
fn handler_can_queue_forget_during_scan() {
    let registry = DetectableRegistry::new();
    let decoy = EntityId::new();
    registry.add(decoy, Vec3::new(0.0, 0.0, 8.0));
    let mut engine = engine_for(&registry, example_config());

    let inbox = engine.inbox().clone();
    let _sub = engine.on_newly_sensed(move |batch| {
        for record in batch {
            inbox.push(record.id);
        }
    });

    engine.tick(&at(0.0));
    assert!(engine.is_remembered(decoy), "queued forget waits for the scan to finish");
    engine.process_pending();
    assert!(!engine.is_remembered(decoy));
    assert_eq!(engine.nearest_id(), None);
}

// ---------------------------------------------------------------------------
// Newly sensed
// ---------------------------------------------------------------------------

#[test]
fn newly_sensed_only_on_first_detection_or_reacquisition() {
    let registry = DetectableRegistry::new();
    let wanderer = EntityId::new();
    registry.add(wanderer, Vec3::new(0.0, 0.0, 10.0));
    let mut engine = engine_for(&registry, example_config());

    let batches = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&batches);
    let _sub = engine.on_newly_sensed(move |batch| sink.lock().push(batch.len()));

    engine.tick(&at(0.0));
    engine.tick(&at(1.0));
    engine.tick(&at(2.0));
    assert_eq!(*batches.lock(), vec![1]);

    registry.set_position(wanderer, Vec3::new(0.0, 0.0, -30.0));
    engine.tick(&at(3.0));
    registry.set_position(wanderer, Vec3::new(0.0, 0.0, 10.0));
    engine.tick(&at(4.0));
    assert_eq!(*batches.lock(), vec![1, 1]);
}

// ---------------------------------------------------------------------------
// Capacity with the broad-phase source
// ---------------------------------------------------------------------------

#[test]
fn broad_phase_engine_respects_capacity() {
    let registry = DetectableRegistry::new();
    let grid = Arc::new(RwLock::new(SpatialGrid::new(10.0)));
    let mut ids = Vec::new();
    for i in 0..25 {
        let id = EntityId::new();
        let p = Vec3::new((i % 5) as f32 * 4.0 - 8.0, 0.0, 5.0 + (i / 5) as f32 * 4.0);
        registry.add(id, p);
        grid.write().insert(id, p, u32::MAX);
        ids.push(id);
    }

    let mut config = example_config();
    config.targeting.capacity = 6;
    config.scan.acquisition = AcquisitionMode::BroadPhase;
    let source = ToggleSource::from_config(&config.scan, registry.clone(), Some(Box::new(Arc::clone(&grid))));
    let mut engine = SenseEngine::new(EntityId::new(), config, source)
        .expect("valid config")
        .with_detectability(registry.clone());
    engine.initialize();

    engine.tick(&at(0.0));
    assert_eq!(engine.ranked().count(), 6);
    assert_eq!(engine.memory().len(), 6);
    assert_eq!(registry.watch_count(), 6);
    let distances: Vec<f32> = engine.ranked().map(|r| r.distance).collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(engine.stats().records_forgotten, 19);
}

// ---------------------------------------------------------------------------
// Configuration and determinism
// ---------------------------------------------------------------------------

#[test]
fn toml_config_drives_engine() {
    let config = SenzConfig::from_toml(
        r#"
        [senses]
        fov_half_angle_deg = 45.0
        vision_range = 20.0
        hearing_range = 0.0

        [targeting]
        capacity = 2

        [scan]
        interval = 2
        acquisition = "registry"
        rng_seed = 3
        "#,
    )
    .expect("valid toml");
    assert_eq!(config.scan.acquisition, AcquisitionMode::Registry);

    let registry = DetectableRegistry::new();
    let side = EntityId::new();
    let ahead = EntityId::new();
    registry.add(side, Vec3::new(10.0, 0.0, 1.0));
    registry.add(ahead, Vec3::new(0.0, 0.0, 15.0));
    let mut engine = engine_for(&registry, config);

    assert!(engine.tick(&at(0.0)));
    assert!(!engine.tick(&at(0.1)));
    assert!(engine.is_remembered(ahead));
    assert!(!engine.is_remembered(side), "outside a 45° half-angle");
    assert!(conditions::near_sensed_target(&engine, Vec3::ZERO, 15.0));
}

#[test]
fn same_seed_gives_same_noisy_positions() {
    let registry = DetectableRegistry::new();
    let scent = EntityId::new();
    registry.add(scent, Vec3::new(0.0, 0.0, -12.0));

    let mut config = example_config();
    config.senses.scent_range = 30.0;
    config.scan.rng_seed = Some(1234);

    let mut first = engine_for(&registry, config.clone());
    let mut second = engine_for(&registry, config);
    first.tick(&at(0.0));
    second.tick(&at(0.0));

    let a = first.get(scent).expect("smelled");
    let b = second.get(scent).expect("smelled");
    assert!(a.smelled && !a.seen);
    assert_eq!(a.sensed_position, b.sensed_position);
    assert!(a.sensed_position.distance(a.actual_position) <= 2.0 + 1e-4);
}
