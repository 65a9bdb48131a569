//! Integration tests for the colony engine.
//!
//! Exercises: ColonyEngine → WaterManager (pipes, rebuild, settle),
//! rain collection, HumidityManager diffusion, and save/load.

use spice_core::prelude::*;
use spice_logic::water::ConsumePolicy;

// ── Helpers ────────────────────────────────────────────────────────────

fn tap(engine: &mut ColonyEngine, draw: i32) -> hecs::Entity {
    engine.spawn_consumer(
        "tap",
        WaterConsumer::new(draw).with_policy(ConsumePolicy::AtLeast),
    )
}

fn water(engine: &ColonyEngine, entity: hecs::Entity) -> i32 {
    engine.world.get::<&WaterStorage>(entity).unwrap().water()
}

fn humid_climate() -> TileClimate {
    TileClimate {
        rainfall: 1.12,
        temperature: 25.0,
        hilliness: Default::default(),
    }
}

// ── Water ──────────────────────────────────────────────────────────────

#[test]
fn priority_orders_storages_within_a_network() {
    let mut engine = ColonyEngine::default();
    let backup = engine.spawn_storage("backup", WaterStorage::new(10).with_priority(5), false);
    let main = engine.spawn_storage("main", WaterStorage::new(10).with_priority(0), false);
    let sink = tap(&mut engine, 4);
    engine.connect(backup, sink);
    engine.connect(sink, main);

    engine.tick();

    assert_eq!(water(&engine, main), 6);
    assert_eq!(water(&engine, backup), 10);
}

#[test]
fn separate_networks_do_not_share_water() {
    let mut engine = ColonyEngine::default();
    let full = engine.spawn_storage("full", WaterStorage::new(50), false);
    let empty = engine.spawn_storage("empty", WaterStorage::new(0), false);
    let thirsty = tap(&mut engine, 5);
    engine.connect(empty, thirsty);

    let report = engine.tick();

    assert_eq!(report.water.satisfied, 0);
    assert!(!engine.world.get::<&WaterConsumer>(thirsty).unwrap().has_water());
    assert_eq!(water(&engine, full), 50);
}

#[test]
fn default_fixture_never_draws() {
    let mut engine = ColonyEngine::default();
    let tank = engine.spawn_storage("tank", WaterStorage::new(100), false);
    let sink = engine.spawn_consumer("sink", WaterConsumer::new(5));
    engine.connect(tank, sink);

    let report = engine.run(10);

    assert_eq!(report.satisfied, 0);
    assert_eq!(report.unsatisfied, 10);
    assert_eq!(water(&engine, tank), 100);
}

#[test]
fn water_is_conserved_over_many_ticks() {
    let mut engine = ColonyEngine::default();
    let a = engine.spawn_storage("a", WaterStorage::new(40), false);
    let b = engine.spawn_storage("b", WaterStorage::new(15), false);
    let sinks: Vec<_> = (1..=3).map(|d| tap(&mut engine, d)).collect();
    engine.connect(a, b);
    for &s in &sinks {
        engine.connect(a, s);
    }

    let before = engine.stored_water();
    let report = engine.run(20);

    assert_eq!(before - engine.stored_water(), report.drawn);
    assert!(water(&engine, a) >= 0 && water(&engine, b) >= 0);
}

#[test]
fn rain_keeps_a_collector_fed() {
    let mut engine = ColonyEngine::default();
    let cistern = engine.spawn_storage("cistern", WaterStorage::new(0), true);
    let sink = tap(&mut engine, 1);
    engine.connect(cistern, sink);
    engine.set_weather(WeatherState::rain(1.0));
    engine.refresh_weather();

    let report = engine.run(50);

    assert_eq!(report.satisfied, 50);
    assert_eq!(water(&engine, cistern), 0);
}

// ── Humidity ───────────────────────────────────────────────────────────

#[test]
fn humidity_stays_in_unit_range() {
    let mut engine = ColonyEngine::default();
    engine.finalize_init(&humid_climate());
    let ids: Vec<RoomId> = (1..=5).map(RoomId).collect();
    for (i, &room) in ids.iter().enumerate() {
        let next = ids.get(i + 1).copied();
        engine.add_room(
            &RoomTopology::new(room, 9)
                .with_link(BoundaryLink::new(LinkSide::door(Some(room)), LinkSide::door(next)))
                .with_open_roof(3),
        );
    }
    for _ in 0..30 {
        engine.apply_need_interval(Some(ids[0]), 0.05, 9);
    }

    engine.run(500);

    for &room in &ids {
        let h = engine.humidity.get(room).unwrap().current_humidity;
        assert!((0.0..=1.0).contains(&h), "{} = {}", room, h);
    }
    let outside = engine.humidity.outdoors().current_humidity;
    assert!((0.0..=1.0).contains(&outside));
}

#[test]
fn outdoor_room_reads_outdoors() {
    let mut engine = ColonyEngine::default();
    engine.finalize_init(&humid_climate());
    let yard = RoomId(9);
    engine.add_room(&RoomTopology::new(yard, 100).with_outdoor_conditions(true));

    let reading = engine.humidity.humidity_for(Some(yard)).current_humidity;
    assert_eq!(reading, engine.humidity.outdoors().current_humidity);
}

// ── Persistence ────────────────────────────────────────────────────────

#[test]
fn save_load_then_continue_matches() {
    let mut engine = ColonyEngine::default();
    engine.finalize_init(&humid_climate());
    let tank = engine.spawn_storage("tank", WaterStorage::new(200), true);
    let sink = tap(&mut engine, 3);
    engine.connect(tank, sink);
    let room = RoomId(1);
    engine.add_room(&RoomTopology::new(room, 6).with_link(BoundaryLink::new(
        LinkSide::door(Some(room)),
        LinkSide::door(None),
    )));
    engine.apply_need_interval(Some(room), 0.01, 6);
    engine.set_weather(WeatherState::rain(0.5));
    engine.run(25);

    let mut buffer = Vec::new();
    engine.save(&mut buffer).unwrap();
    let mut loaded = ColonyEngine::load(&buffer[..]).unwrap();

    engine.run(25);
    loaded.run(25);

    assert_eq!(loaded.ticks, engine.ticks);
    assert_eq!(loaded.stored_water(), engine.stored_water());
    assert_eq!(loaded.humidity.snapshot(), engine.humidity.snapshot());
}
