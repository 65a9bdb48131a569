//! Integration tests for water settlement and humidity diffusion.
//!
//! Exercises: StorageNode/ConsumerNode → plan_draw → settle, and
//! RoomTopology → HumidityData::calculate_leakage → HumidityData::tick.
//!
//! All tests are pure logic - no ECS, no persistence.

use std::collections::HashMap;

use spice_logic::config::SpiceConfig;
use spice_logic::humidity::{HumidityData, HumiditySource};
use spice_logic::topology::{BoundaryLink, LinkSide, RoomId, RoomTopology};
use spice_logic::water::{
    plan_draw, settle, ConsumePolicy, ConsumerNode, StorageNode, WaterSink,
};

// ── Helpers ────────────────────────────────────────────────────────────

fn tanks(levels: &[i32]) -> Vec<StorageNode> {
    levels.iter().map(|&w| StorageNode::new(w)).collect()
}

fn total(storages: &[StorageNode]) -> i64 {
    storages.iter().map(|s| s.water as i64).sum()
}

fn accepting(draw: i32) -> ConsumerNode {
    ConsumerNode::new(draw).with_policy(ConsumePolicy::AtLeast)
}

struct Map {
    rooms: HashMap<RoomId, f32>,
    outdoors: f32,
}

impl HumiditySource for Map {
    fn humidity_mut(&mut self, room: RoomId) -> &mut f32 {
        self.rooms.get_mut(&room).unwrap_or(&mut self.outdoors)
    }
}

// ── Water ──────────────────────────────────────────────────────────────

#[test]
fn conservation_when_everyone_is_satisfied() {
    let mut storages = tanks(&[3, 0, 8, 20]);
    let mut consumers = vec![accepting(5), accepting(4), accepting(7)];
    let before = total(&storages);

    let report = settle(&mut storages, &mut consumers);

    assert_eq!(report.unsatisfied, 0);
    let credited: i64 = consumers.iter().map(|c| c.water_draw as i64).sum();
    assert_eq!(before - total(&storages), credited);
    assert_eq!(report.drawn, credited);
    assert!(storages.iter().all(|s| s.water >= 0));
}

#[test]
fn failed_consumer_leaves_storages_untouched() {
    let mut storages = tanks(&[2, 1]);
    let mut consumers = vec![accepting(10)];
    settle(&mut storages, &mut consumers);
    assert_eq!(storages, tanks(&[2, 1]));
    assert!(!consumers[0].has_water);
}

#[test]
fn failed_consumer_does_not_block_later_ones() {
    let mut storages = tanks(&[4]);
    let mut consumers = vec![accepting(10), accepting(3)];
    let report = settle(&mut storages, &mut consumers);
    assert!(!consumers[0].has_water);
    assert!(consumers[1].has_water);
    assert_eq!(storages[0].water, 1);
    assert_eq!(report.satisfied, 1);
    assert_eq!(report.unsatisfied, 1);
}

// Reproduced behavior, not endorsed: the default consumer rejects an exact
// match, so a fully covered demand still fails and nothing is withdrawn.
#[test]
fn default_consumer_rejects_exact_demand() {
    let mut consumer = ConsumerNode::new(5);
    assert!(!consumer.consume(5));
    assert!(consumer.consume(6));
    assert!(!consumer.consume(4));

    let mut storages = tanks(&[100]);
    let mut consumers = vec![ConsumerNode::new(5)];
    settle(&mut storages, &mut consumers);
    assert_eq!(storages[0].water, 100);
    assert!(!consumers[0].has_water);
}

#[test]
fn first_fit_covers_remainder() {
    let plan = plan_draw(tanks(&[5, 10]).iter().map(|s| s.water).enumerate(), 3);
    assert_eq!(plan.draws, vec![(0, 3)]);

    let mut storages = tanks(&[5, 10]);
    settle(&mut storages, &mut [accepting(3)]);
    assert_eq!(storages, tanks(&[2, 10]));
}

#[test]
fn spillover_drains_then_moves_on() {
    let mut storages = tanks(&[2, 10]);
    settle(&mut storages, &mut [accepting(5)]);
    assert_eq!(storages, tanks(&[0, 7]));
}

#[test]
fn many_ticks_never_go_negative() {
    let mut storages = tanks(&[7, 3, 12]);
    let mut consumers = vec![accepting(4), accepting(2), accepting(5)];
    for tick in 0..20 {
        if tick % 3 == 0 {
            storages[1].collect(2);
        }
        settle(&mut storages, &mut consumers);
        assert!(storages.iter().all(|s| s.water >= 0), "tick {}", tick);
    }
}

// ── Humidity ───────────────────────────────────────────────────────────

#[test]
fn two_rooms_exchange_conserves_total() {
    let config = SpiceConfig::default();
    let a = RoomId(1);
    let b = RoomId(2);
    let topo = RoomTopology::new(a, 10).with_link(BoundaryLink::new(
        LinkSide::door(Some(a)),
        LinkSide::open(Some(b)),
    ));

    let mut room = HumidityData {
        current_humidity: 0.8,
        ..Default::default()
    };
    room.calculate_leakage(&topo, &config);

    let mut map = Map {
        rooms: HashMap::from([(b, 0.3)]),
        outdoors: 0.5,
    };
    room.tick(&mut map, Some(a), 0.5);

    let lost = 0.8 - room.current_humidity;
    let gained = map.rooms[&b] - 0.3;
    assert!(lost > 0.0);
    assert!((lost - gained).abs() < 1e-6);
    assert!(((room.current_humidity + map.rooms[&b]) - 1.1).abs() < 1e-6);
}

#[test]
fn equal_rooms_do_not_move() {
    let config = SpiceConfig::default();
    let a = RoomId(1);
    let b = RoomId(2);
    let topo = RoomTopology::new(a, 10).with_link(BoundaryLink::new(
        LinkSide::door(Some(a)),
        LinkSide::door(Some(b)),
    ));
    let mut room = HumidityData {
        current_humidity: 0.4,
        ..Default::default()
    };
    room.calculate_leakage(&topo, &config);

    let mut map = Map {
        rooms: HashMap::from([(b, 0.4)]),
        outdoors: 0.0,
    };
    room.tick(&mut map, Some(a), 0.0);
    assert_eq!(room.current_humidity, 0.4);
    assert_eq!(map.rooms[&b], 0.4);
}

#[test]
fn recompute_twice_matches() {
    let config = SpiceConfig::default();
    let a = RoomId(1);
    let topo = RoomTopology::new(a, 30)
        .with_link(BoundaryLink::new(LinkSide::door(Some(a)), LinkSide::open(None)))
        .with_link(BoundaryLink::new(
            LinkSide::door(Some(a)),
            LinkSide::open(Some(RoomId(2))),
        ))
        .with_open_roof(40);

    let mut room = HumidityData::default();
    room.calculate_leakage(&topo, &config);
    let first = room.clone();
    room.calculate_leakage(&topo, &config);
    assert_eq!(room, first);
    assert!(room.outside_leakage <= 1.0);
}
