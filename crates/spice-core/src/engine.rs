//! Colony engine - main entry point for running water and humidity

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{Read, Write};

use spice_logic::config::SpiceConfig;
use spice_logic::thirst;
use spice_logic::topology::{RoomId, RoomTopology, TileClimate};
use spice_logic::water::SettleReport;

use crate::components::*;
use crate::persistence::{self, LoadedSimulation, SaveData, SaveError};
use crate::systems::*;

/// Ticks between weather samples for rain collectors
pub const LONG_TICK_INTERVAL: u64 = 2000;

/// Salt mixed into a colonist's id before drawing their dehydration jitter
const SEVERITY_SEED_SALT: u64 = 2_551_674;

/// What one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number just completed
    pub tick: u64,
    pub water: SettleReport,
    /// Units of rain added to collecting tanks
    pub rain_collected: i64,
    /// Whether collectors re-sampled the weather this tick
    pub weather_refreshed: bool,
}

/// Main simulation engine
pub struct ColonyEngine {
    /// ECS world holding tanks, fixtures and collectors
    pub world: World,
    pub water: WaterManager,
    pub humidity: HumidityManager,
    pub weather: WeatherState,
    /// Ticks simulated so far
    pub ticks: u64,
    config: SpiceConfig,
}

impl Default for ColonyEngine {
    fn default() -> Self {
        Self::new(SpiceConfig::default())
    }
}

impl ColonyEngine {
    /// Create a new empty colony
    pub fn new(config: SpiceConfig) -> Self {
        Self {
            world: World::new(),
            water: WaterManager::new(),
            humidity: HumidityManager::new(config.clone()),
            weather: WeatherState::clear(),
            ticks: 0,
            config,
        }
    }

    pub fn config(&self) -> &SpiceConfig {
        &self.config
    }

    /// Derive outdoor humidity from the map's world tile.
    pub fn finalize_init(&mut self, climate: &TileClimate) {
        self.humidity.finalize_init(climate);
        log::info!(
            "Outdoor humidity equilibrium {:.3}",
            self.humidity.outdoors().equilibrium
        );
    }

    // ── Water nodes ────────────────────────────────────────────────────

    pub fn spawn_storage(
        &mut self,
        name: &str,
        storage: WaterStorage,
        collects_rain: bool,
    ) -> Entity {
        let entity = self.world.spawn((Name::new(name), storage));
        if collects_rain {
            let _ = self.world.insert_one(entity, RainCollector::default());
        }
        entity
    }

    pub fn spawn_consumer(&mut self, name: &str, consumer: WaterConsumer) -> Entity {
        self.world.spawn((Name::new(name), consumer))
    }

    /// Lay a pipe between two water nodes; networks merge as needed.
    pub fn connect(&mut self, a: Entity, b: Entity) {
        self.water.connect(&self.world, a, b);
    }

    /// Remove a node and its pipes; networks it was bridging split.
    pub fn despawn_node(&mut self, entity: Entity) {
        self.water.remove_node(entity);
        let _ = self.world.despawn(entity);
        self.water.rebuild_from_pipes(&self.world);
    }

    /// Water held across every network.
    pub fn stored_water(&self) -> i64 {
        self.water.nets().iter().map(|net| net.stored(&self.world)).sum()
    }

    // ── Rooms ──────────────────────────────────────────────────────────

    pub fn add_room(&mut self, topology: &RoomTopology) {
        self.humidity.add_room(topology);
    }

    pub fn remove_room(&mut self, room: RoomId) {
        self.humidity.remove(room);
    }

    pub fn notify_room_changed(&mut self, topology: &RoomTopology, dereferenced: bool) {
        self.humidity.notify_shape_changed(topology, dereferenced);
    }

    // ── Weather ────────────────────────────────────────────────────────

    pub fn set_weather(&mut self, weather: WeatherState) {
        self.weather = weather;
    }

    /// Sample the current weather into collectors now, without waiting for
    /// the next long tick.
    pub fn refresh_weather(&mut self) {
        refresh_rain_rates(&mut self.world, &self.weather);
    }

    // ── Thirst ─────────────────────────────────────────────────────────

    /// Run one need interval for a colonist standing in `room`.
    ///
    /// Returns the water need lost; the same amount is exhaled into the room.
    pub fn apply_need_interval(
        &mut self,
        room: Option<RoomId>,
        base_rate: f32,
        cell_count: u32,
    ) -> f32 {
        let humidity = self.humidity.humidity_for(room).current_humidity;
        let rate = thirst::dehydration_rate(base_rate, humidity, &self.config);
        let lost = thirst::water_lost_per_interval(rate, &self.config);
        self.humidity.add_moisture(room, lost, cell_count);
        lost
    }

    /// Dehydration severity gained per interval by the colonist with `id`.
    /// Stable for a given id.
    pub fn dehydration_severity(&self, id: u64) -> f32 {
        let mut rng = StdRng::seed_from_u64(id ^ SEVERITY_SEED_SALT);
        let jitter: f32 = rng.gen();
        thirst::dehydration_severity_per_interval(jitter, &self.config)
    }

    // ── Tick ───────────────────────────────────────────────────────────

    /// Advance one tick: rain, water settlement, then humidity diffusion.
    pub fn tick(&mut self) -> TickReport {
        self.ticks += 1;

        let weather_refreshed = self.ticks % LONG_TICK_INTERVAL == 0;
        if weather_refreshed {
            self.refresh_weather();
        }

        let rain_collected = collect_rain(&mut self.world, self.config.rain_collection_per_tick);
        let water = self.water.tick(&mut self.world);
        self.humidity.tick();

        TickReport {
            tick: self.ticks,
            water,
            rain_collected,
            weather_refreshed,
        }
    }

    /// Run `n` ticks and fold the water reports together.
    pub fn run(&mut self, n: u64) -> SettleReport {
        let mut total = SettleReport::default();
        for _ in 0..n {
            total.merge(&self.tick().water);
        }
        total
    }

    // ── Persistence ────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SaveData {
        SaveData::capture(
            &self.world,
            self.ticks,
            &self.config,
            &self.weather,
            &self.water,
            &self.humidity,
        )
    }

    /// Save the simulation state to a writer (bincode format)
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        let data = self.snapshot();
        log::info!(
            "Saving colony at tick {}: {} water nodes, {} rooms",
            data.ticks,
            data.water.nodes.len(),
            data.humidity.rooms.len()
        );
        persistence::save_simulation(writer, &data)
    }

    /// Load a simulation from a reader into a new engine
    pub fn load<R: Read>(reader: R) -> Result<Self, SaveError> {
        let loaded = persistence::load_simulation(reader)?;
        log::info!(
            "Loaded colony at tick {}: {} networks, {} rooms",
            loaded.ticks,
            loaded.water.len(),
            loaded.humidity.room_count()
        );
        Ok(Self::from(loaded))
    }
}

impl From<LoadedSimulation> for ColonyEngine {
    fn from(loaded: LoadedSimulation) -> Self {
        Self {
            world: loaded.world,
            water: loaded.water,
            humidity: loaded.humidity,
            weather: loaded.weather,
            ticks: loaded.ticks,
            config: loaded.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spice_logic::topology::{BoundaryLink, LinkSide};
    use spice_logic::water::ConsumePolicy;

    fn tank_and_tap(engine: &mut ColonyEngine, water: i32, draw: i32) -> (Entity, Entity) {
        let tank = engine.spawn_storage("tank", WaterStorage::new(water), false);
        let tap = engine.spawn_consumer(
            "tap",
            WaterConsumer::new(draw).with_policy(ConsumePolicy::AtLeast),
        );
        engine.connect(tank, tap);
        (tank, tap)
    }

    #[test]
    fn test_tick_draws_water() {
        let mut engine = ColonyEngine::default();
        let (tank, tap) = tank_and_tap(&mut engine, 10, 3);

        let report = engine.tick();

        assert_eq!(report.tick, 1);
        assert_eq!(report.water.satisfied, 1);
        assert_eq!(report.water.drawn, 3);
        assert_eq!(engine.world.get::<&WaterStorage>(tank).unwrap().water(), 7);
        assert!(engine.world.get::<&WaterConsumer>(tap).unwrap().has_water());
    }

    #[test]
    fn test_rain_fills_before_draw() {
        let mut engine = ColonyEngine::default();
        let tank = engine.spawn_storage("cistern", WaterStorage::new(0), true);
        let tap = engine.spawn_consumer(
            "tap",
            WaterConsumer::new(1).with_policy(ConsumePolicy::AtLeast),
        );
        engine.connect(tank, tap);
        engine.set_weather(WeatherState::rain(1.0));
        engine.refresh_weather();

        let report = engine.tick();

        assert_eq!(report.rain_collected, 1);
        assert_eq!(report.water.satisfied, 1);
        assert_eq!(engine.stored_water(), 0);
    }

    #[test]
    fn test_weather_sampled_on_long_tick() {
        let mut engine = ColonyEngine::default();
        let tank = engine.spawn_storage("cistern", WaterStorage::new(0), true);
        engine.set_weather(WeatherState::rain(2.0));

        engine.run(LONG_TICK_INTERVAL - 1);
        assert_eq!(engine.world.get::<&WaterStorage>(tank).unwrap().water(), 0);

        let report = engine.tick();
        assert!(report.weather_refreshed);
        assert_eq!(report.rain_collected, 2);
    }

    #[test]
    fn test_despawn_splits_network() {
        let mut engine = ColonyEngine::default();
        let a = engine.spawn_storage("a", WaterStorage::new(5), false);
        let hub = engine.spawn_storage("hub", WaterStorage::new(5), false);
        let b = engine.spawn_storage("b", WaterStorage::new(5), false);
        engine.connect(a, hub);
        engine.connect(hub, b);
        assert_eq!(engine.water.len(), 1);

        engine.despawn_node(hub);

        assert_eq!(engine.water.len(), 2);
        assert_eq!(engine.stored_water(), 10);
    }

    #[test]
    fn test_need_interval_humidifies_room() {
        let mut engine = ColonyEngine::default();
        let room = RoomId(1);
        engine.add_room(&RoomTopology::new(room, 10).with_link(BoundaryLink::new(
            LinkSide::open(Some(room)),
            LinkSide::open(None),
        )));

        let lost = engine.apply_need_interval(Some(room), 0.0001, 10);

        let expected = 0.0001 * 0.75 * 150.0;
        assert!((lost - expected).abs() < 1e-6);
        let humidity = engine.humidity.get(room).unwrap().current_humidity;
        assert!((humidity - expected / 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_dehydration_severity_is_stable() {
        let engine = ColonyEngine::default();
        let base = engine.config().dehydration_severity_base;
        let first = engine.dehydration_severity(42);
        assert_eq!(first, engine.dehydration_severity(42));
        assert!(first >= base * thirst::SEVERITY_JITTER_MIN);
        assert!(first <= base * thirst::SEVERITY_JITTER_MAX);
    }
}
