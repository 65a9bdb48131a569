//! Spice Core - colony water networks and room humidity
//!
//! An ECS-based simulation of a colony's plumbing and indoor air: tanks and
//! fixtures joined by pipes settle water every tick, and rooms trade moisture
//! through doors and open roofs.
//!
//! # Architecture
//!
//! The simulation uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Tanks, fixtures, rain collectors
//! - **Components**: Pure data attached to entities (WaterStorage, WaterConsumer, etc.)
//! - **Systems**: Water settlement, rain collection, humidity diffusion
//!
//! Rooms are not entities; `HumidityManager` keys them by `RoomId`.
//!
//! # Example
//!
//! ```rust,no_run
//! use spice_core::prelude::*;
//!
//! let mut engine = ColonyEngine::default();
//! let tank = engine.spawn_storage("cistern", WaterStorage::new(50), true);
//! let sink = engine.spawn_consumer("sink", WaterConsumer::new(2));
//! engine.connect(tank, sink);
//!
//! loop {
//!     engine.tick();
//! }
//! ```

pub mod components;
pub mod engine;
pub mod persistence;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{ColonyEngine, TickReport, LONG_TICK_INTERVAL};
    pub use crate::systems::{HumidityManager, WaterManager, WaterNet, WeatherState};
    pub use spice_logic::config::SpiceConfig;
    pub use spice_logic::topology::{BoundaryLink, LinkSide, RoomId, RoomTopology, TileClimate};
}
