//! Save/Load functionality for persisting colony water and humidity state
//!
//! Uses bincode for compact binary saves and serde_json for readable debug
//! dumps. Water nodes are serialized component by component and respawned
//! on load; network membership and pipes are stored as node indices.

use hecs::World;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use spice_logic::config::SpiceConfig;

use crate::systems::{HumidityManager, HumiditySnapshot, WaterManager, WaterSnapshot, WeatherState};

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the simulation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    /// Ticks simulated so far
    pub ticks: u64,
    pub config: SpiceConfig,
    pub weather: WeatherState,
    pub humidity: HumiditySnapshot,
    pub water: WaterSnapshot,
}

impl SaveData {
    pub fn capture(
        world: &World,
        ticks: u64,
        config: &SpiceConfig,
        weather: &WeatherState,
        water: &WaterManager,
        humidity: &HumidityManager,
    ) -> Self {
        Self {
            version: SAVE_VERSION,
            ticks,
            config: config.clone(),
            weather: *weather,
            humidity: humidity.snapshot(),
            water: water.snapshot(world),
        }
    }

    fn check_version(&self) -> Result<(), SaveError> {
        if self.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }
        Ok(())
    }

    /// Respawn everything into a fresh world.
    pub fn restore(self) -> Result<LoadedSimulation, SaveError> {
        self.check_version()?;

        let mut world = World::new();
        let (water, _) = WaterManager::restore(&mut world, self.water);
        let humidity = HumidityManager::from_snapshot(self.humidity, self.config.clone());

        Ok(LoadedSimulation {
            world,
            ticks: self.ticks,
            config: self.config,
            weather: self.weather,
            water,
            humidity,
        })
    }
}

/// Save the complete simulation to a writer
pub fn save_simulation<W: Write>(writer: W, save_data: &SaveData) -> Result<(), SaveError> {
    bincode::serialize_into(writer, save_data)?;
    Ok(())
}

/// Load a simulation from a reader
pub fn load_simulation<R: Read>(reader: R) -> Result<LoadedSimulation, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;
    save_data.restore()
}

/// Pretty JSON dump of a save, for debugging and the harness report
pub fn to_json(save_data: &SaveData) -> Result<String, SaveError> {
    Ok(serde_json::to_string_pretty(save_data)?)
}

pub fn from_json(json: &str) -> Result<LoadedSimulation, SaveError> {
    let save_data: SaveData = serde_json::from_str(json)?;
    save_data.restore()
}

/// Result of loading a simulation
pub struct LoadedSimulation {
    pub world: World,
    pub ticks: u64,
    pub config: SpiceConfig,
    pub weather: WeatherState,
    pub water: WaterManager,
    pub humidity: HumidityManager,
}

/// Errors that can occur during save/load
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Bincode(Box<bincode::ErrorKind>),
    Json(serde_json::Error),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<Box<bincode::ErrorKind>> for SaveError {
    fn from(e: Box<bincode::ErrorKind>) -> Self {
        SaveError::Bincode(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Json(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {}", e),
            SaveError::Bincode(e) => write!(f, "Serialization error: {}", e),
            SaveError::Json(e) => write!(f, "JSON error: {}", e),
            SaveError::VersionMismatch { expected, found } => {
                write!(
                    f,
                    "Save version mismatch: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for SaveError {}
