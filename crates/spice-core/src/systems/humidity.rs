//! Room humidity manager - owns every room's humidity and the outdoors.
//!
//! Rooms are ticked in the order they were added. A push from an earlier
//! room is visible to later rooms in the same pass. The host calls
//! `add_room` / `notify_shape_changed` / `remove` between ticks whenever the
//! room graph changes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use spice_logic::config::SpiceConfig;
use spice_logic::error::SpiceError;
use spice_logic::humidity::{tile_humidity, HumidityData, HumiditySource};
use spice_logic::thirst::moisture_for_room;
use spice_logic::topology::{RoomId, RoomTopology, TileClimate};

#[derive(Debug, Clone, PartialEq)]
struct RoomEntry {
    id: RoomId,
    data: HumidityData,
    uses_outdoor_conditions: bool,
}

/// Per-map humidity state
#[derive(Debug, Clone)]
pub struct HumidityManager {
    rooms: Vec<RoomEntry>,
    index: HashMap<RoomId, usize>,
    outdoors: HumidityData,
    config: SpiceConfig,
}

/// Neighbour view handed to a ticking room. The ticking room's own slot is
/// temporarily empty; leakage never names the room itself.
struct Neighbours<'a> {
    rooms: &'a mut [RoomEntry],
    index: &'a HashMap<RoomId, usize>,
    outdoors: &'a mut HumidityData,
}

impl HumiditySource for Neighbours<'_> {
    fn humidity_mut(&mut self, room: RoomId) -> &mut f32 {
        match self.index.get(&room) {
            Some(&i) if !self.rooms[i].uses_outdoor_conditions => {
                &mut self.rooms[i].data.current_humidity
            }
            _ => &mut self.outdoors.current_humidity,
        }
    }
}

impl Default for HumidityManager {
    fn default() -> Self {
        Self::new(SpiceConfig::default())
    }
}

impl HumidityManager {
    pub fn new(config: SpiceConfig) -> Self {
        Self {
            rooms: Vec::new(),
            index: HashMap::new(),
            outdoors: HumidityData::default(),
            config,
        }
    }

    /// Set outdoor equilibrium from the map's world tile. Call once when the
    /// map becomes active.
    pub fn finalize_init(&mut self, climate: &TileClimate) {
        let equilibrium = tile_humidity(climate, &self.config);
        self.outdoors = HumidityData::outdoors(equilibrium);
    }

    pub fn config(&self) -> &SpiceConfig {
        &self.config
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains(&self, room: RoomId) -> bool {
        self.index.contains_key(&room)
    }

    /// Rooms in tick order.
    pub fn room_ids(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.rooms.iter().map(|r| r.id)
    }

    pub fn outdoors(&self) -> &HumidityData {
        &self.outdoors
    }

    /// Start tracking a newly formed room and compute its leak weights.
    /// A room already tracked is recomputed instead.
    pub fn add_room(&mut self, topology: &RoomTopology) {
        if let Some(&idx) = self.index.get(&topology.room) {
            log::warn!("{} added twice; recomputing instead", topology.room);
            let entry = &mut self.rooms[idx];
            entry.data.calculate_leakage(topology, &self.config);
            entry.uses_outdoor_conditions = topology.uses_outdoor_conditions;
            return;
        }

        let mut data = HumidityData::new(self.outdoors.equilibrium);
        data.calculate_leakage(topology, &self.config);
        self.index.insert(topology.room, self.rooms.len());
        self.rooms.push(RoomEntry {
            id: topology.room,
            data,
            uses_outdoor_conditions: topology.uses_outdoor_conditions,
        });
    }

    /// Stop tracking a room. Remaining rooms keep their order.
    pub fn remove(&mut self, room: RoomId) -> Option<HumidityData> {
        let idx = self.index.remove(&room)?;
        let entry = self.rooms.remove(idx);
        for i in self.index.values_mut() {
            if *i > idx {
                *i -= 1;
            }
        }
        Some(entry.data)
    }

    /// Re-derive leak weights in place. Current humidity is kept.
    pub fn recalculate(&mut self, topology: &RoomTopology) -> Result<(), SpiceError> {
        let idx = *self
            .index
            .get(&topology.room)
            .ok_or(SpiceError::UnknownRoom(topology.room))?;
        let entry = &mut self.rooms[idx];
        entry.data.calculate_leakage(topology, &self.config);
        entry.uses_outdoor_conditions = topology.uses_outdoor_conditions;
        Ok(())
    }

    /// Host hook for "room shape changed": a dereferenced room is dropped,
    /// a live one is recomputed.
    pub fn notify_shape_changed(&mut self, topology: &RoomTopology, dereferenced: bool) {
        if dereferenced {
            self.remove(topology.room);
        } else if self.recalculate(topology).is_err() {
            log::warn!("Shape change for untracked {}; ignored", topology.room);
        }
    }

    /// Humidity an occupant of `room` feels. `None`, untracked rooms and
    /// rooms using outdoor conditions all resolve to the outdoors.
    pub fn humidity_for(&self, room: Option<RoomId>) -> &HumidityData {
        match room.and_then(|r| self.index.get(&r)) {
            Some(&i) if !self.rooms[i].uses_outdoor_conditions => &self.rooms[i].data,
            _ => &self.outdoors,
        }
    }

    pub fn humidity_for_mut(&mut self, room: Option<RoomId>) -> &mut HumidityData {
        match room.and_then(|r| self.index.get(&r)) {
            Some(&i) if !self.rooms[i].uses_outdoor_conditions => &mut self.rooms[i].data,
            _ => &mut self.outdoors,
        }
    }

    /// Direct access to a tracked room's data, no outdoor fallback.
    pub fn get(&self, room: RoomId) -> Result<&HumidityData, SpiceError> {
        self.index
            .get(&room)
            .map(|&i| &self.rooms[i].data)
            .ok_or(SpiceError::UnknownRoom(room))
    }

    /// Exhaled moisture from a colonist who lost `lost` water in `room`.
    pub fn add_moisture(&mut self, room: Option<RoomId>, lost: f32, cell_count: u32) {
        let data = self.humidity_for_mut(room);
        data.current_humidity =
            (data.current_humidity + moisture_for_room(lost, cell_count)).clamp(0.0, 1.0);
    }

    /// One diffusion pass over every tracked room.
    pub fn tick(&mut self) {
        let outside = self.outdoors.equilibrium;
        let blend_outside = self.config.apply_outside_leakage;

        for i in 0..self.rooms.len() {
            let mut data = std::mem::take(&mut self.rooms[i].data);
            let room = self.rooms[i].id;
            let mut neighbours = Neighbours {
                rooms: &mut self.rooms,
                index: &self.index,
                outdoors: &mut self.outdoors,
            };
            data.tick(&mut neighbours, Some(room), outside);
            if blend_outside {
                let weight = data.outside_leakage;
                data.blend_toward(outside, weight);
            }
            self.rooms[i].data = data;
        }
    }

    /// Plain-data copy for persistence.
    pub fn snapshot(&self) -> HumiditySnapshot {
        HumiditySnapshot {
            rooms: self
                .rooms
                .iter()
                .map(|r| SavedRoom {
                    id: r.id,
                    data: r.data.clone(),
                    uses_outdoor_conditions: r.uses_outdoor_conditions,
                })
                .collect(),
            outdoors: self.outdoors.clone(),
        }
    }

    /// Rebuild from a snapshot, keeping the saved room order.
    pub fn from_snapshot(snapshot: HumiditySnapshot, config: SpiceConfig) -> Self {
        let mut manager = Self::new(config);
        manager.outdoors = snapshot.outdoors;
        for saved in snapshot.rooms {
            if manager.contains(saved.id) {
                continue;
            }
            manager.index.insert(saved.id, manager.rooms.len());
            manager.rooms.push(RoomEntry {
                id: saved.id,
                data: saved.data,
                uses_outdoor_conditions: saved.uses_outdoor_conditions,
            });
        }
        manager
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedRoom {
    pub id: RoomId,
    pub data: HumidityData,
    pub uses_outdoor_conditions: bool,
}

/// Everything needed to restore humidity after a load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumiditySnapshot {
    pub rooms: Vec<SavedRoom>,
    pub outdoors: HumidityData,
}
