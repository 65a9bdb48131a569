//! Per-room humidity - leak weights, one-way diffusion, tile equilibrium.
//!
//! Each room stores its own outgoing leak weight to every neighbour it
//! shares an unsealed boundary with, plus a weight toward the exterior.
//! During a tick a room only ever pushes moisture into drier neighbours;
//! it never pulls. Pushes mutate the neighbour immediately, so rooms
//! processed later in the same pass see the updated value.

use serde::{Deserialize, Serialize};

use crate::config::SpiceConfig;
use crate::topology::{RoomId, RoomTopology, TileClimate};

/// Humidity state of one room (or of the outdoors).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumidityData {
    /// Current humidity (0.0 = bone dry, 1.0 = saturated).
    pub current_humidity: f32,
    /// Climate-derived target, read by thirst; diffusion ignores it.
    pub equilibrium: f32,
    /// Outgoing leak weight per neighbour, in first-seen link order.
    pub leakage: Vec<(RoomId, f32)>,
    /// Leak weight toward the exterior, at most `max_outside_leakage`.
    pub outside_leakage: f32,
}

/// Mutable access to neighbouring rooms' humidity during a tick.
pub trait HumiditySource {
    /// Humidity value that stands in for `room`. Rooms the source does not
    /// track resolve to whatever it uses for the exterior.
    fn humidity_mut(&mut self, room: RoomId) -> &mut f32;
}

impl HumidityData {
    pub fn new(equilibrium: f32) -> Self {
        Self {
            equilibrium,
            ..Default::default()
        }
    }

    /// Outdoor data: starts at its own equilibrium.
    pub fn outdoors(equilibrium: f32) -> Self {
        Self {
            current_humidity: equilibrium,
            equilibrium,
            ..Default::default()
        }
    }

    /// Rebuild leak weights from the room's boundary. Current humidity is
    /// left as is.
    pub fn calculate_leakage(&mut self, topology: &RoomTopology, config: &SpiceConfig) {
        let room = topology.room;
        self.leakage.clear();
        self.outside_leakage = 0.0;

        for link in &topology.links {
            if link.is_internal(room) || !link.leaks() {
                continue;
            }

            match link.other_side(room) {
                None => self.outside_leakage += config.door_leakage_per_tick,
                Some(other) => self.add_leakage(other, config.door_leakage_per_tick),
            }
        }

        if topology.open_roof_count > 0 {
            self.outside_leakage += topology.open_roof_count as f32 / config.open_roof_divisor;
        }
        self.outside_leakage = self.outside_leakage.min(config.max_outside_leakage);

        // A weight above 1 would overshoot the neighbour and leave [0, 1].
        for (_, weight) in &mut self.leakage {
            *weight = weight.min(config.max_outside_leakage);
        }
    }

    fn add_leakage(&mut self, other: RoomId, weight: f32) {
        if let Some((_, existing)) = self.leakage.iter_mut().find(|(id, _)| *id == other) {
            *existing += weight;
        } else {
            self.leakage.push((other, weight));
        }
    }

    /// Leak weight toward `room`, zero if not adjacent.
    pub fn leakage_to(&self, room: RoomId) -> f32 {
        self.leakage
            .iter()
            .find(|(id, _)| *id == room)
            .map(|&(_, weight)| weight)
            .unwrap_or(0.0)
    }

    /// Move a fraction `weight` of the way toward `reference`.
    pub fn blend_toward(&mut self, reference: f32, weight: f32) {
        self.current_humidity += (reference - self.current_humidity) * weight;
    }

    /// One diffusion step for this room. `room` is `None` when this data is
    /// the exterior itself, which blends toward `outside_humidity` instead
    /// of pushing.
    pub fn tick<S: HumiditySource>(
        &mut self,
        neighbours: &mut S,
        room: Option<RoomId>,
        outside_humidity: f32,
    ) {
        for &(other, weight) in &self.leakage {
            if room.is_none() {
                self.current_humidity += (outside_humidity - self.current_humidity) * weight;
                continue;
            }

            let target = neighbours.humidity_mut(other);
            push_humidity(&mut self.current_humidity, target, weight);
        }
    }
}

/// Push moisture from `source` into a drier `target`. Returns the amount
/// moved; nothing moves when `source` is not strictly wetter.
pub fn push_humidity(source: &mut f32, target: &mut f32, weight: f32) -> f32 {
    if *target < *source {
        let change = (*source - *target) * weight;
        *source -= change;
        *target += change;
        change
    } else {
        0.0
    }
}

/// Humidity equilibrium of a world tile, clamped to [0, 1].
pub fn tile_humidity(climate: &TileClimate, config: &SpiceConfig) -> f32 {
    let rain = climate.rainfall / config.rainfall_divisor * config.rainfall_weight;
    let heat =
        (1.0 - climate.temperature / config.temperature_reference) * config.temperature_weight;
    let hills = climate.hilliness as u8 as f32 / config.hilliness_divisor * config.hilliness_weight;
    (rain + heat + hills).clamp(0.0, 1.0)
}
