//! Room boundary graph and world-tile climate - the inputs the host map
//! hands over whenever a room forms or changes shape.
//!
//! Nothing here is queried during a tick. The host builds a `RoomTopology`
//! snapshot at a phase boundary and passes it to the humidity code, which
//! derives leak weights from it and then forgets it.

use serde::{Deserialize, Serialize};

/// Stable identifier for an enclosed room.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct RoomId(pub u32);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

/// One side of a boundary link between two map regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSide {
    /// Room owning the region on this side. `None` is the exterior.
    pub room: Option<RoomId>,
    /// Whether the region on this side is a doorway.
    pub doorway: bool,
    /// Whether the doorway carries a humidity seal.
    pub sealed: bool,
}

impl LinkSide {
    /// A plain (non-doorway) region of `room`.
    pub fn open(room: Option<RoomId>) -> Self {
        Self {
            room,
            doorway: false,
            sealed: false,
        }
    }

    /// An unsealed doorway region of `room`.
    pub fn door(room: Option<RoomId>) -> Self {
        Self {
            room,
            doorway: true,
            sealed: false,
        }
    }

    /// A doorway fitted with a humidity seal.
    pub fn sealed_door(room: Option<RoomId>) -> Self {
        Self {
            room,
            doorway: true,
            sealed: true,
        }
    }

    /// A side blocks humidity unless it is an unsealed doorway.
    pub fn blocks_humidity(&self) -> bool {
        !self.doorway || self.sealed
    }
}

/// A link between two adjacent regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryLink {
    pub a: LinkSide,
    pub b: LinkSide,
}

impl BoundaryLink {
    pub fn new(a: LinkSide, b: LinkSide) -> Self {
        Self { a, b }
    }

    /// Both sides belong to `room`.
    pub fn is_internal(&self, room: RoomId) -> bool {
        self.a.room == Some(room) && self.b.room == Some(room)
    }

    /// Humidity crosses the link unless both sides block it.
    pub fn leaks(&self) -> bool {
        !(self.a.blocks_humidity() && self.b.blocks_humidity())
    }

    /// The room across the link as seen from `room`. `None` is the exterior.
    pub fn other_side(&self, room: RoomId) -> Option<RoomId> {
        if self.a.room == Some(room) {
            self.b.room
        } else {
            self.a.room
        }
    }
}

/// Boundary snapshot of one room, supplied by the host map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomTopology {
    pub room: RoomId,
    /// Every link touching one of the room's regions, in map order.
    pub links: Vec<BoundaryLink>,
    /// Cells of the room with no roof overhead.
    pub open_roof_count: u32,
    /// Total cells in the room.
    pub cell_count: u32,
    /// Room is exposed enough that it uses outdoor conditions.
    pub uses_outdoor_conditions: bool,
}

impl RoomTopology {
    pub fn new(room: RoomId, cell_count: u32) -> Self {
        Self {
            room,
            cell_count,
            ..Default::default()
        }
    }

    /// Builder-style helper for attaching a link.
    pub fn with_link(mut self, link: BoundaryLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn with_open_roof(mut self, cells: u32) -> Self {
        self.open_roof_count = cells;
        self
    }

    pub fn with_outdoor_conditions(mut self, outdoor: bool) -> Self {
        self.uses_outdoor_conditions = outdoor;
        self
    }
}

/// Terrain roughness of a world tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Hilliness {
    #[default]
    Undefined = 0,
    Flat = 1,
    SmallHills = 2,
    LargeHills = 3,
    Mountainous = 4,
    Impassable = 5,
}

impl Hilliness {
    pub fn from_u8(val: u8) -> Self {
        match val {
            1 => Hilliness::Flat,
            2 => Hilliness::SmallHills,
            3 => Hilliness::LargeHills,
            4 => Hilliness::Mountainous,
            5 => Hilliness::Impassable,
            _ => Hilliness::Undefined,
        }
    }
}

/// Climate of the world tile the map sits on.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TileClimate {
    /// Annual rainfall.
    pub rainfall: f32,
    /// Average temperature in Celsius.
    pub temperature: f32,
    pub hilliness: Hilliness,
}
