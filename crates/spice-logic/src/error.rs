//! Integration errors surfaced by direct indexed access.
//!
//! Ticks never fail. These only come back when a caller names a network or
//! room that does not exist, which is a bookkeeping bug on the host side.

use crate::topology::RoomId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpiceError {
    /// No water network at this index.
    UnknownNetwork(usize),
    /// Room is not tracked by the humidity manager.
    UnknownRoom(RoomId),
    /// Room was registered twice.
    DuplicateRoom(RoomId),
}

impl std::fmt::Display for SpiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpiceError::UnknownNetwork(idx) => write!(f, "No water network at index {}", idx),
            SpiceError::UnknownRoom(room) => write!(f, "No humidity data for {}", room),
            SpiceError::DuplicateRoom(room) => write!(f, "{} is already tracked", room),
        }
    }
}

impl std::error::Error for SpiceError {}
