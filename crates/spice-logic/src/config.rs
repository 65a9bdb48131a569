//! Tuning constants for water and humidity simulation.
//!
//! Every field has a default matching the shipped balance. Hosts can
//! override any subset from JSON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};

/// All tunable constants, grouped by subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpiceConfig {
    // ── Humidity topology ──
    /// Leak weight added per unsealed boundary link.
    pub door_leakage_per_tick: f32,
    /// Open-roof cells are divided by this before joining outside leakage.
    pub open_roof_divisor: f32,
    /// Upper bound on a room's outside leakage.
    pub max_outside_leakage: f32,
    /// Blend indoor rooms toward outdoor humidity by their outside leakage
    /// each tick. Off by default: outside leakage is descriptive only.
    pub apply_outside_leakage: bool,

    // ── Tile equilibrium ──
    pub rainfall_divisor: f32,
    pub rainfall_weight: f32,
    /// Temperature at which the temperature term reaches zero.
    pub temperature_reference: f32,
    pub temperature_weight: f32,
    /// Highest hilliness ordinal.
    pub hilliness_divisor: f32,
    pub hilliness_weight: f32,

    // ── Water ──
    /// Units a rain collector gathers per tick at rain rate 1.0.
    pub rain_collection_per_tick: i32,

    // ── Thirst ──
    /// Fraction of dehydration left after the humidity discount.
    pub humidity_thirst_factor: f32,
    /// Ticks between two thirst need intervals.
    pub need_interval_ticks: f32,
    /// Base dehydration severity gained or lost per interval.
    pub dehydration_severity_base: f32,
}

impl Default for SpiceConfig {
    fn default() -> Self {
        Self {
            door_leakage_per_tick: 0.001,
            open_roof_divisor: 10.0,
            max_outside_leakage: 1.0,
            apply_outside_leakage: false,
            rainfall_divisor: 1.12,
            rainfall_weight: 0.75,
            temperature_reference: 50.0,
            temperature_weight: 0.05,
            hilliness_divisor: 5.0,
            hilliness_weight: 0.2,
            rain_collection_per_tick: 1,
            humidity_thirst_factor: 0.75,
            need_interval_ticks: 150.0,
            dehydration_severity_base: 0.001_133_333,
        }
    }
}

impl SpiceConfig {
    /// Parse a (possibly partial) JSON override.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
