//! Thirst coupling - how room humidity slows dehydration, and how a
//! breathing colonist puts moisture back into the room.

use crate::config::SpiceConfig;

/// Thirst thresholds scale off the race's "wants to eat" food level.
pub const THIRSTY_FACTOR: f32 = 0.8;
pub const URGENTLY_THIRSTY_FACTOR: f32 = 0.4;

/// Dehydration jitter bounds; each colonist sits somewhere in between.
pub const SEVERITY_JITTER_MIN: f32 = 0.8;
pub const SEVERITY_JITTER_MAX: f32 = 1.2;

/// Water need lost per tick. Humid air cuts it down; saturated air stops it.
pub fn dehydration_rate(base_rate: f32, humidity: f32, config: &SpiceConfig) -> f32 {
    base_rate * (1.0 - humidity.clamp(0.0, 1.0)) * config.humidity_thirst_factor
}

/// Need lost over one need interval.
pub fn water_lost_per_interval(rate: f32, config: &SpiceConfig) -> f32 {
    rate * config.need_interval_ticks
}

/// Humidity added to a room when `lost` water is exhaled into it.
pub fn moisture_for_room(lost: f32, cell_count: u32) -> f32 {
    if cell_count == 0 {
        0.0
    } else {
        lost / cell_count as f32
    }
}

pub fn thirsty_threshold(want_eat_level: f32) -> f32 {
    want_eat_level * THIRSTY_FACTOR
}

pub fn urgently_thirsty_threshold(want_eat_level: f32) -> f32 {
    want_eat_level * URGENTLY_THIRSTY_FACTOR
}

/// Severity change per interval. `jitter` in [0, 1) is a per-colonist
/// stable value that spreads colonists between the jitter bounds.
pub fn dehydration_severity_per_interval(jitter: f32, config: &SpiceConfig) -> f32 {
    let t = jitter.clamp(0.0, 1.0);
    config.dehydration_severity_base
        * (SEVERITY_JITTER_MIN + (SEVERITY_JITTER_MAX - SEVERITY_JITTER_MIN) * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humidity_slows_dehydration() {
        let config = SpiceConfig::default();
        let dry = dehydration_rate(1.0, 0.0, &config);
        let humid = dehydration_rate(1.0, 0.5, &config);
        assert!((dry - 0.75).abs() < 1e-6);
        assert!(humid < dry);
        assert_eq!(dehydration_rate(1.0, 1.0, &config), 0.0);
    }

    #[test]
    fn test_dehydration_rate_clamps_humidity() {
        let config = SpiceConfig::default();
        assert_eq!(dehydration_rate(1.0, 3.0, &config), 0.0);
        assert!((dehydration_rate(1.0, -1.0, &config) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_water_lost_per_interval() {
        let config = SpiceConfig::default();
        assert!((water_lost_per_interval(0.001, &config) - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_moisture_spread_over_cells() {
        assert!((moisture_for_room(1.0, 4) - 0.25).abs() < 1e-6);
        assert_eq!(moisture_for_room(1.0, 0), 0.0);
    }

    #[test]
    fn test_thresholds() {
        assert!((thirsty_threshold(0.5) - 0.4).abs() < 1e-6);
        assert!((urgently_thirsty_threshold(0.5) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_severity_jitter_bounds() {
        let config = SpiceConfig::default();
        let low = dehydration_severity_per_interval(0.0, &config);
        let high = dehydration_severity_per_interval(1.0, &config);
        assert!((low - 0.001_133_333 * 0.8).abs() < 1e-9);
        assert!((high - 0.001_133_333 * 1.2).abs() < 1e-9);
        let mid = dehydration_severity_per_interval(0.5, &config);
        assert!(low < mid && mid < high);
    }
}
