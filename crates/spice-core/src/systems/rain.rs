//! Rain collection - tanks with a collector fill up while it rains.

use hecs::World;
use serde::{Deserialize, Serialize};
use spice_logic::water::rain_collection;

use crate::components::{RainCollector, WaterStorage};

/// Current map weather, as far as water is concerned
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherState {
    /// Precipitation intensity (0 = clear)
    pub rain_rate: f32,
    /// Explicit water generation rate for special weathers (e.g. fog nets)
    pub water_rate: Option<f32>,
}

impl WeatherState {
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn rain(rain_rate: f32) -> Self {
        Self {
            rain_rate,
            water_rate: None,
        }
    }

    /// Collection rate this weather implies, or `None` to keep the last one.
    pub fn collection_rate(&self) -> Option<f32> {
        match self.water_rate {
            Some(rate) => Some(rate),
            None if self.rain_rate > 0.0 => Some(self.rain_rate),
            None => None,
        }
    }
}

/// Sample the weather into every collector (long-interval update)
pub fn refresh_rain_rates(world: &mut World, weather: &WeatherState) {
    let Some(rate) = weather.collection_rate() else {
        return;
    };
    for (_, collector) in world.query_mut::<&mut RainCollector>() {
        collector.rain_rate = rate;
    }
}

/// Add this tick's rain to every collecting tank. Returns total collected.
pub fn collect_rain(world: &mut World, per_tick: i32) -> i64 {
    let mut total: i64 = 0;
    for (_, (storage, collector)) in world.query_mut::<(&mut WaterStorage, &RainCollector)>() {
        let amount = rain_collection(per_tick, collector.rain_rate);
        storage.node.collect(amount);
        total = total.saturating_add(amount.max(0) as i64);
    }
    total
}
