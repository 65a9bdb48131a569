//! Water plumbing components - tanks, fixtures, rain collectors.

use serde::{Deserialize, Serialize};
use spice_logic::water::{ConsumePolicy, ConsumerNode, StorageNode};

/// A tank on a water network
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterStorage {
    pub node: StorageNode,
    /// Lower values are drawn from first when networks are rebuilt
    pub priority: i32,
}

impl WaterStorage {
    pub fn new(water: i32) -> Self {
        Self {
            node: StorageNode::new(water),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn water(&self) -> i32 {
        self.node.water
    }
}

/// A fixture drawing from a water network
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterConsumer {
    pub node: ConsumerNode,
    /// Lower values are served first when networks are rebuilt
    pub priority: i32,
}

impl WaterConsumer {
    pub fn new(water_draw: i32) -> Self {
        Self {
            node: ConsumerNode::new(water_draw),
            priority: 0,
        }
    }

    pub fn with_policy(mut self, policy: ConsumePolicy) -> Self {
        self.node.policy = policy;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn has_water(&self) -> bool {
        self.node.has_water
    }
}

/// Fills the tank on the same entity whenever it rains
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RainCollector {
    /// Last rain rate sampled from the weather (0 = dry)
    pub rain_rate: f32,
}
