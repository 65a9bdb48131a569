//! Water network settlement - storages feed consumers in priority order.
//!
//! Each tick, every consumer in turn builds a draw plan against the
//! storages (first storage that can cover the rest wins, otherwise drain
//! and move on). The plan is committed only if the consumer accepts what
//! it would receive; a rejected plan leaves every storage untouched.

use serde::{Deserialize, Serialize};

/// A tank holding whole units of water.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageNode {
    pub water: i32,
}

impl StorageNode {
    pub fn new(water: i32) -> Self {
        Self { water }
    }

    /// Raw withdrawal. Overdrawing logs a warning and still subtracts, so a
    /// caller bypassing the network can drive the stock negative.
    pub fn draw_water(&mut self, drawing: i32) {
        if drawing > self.water {
            log::warn!(
                "Tried to draw {} water from a storage holding {}",
                drawing,
                self.water
            );
        }
        self.water = self.water.saturating_sub(drawing);
    }

    /// Add produced water (rain, pumps). Saturates at `i32::MAX`.
    pub fn collect(&mut self, amount: i32) {
        self.water = self.water.saturating_add(amount.max(0));
    }
}

/// How a consumer judges the amount it was offered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumePolicy {
    /// Satisfied only when offered strictly more than the draw. An exact
    /// match counts as a failure.
    #[default]
    StrictlyAbove,
    /// Satisfied when offered at least the draw.
    AtLeast,
}

/// A fixture drawing water every tick while enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerNode {
    /// Units requested per tick.
    pub water_draw: i32,
    pub enabled: bool,
    /// Result of the last settlement.
    pub has_water: bool,
    pub policy: ConsumePolicy,
}

impl ConsumerNode {
    pub fn new(water_draw: i32) -> Self {
        Self {
            water_draw,
            enabled: true,
            has_water: false,
            policy: ConsumePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ConsumePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Anything the network can offer water to.
pub trait WaterSink {
    /// Units wanted this tick. Zero skips planning.
    fn needed_water(&self) -> i32;
    /// Offer `water` units; returns whether the sink is satisfied.
    fn consume(&mut self, water: i32) -> bool;
}

impl WaterSink for ConsumerNode {
    fn needed_water(&self) -> i32 {
        if self.enabled {
            self.water_draw
        } else {
            0
        }
    }

    fn consume(&mut self, water: i32) -> bool {
        self.has_water = match self.policy {
            ConsumePolicy::StrictlyAbove => water > self.water_draw,
            ConsumePolicy::AtLeast => water >= self.water_draw,
        };
        self.has_water
    }
}

/// Proposed debits for one consumer, keyed by storage handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawPlan<K> {
    pub draws: Vec<(K, i32)>,
    /// Part of the need no storage could cover.
    pub unmet: i32,
}

impl<K> DrawPlan<K> {
    /// Plan for a consumer that needs nothing.
    pub fn empty() -> Self {
        Self {
            draws: Vec::new(),
            unmet: 0,
        }
    }

    /// Amount the consumer would receive if this plan were committed.
    pub fn received(&self, need: i32) -> i32 {
        need - self.unmet
    }

    /// Total units the plan debits.
    pub fn total(&self) -> i32 {
        self.draws.iter().map(|(_, amount)| amount).sum()
    }
}

/// Build a draw plan over `(handle, stock)` pairs in storage order.
///
/// The first storage holding strictly more than the remaining need covers
/// it alone. Otherwise any positive stock is drained and the scan goes on.
pub fn plan_draw<K>(storages: impl IntoIterator<Item = (K, i32)>, need: i32) -> DrawPlan<K> {
    let mut draw = need;
    let mut draws = Vec::new();
    for (key, water) in storages {
        if water > draw {
            draws.push((key, draw));
            draw = 0;
            break;
        }
        if water > 0 {
            draws.push((key, water));
            draw -= water;
        }
    }
    DrawPlan {
        draws,
        unmet: draw,
    }
}

/// Outcome of one settlement pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettleReport {
    pub satisfied: u32,
    pub unsatisfied: u32,
    /// Units actually withdrawn from storage.
    pub drawn: i64,
}

impl SettleReport {
    pub fn merge(&mut self, other: &SettleReport) {
        self.satisfied += other.satisfied;
        self.unsatisfied += other.unsatisfied;
        self.drawn += other.drawn;
    }
}

/// Settle one network held in plain slices. Consumers are served in slice
/// order; stocks are re-read for each consumer so earlier commits count.
pub fn settle<C: WaterSink>(storages: &mut [StorageNode], consumers: &mut [C]) -> SettleReport {
    let mut report = SettleReport::default();
    for consumer in consumers.iter_mut() {
        let need = consumer.needed_water();
        let plan = if need != 0 {
            plan_draw(storages.iter().map(|s| s.water).enumerate(), need)
        } else {
            DrawPlan::empty()
        };

        if consumer.consume(plan.received(need)) {
            for &(idx, amount) in &plan.draws {
                storages[idx].draw_water(amount);
            }
            report.satisfied += 1;
            report.drawn += plan.total() as i64;
        } else {
            report.unsatisfied += 1;
        }
    }
    report
}

/// Water a rain collector gathers in one tick, rounded half-to-even.
pub fn rain_collection(per_tick: i32, rain_rate: f32) -> i32 {
    (per_tick as f32 * rain_rate).round_ties_even() as i32
}
