//! Water networks - settlement over ECS-hosted tanks and fixtures.
//!
//! A `WaterNet` holds entity handles only; the stock and demand live on
//! `WaterStorage` / `WaterConsumer` components in the world. Each consumer
//! builds a `Withdrawal` against the current stocks and only commits it if
//! the consumer accepts the amount offered.

use std::collections::{HashMap, HashSet, VecDeque};

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use spice_logic::error::SpiceError;
use spice_logic::water::{plan_draw, DrawPlan, SettleReport, WaterSink};

use crate::components::{Name, RainCollector, WaterConsumer, WaterStorage};

/// Pending debits for one consumer. Dropping it without `commit` is a discard.
#[derive(Debug)]
#[must_use = "a withdrawal does nothing until committed"]
pub struct Withdrawal {
    plan: DrawPlan<Entity>,
}

impl Withdrawal {
    /// Plan `need` units against `storages` as they stand right now.
    pub fn plan(world: &World, storages: &[Entity], need: i32) -> Self {
        if need == 0 {
            return Self {
                plan: DrawPlan::empty(),
            };
        }
        let stocks = storages.iter().map(|&entity| {
            let water = world
                .get::<&WaterStorage>(entity)
                .map(|s| s.water())
                .unwrap_or(0);
            (entity, water)
        });
        Self {
            plan: plan_draw(stocks, need),
        }
    }

    /// Amount the consumer would receive.
    pub fn received(&self, need: i32) -> i32 {
        self.plan.received(need)
    }

    pub fn draws(&self) -> &[(Entity, i32)] {
        &self.plan.draws
    }

    /// Apply every planned debit. Returns the units withdrawn.
    pub fn commit(self, world: &mut World) -> i32 {
        let mut drawn = 0;
        for (entity, amount) in self.plan.draws {
            if let Ok(mut storage) = world.get::<&mut WaterStorage>(entity) {
                storage.node.draw_water(amount);
                drawn += amount;
            }
        }
        drawn
    }

    pub fn discard(self) {}
}

/// One connected set of tanks and fixtures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaterNet {
    /// Tanks in draw order
    pub storages: Vec<Entity>,
    /// Fixtures in service order
    pub consumers: Vec<Entity>,
}

impl WaterNet {
    pub fn new(storages: Vec<Entity>, consumers: Vec<Entity>) -> Self {
        Self {
            storages,
            consumers,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.storages.is_empty() && self.consumers.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.storages.contains(&entity) || self.consumers.contains(&entity)
    }

    /// Water currently held across all tanks.
    pub fn stored(&self, world: &World) -> i64 {
        self.storages
            .iter()
            .filter_map(|&e| world.get::<&WaterStorage>(e).ok().map(|s| s.water() as i64))
            .sum()
    }

    /// Serve every consumer once, in order.
    pub fn tick(&self, world: &mut World) -> SettleReport {
        let mut report = SettleReport::default();

        for &consumer in &self.consumers {
            let need = match world.get::<&WaterConsumer>(consumer) {
                Ok(c) => c.node.needed_water(),
                Err(_) => continue,
            };

            let withdrawal = Withdrawal::plan(world, &self.storages, need);
            let received = withdrawal.received(need);

            let satisfied = match world.get::<&mut WaterConsumer>(consumer) {
                Ok(mut c) => c.node.consume(received),
                Err(_) => false,
            };

            if satisfied {
                report.drawn += withdrawal.commit(world) as i64;
                report.satisfied += 1;
            } else {
                withdrawal.discard();
                report.unsatisfied += 1;
            }
        }

        report
    }
}

/// All water networks on a map, plus the pipe links they were built from
#[derive(Debug, Clone, Default)]
pub struct WaterManager {
    nets: Vec<WaterNet>,
    pipes: Vec<(Entity, Entity)>,
}

impl WaterManager {
    pub fn new() -> Self {
        Self {
            nets: Vec::new(),
            pipes: Vec::new(),
        }
    }

    pub fn pipes(&self) -> &[(Entity, Entity)] {
        &self.pipes
    }

    pub fn nets(&self) -> &[WaterNet] {
        &self.nets
    }

    pub fn len(&self) -> usize {
        self.nets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nets.is_empty()
    }

    /// Direct indexed access. A stale index is a host bookkeeping bug.
    pub fn net(&self, index: usize) -> Result<&WaterNet, SpiceError> {
        self.nets.get(index).ok_or(SpiceError::UnknownNetwork(index))
    }

    pub fn net_mut(&mut self, index: usize) -> Result<&mut WaterNet, SpiceError> {
        self.nets
            .get_mut(index)
            .ok_or(SpiceError::UnknownNetwork(index))
    }

    /// Register a network; empty ones are ignored. Returns its index.
    pub fn add_net(&mut self, net: WaterNet) -> Option<usize> {
        if net.is_empty() {
            return None;
        }
        self.nets.push(net);
        Some(self.nets.len() - 1)
    }

    /// Index of the network containing `entity`.
    pub fn net_for(&self, entity: Entity) -> Option<usize> {
        self.nets.iter().position(|net| net.contains(entity))
    }

    /// Lay a pipe between two nodes and rebuild.
    pub fn connect(&mut self, world: &World, a: Entity, b: Entity) {
        self.pipes.push((a, b));
        self.rebuild_from_pipes(world);
    }

    /// Drop `entity` and its pipes from every network, then drop networks
    /// left empty. Does not re-split what the removed node was joining; call
    /// `rebuild_from_pipes` for that.
    pub fn remove_node(&mut self, entity: Entity) {
        self.pipes.retain(|&(a, b)| a != entity && b != entity);
        for net in &mut self.nets {
            net.storages.retain(|&e| e != entity);
            net.consumers.retain(|&e| e != entity);
        }
        self.nets.retain(|net| !net.is_empty());
    }

    /// Replace the pipe list and rebuild every network from it.
    pub fn rebuild(&mut self, world: &World, pipes: &[(Entity, Entity)]) {
        self.pipes = pipes.to_vec();
        self.rebuild_from_pipes(world);
    }

    /// Rebuild every network from the current pipe list.
    ///
    /// Each connected component of water nodes becomes one network. Tanks
    /// and fixtures are ordered by priority, then by entity id. Networks are
    /// ordered by their lowest entity id.
    pub fn rebuild_from_pipes(&mut self, world: &World) {
        let mut nodes: HashSet<Entity> = HashSet::new();
        for (entity, _) in world.query::<&WaterStorage>().iter() {
            nodes.insert(entity);
        }
        for (entity, _) in world.query::<&WaterConsumer>().iter() {
            nodes.insert(entity);
        }

        let mut adj: HashMap<Entity, Vec<Entity>> = HashMap::new();
        for &(a, b) in &self.pipes {
            if nodes.contains(&a) && nodes.contains(&b) {
                adj.entry(a).or_default().push(b);
                adj.entry(b).or_default().push(a);
            }
        }

        let mut ordered: Vec<Entity> = nodes.into_iter().collect();
        ordered.sort_by_key(|e| e.id());

        let mut visited: HashSet<Entity> = HashSet::new();
        let mut nets = Vec::new();
        for &start in &ordered {
            if !visited.insert(start) {
                continue;
            }
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for &next in adj.get(&current).map(|v| v.as_slice()).unwrap_or(&[]) {
                    if visited.insert(next) {
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
            nets.push(build_net(world, component));
        }

        log::info!("Rebuilt water networks: {} formed", nets.len());
        self.nets = nets;
        self.nets.retain(|net| !net.is_empty());
    }

    /// Settle every network once, in insertion order.
    pub fn tick(&self, world: &mut World) -> SettleReport {
        let mut report = SettleReport::default();
        for net in &self.nets {
            report.merge(&net.tick(world));
        }
        log::debug!(
            "Water tick: {} satisfied, {} unsatisfied, {} drawn",
            report.satisfied,
            report.unsatisfied,
            report.drawn
        );
        report
    }

    /// Plain-data copy of every water node and network membership.
    pub fn snapshot(&self, world: &World) -> WaterSnapshot {
        let mut nodes = Vec::new();
        let mut index: HashMap<Entity, usize> = HashMap::new();

        let mut entities: Vec<Entity> = world
            .iter()
            .map(|e| e.entity())
            .filter(|&e| {
                world.get::<&WaterStorage>(e).is_ok() || world.get::<&WaterConsumer>(e).is_ok()
            })
            .collect();
        entities.sort_by_key(|e| e.id());

        for entity in entities {
            index.insert(entity, nodes.len());
            nodes.push(SavedNode {
                storage: world.get::<&WaterStorage>(entity).ok().map(|c| *c),
                consumer: world.get::<&WaterConsumer>(entity).ok().map(|c| *c),
                rain: world.get::<&RainCollector>(entity).ok().map(|c| *c),
                name: world.get::<&Name>(entity).ok().map(|c| (*c).clone()),
            });
        }

        let nets = self
            .nets
            .iter()
            .map(|net| SavedNet {
                storages: net.storages.iter().filter_map(|e| index.get(e).copied()).collect(),
                consumers: net.consumers.iter().filter_map(|e| index.get(e).copied()).collect(),
            })
            .collect();

        let pipes = self
            .pipes
            .iter()
            .filter_map(|(a, b)| Some((*index.get(a)?, *index.get(b)?)))
            .collect();

        WaterSnapshot { nodes, nets, pipes }
    }

    /// Respawn saved nodes into `world` and rebuild membership in saved order.
    pub fn restore(world: &mut World, snapshot: WaterSnapshot) -> (Self, Vec<Entity>) {
        let mut spawned = Vec::with_capacity(snapshot.nodes.len());
        for node in snapshot.nodes {
            let entity = world.spawn(());
            if let Some(c) = node.storage {
                let _ = world.insert_one(entity, c);
            }
            if let Some(c) = node.consumer {
                let _ = world.insert_one(entity, c);
            }
            if let Some(c) = node.rain {
                let _ = world.insert_one(entity, c);
            }
            if let Some(c) = node.name {
                let _ = world.insert_one(entity, c);
            }
            spawned.push(entity);
        }

        let mut manager = Self::new();
        for net in snapshot.nets {
            let storages = net.storages.iter().filter_map(|&i| spawned.get(i).copied()).collect();
            let consumers = net.consumers.iter().filter_map(|&i| spawned.get(i).copied()).collect();
            let _ = manager.add_net(WaterNet::new(storages, consumers));
        }
        manager.pipes = snapshot
            .pipes
            .iter()
            .filter_map(|&(a, b)| Some((*spawned.get(a)?, *spawned.get(b)?)))
            .collect();
        (manager, spawned)
    }
}

fn build_net(world: &World, component: Vec<Entity>) -> WaterNet {
    let mut storages: Vec<(i32, u32, Entity)> = Vec::new();
    let mut consumers: Vec<(i32, u32, Entity)> = Vec::new();
    for entity in component {
        if let Ok(s) = world.get::<&WaterStorage>(entity) {
            storages.push((s.priority, entity.id(), entity));
        }
        if let Ok(c) = world.get::<&WaterConsumer>(entity) {
            consumers.push((c.priority, entity.id(), entity));
        }
    }
    storages.sort();
    consumers.sort();
    WaterNet::new(
        storages.into_iter().map(|(_, _, e)| e).collect(),
        consumers.into_iter().map(|(_, _, e)| e).collect(),
    )
}

/// Saved water node - every water-related component it carried
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedNode {
    pub storage: Option<WaterStorage>,
    pub consumer: Option<WaterConsumer>,
    pub rain: Option<RainCollector>,
    pub name: Option<Name>,
}

/// Saved network membership as indices into `WaterSnapshot::nodes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedNet {
    pub storages: Vec<usize>,
    pub consumers: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterSnapshot {
    pub nodes: Vec<SavedNode>,
    pub nets: Vec<SavedNet>,
    /// Pipe links as index pairs into `nodes`
    pub pipes: Vec<(usize, usize)>,
}
