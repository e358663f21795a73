//! The process-wide context. One [`Core`] is built at start-up and owns every
//! manager the features and macros share; nothing is looked up globally.

use crate::clock::Millis;
use crate::config::Config;
use crate::error::{ControlError, MacroError};
use crate::feature::{Failsafe, FeatureManager};
use crate::features::*;
use crate::graph::GraphStore;
use crate::macros::{CommissionMacro, MacroContext, MacroManager, MacroParams, MacroStatus, MiningMacro};
use crate::pathfinder::PathExecutor;
use crate::rotation::RotationController;
use crate::world::map::block_center;
use crate::world::{Command, EntityId, WorldEvent, WorldView};
use glam::{DVec3, IVec3};
use log::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Treasure chests waiting to be unlocked, fed from block changes.
#[derive(Debug, Default)]
pub struct ChestQueue {
    chests: VecDeque<IVec3>,
}

impl ChestQueue {
    pub fn push(&mut self, position: IVec3) {
        if !self.chests.contains(&position) {
            debug!("Chest queued at {}", position);
            self.chests.push_back(position);
        }
    }

    pub fn remove(&mut self, position: IVec3) {
        self.chests.retain(|chest| *chest != position);
    }

    /// Removes and returns the chest closest to `from`.
    pub fn pop_closest(&mut self, from: DVec3) -> Option<IVec3> {
        let idx = self
            .chests
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let a = a.as_dvec3().distance_squared(from);
                let b = b.as_dvec3().distance_squared(from);
                a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(idx, _)| idx)?;
        self.chests.remove(idx)
    }

    pub fn len(&self) -> usize {
        self.chests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chests.is_empty()
    }

    pub fn clear(&mut self) {
        self.chests.clear();
    }
}

/// Mobs recently given up on, skipped until their entry expires.
#[derive(Debug, Default)]
pub struct MobQueue {
    blacklist: HashMap<EntityId, Millis>,
}

impl MobQueue {
    pub fn blacklist(&mut self, id: EntityId, until: Millis) {
        self.blacklist.insert(id, until);
    }

    pub fn is_blacklisted(&self, id: EntityId, now: Millis) -> bool {
        self.blacklist.get(&id).map(|until| now < *until).unwrap_or(false)
    }

    pub fn prune(&mut self, now: Millis) {
        self.blacklist.retain(|_, until| now < *until);
    }

    pub fn clear(&mut self) {
        self.blacklist.clear();
    }
}

#[derive(Debug, Default)]
pub struct SharedQueues {
    pub chests: ChestQueue,
    pub mobs: MobQueue,
}

/// Everything a feature may act through during a tick.
pub struct Services {
    pub config: Config,
    pub rotation: RotationController,
    pub path: PathExecutor,
    pub commands: Vec<Command>,
    pub queues: SharedQueues,
    pub graphs: GraphStore,
}

impl Services {
    pub fn new(config: Config, rng: StdRng) -> Services {
        Services {
            rotation: RotationController::new(config.rotation.clone(), rng),
            path: PathExecutor::new(config.path.clone()),
            commands: Vec::new(),
            queues: SharedQueues::default(),
            graphs: GraphStore::new(),
            config,
        }
    }

    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }
}

pub struct TickContext<'a> {
    pub now: Millis,
    pub world: &'a dyn WorldView,
    pub services: &'a mut Services,
}

impl<'a> TickContext<'a> {
    pub fn new(now: Millis, world: &'a dyn WorldView, services: &'a mut Services) -> TickContext<'a> {
        TickContext { now, world, services }
    }

    pub fn push(&mut self, command: Command) {
        self.services.commands.push(command);
    }
}

pub struct Core {
    features: FeatureManager,
    macros: MacroManager,
    services: Services,
}

impl Core {
    /// Builds every feature and macro from `config`. The seed drives the
    /// humanisation jitter of the rotation controller.
    pub fn new(config: Config, seed: u64) -> Core {
        let mut features = FeatureManager::new();
        features.register(BlockMiner::new(config.miner.clone()));
        features.register(AutoInventory::new(config.inventory.clone()));
        features.register(AutoChestUnlocker::new(config.chest.clone()));
        features.register(AutoDrillRefuel::new(config.refuel.clone()));
        features.register(AutoSell::new(config.sell.clone()));
        features.register(AutoWarp::new(config.warp.clone()));
        features.register(AutoCommissionClaim::new(config.commission.clone()));
        features.register(RouteNavigator::new(config.navigator.clone()));
        features.register(AutoMobKiller::new(config.mob_killer.clone()));

        let mut macros = MacroManager::new();
        macros.register(MiningMacro::new(config.mining_macro.clone()));
        macros.register(CommissionMacro::new(config.commission_macro.clone()));

        Core {
            features,
            macros,
            services: Services::new(config, StdRng::seed_from_u64(seed)),
        }
    }

    /// Runs one tick and returns the commands it produced, in order.
    pub fn tick(&mut self, now: Millis, world: &dyn WorldView) -> Vec<Command> {
        let mut ctx = MacroContext {
            now,
            world,
            features: &mut self.features,
            services: &mut self.services,
        };
        self.macros.on_tick(&mut ctx);

        let mut ctx = TickContext::new(now, world, &mut self.services);
        self.features.on_tick(&mut ctx);

        let services = &mut self.services;
        services.queues.mobs.prune(now);
        services.path.on_tick(now, world, &mut services.rotation, &mut services.commands);
        services.rotation.on_tick(now, world, &mut services.commands);
        if services.graphs.is_recording() {
            services.graphs.record(world.position());
        }
        std::mem::take(&mut services.commands)
    }

    /// Delivers an adapter event: chests are queued first, then the active
    /// macro and the running features see it.
    pub fn dispatch(&mut self, now: Millis, world: &dyn WorldView, event: &WorldEvent) {
        if let WorldEvent::BlockChange { position, state } = event {
            let chest = &self.services.config.chest;
            if chest.chest_state_ids.contains(&state.id)
                && block_center(*position).distance(world.eye_position()) <= chest.detection_radius
            {
                self.services.queues.chests.push(*position);
            }
        }
        self.macros.on_event(event);
        self.features.on_event(event, now);
    }

    pub fn start_macro(&mut self, now: Millis, world: &dyn WorldView, params: MacroParams) -> Result<(), MacroError> {
        let mut ctx = MacroContext {
            now,
            world,
            features: &mut self.features,
            services: &mut self.services,
        };
        self.macros.start(params, &mut ctx)
    }

    pub fn stop_macro(&mut self) -> Result<(), MacroError> {
        self.macros.stop(&mut self.features, &mut self.services)
    }

    pub fn pause_macro(&mut self, now: Millis) -> Result<(), MacroError> {
        self.macros.pause(now, &mut self.features, &mut self.services)
    }

    pub fn resume_macro(&mut self, now: Millis) -> Result<(), MacroError> {
        self.macros.resume(now, &mut self.features, &mut self.services)
    }

    pub fn status(&self, now: Millis) -> MacroStatus {
        self.macros.status(now, &self.features)
    }

    pub fn start_miner(&mut self, params: MinerParams, world: &dyn WorldView) -> Result<(), ControlError> {
        let miner = self
            .features
            .get_mut::<BlockMiner>()
            .ok_or_else(|| ControlError::UnknownFeature(BlockMiner::NAME.to_string()))?;
        Ok(miner.start(params, world)?)
    }

    pub fn start_mob_killer(&mut self, params: MobKillerParams, world: &dyn WorldView) -> Result<(), ControlError> {
        let killer = self
            .features
            .get_mut::<AutoMobKiller>()
            .ok_or_else(|| ControlError::UnknownFeature(AutoMobKiller::NAME.to_string()))?;
        Ok(killer.start(params, world)?)
    }

    pub fn start_chest_unlocker(&mut self, params: UnlockerParams, world: &dyn WorldView) -> Result<(), ControlError> {
        let unlocker = self
            .features
            .get_mut::<AutoChestUnlocker>()
            .ok_or_else(|| ControlError::UnknownFeature(AutoChestUnlocker::NAME.to_string()))?;
        Ok(unlocker.start(params, world)?)
    }

    pub fn stop_feature(&mut self, name: &str) -> Result<(), ControlError> {
        if self.features.by_name(name).is_none() {
            return Err(ControlError::UnknownFeature(name.to_string()));
        }
        self.features.stop(name, &mut self.services);
        Ok(())
    }

    pub fn failsafes_to_ignore(&self) -> BTreeSet<Failsafe> {
        self.features.failsafes_to_ignore()
    }

    pub fn features(&self) -> &FeatureManager {
        &self.features
    }

    pub fn macros(&self) -> &MacroManager {
        &self.macros
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut Services {
        &mut self.services
    }

    pub fn graphs(&self) -> &GraphStore {
        &self.services.graphs
    }

    pub fn graphs_mut(&mut self) -> &mut GraphStore {
        &mut self.services.graphs
    }
}
