use super::{Macro, MacroBase, MacroContext, MacroParams};
use crate::config::MiningMacroConfig;
use crate::error::MacroError;
use crate::feature::{Feature, FeatureManager};
use crate::features::{
    AutoChestUnlocker, AutoDrillRefuel, AutoInventory, AutoSell, BlockMiner, BlockMinerError, MinerParams, RefuelParams,
    UnlockerParams,
};
use crate::world::MouseButton;
use log::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiningState {
    Initialization,
    GettingStats,
    Mining,
    UnlockingChests,
    Refueling,
    Selling,
}

/// Reads the mining speed, then mines. Chests, refuels and selling are
/// interleaved by pausing the miner.
pub struct MiningMacro {
    base: MacroBase,
    config: MiningMacroConfig,
    state: MiningState,
    params: Option<MinerParams>,
    stat_attempts: u32,
    mining_speed: f64,
    miner_started: bool,
    can_refuel: bool,
    restarts: u64,
    idle_restarts: u32,
    mined_at_restart: u64,
}

const FEATURES: &[&str] = &[
    BlockMiner::NAME,
    AutoInventory::NAME,
    AutoChestUnlocker::NAME,
    AutoDrillRefuel::NAME,
    AutoSell::NAME,
];

fn not_registered(name: &str) -> String {
    format!("feature {} is not registered", name)
}

impl MiningMacro {
    pub const NAME: &'static str = "MiningMacro";

    pub fn new(config: MiningMacroConfig) -> MiningMacro {
        MiningMacro {
            base: MacroBase::new(Self::NAME, config.tick_delay),
            config,
            state: MiningState::Initialization,
            params: None,
            stat_attempts: 0,
            mining_speed: 0.0,
            miner_started: false,
            can_refuel: true,
            restarts: 0,
            idle_restarts: 0,
            mined_at_restart: 0,
        }
    }

    pub fn state(&self) -> MiningState {
        self.state
    }

    pub fn mining_speed(&self) -> f64 {
        self.mining_speed
    }

    fn fail(&mut self, ctx: &mut MacroContext, reason: String) {
        self.base.set_error(reason);
        self.stop(ctx.features, ctx.services);
    }

    fn set_state(&mut self, state: MiningState) {
        if state != self.state {
            debug!("MiningMacro: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn tool(&self) -> String {
        self.params.as_ref().map(|params| params.tool.clone()).unwrap_or_default()
    }

    fn start_inventory(&mut self, ctx: &mut MacroContext) {
        match ctx.features.get_mut::<AutoInventory>() {
            Some(inventory) => {
                inventory.start();
                self.set_state(MiningState::GettingStats);
            }
            None => self.fail(ctx, not_registered(AutoInventory::NAME)),
        }
    }

    fn getting_stats(&mut self, ctx: &mut MacroContext) {
        let (enabled, stats, error) = match ctx.features.get::<AutoInventory>() {
            Some(inventory) => (inventory.base().is_enabled(), inventory.stats(), inventory.error()),
            None => return self.fail(ctx, not_registered(AutoInventory::NAME)),
        };
        if enabled {
            return;
        }
        match stats {
            Some(stats) => {
                self.mining_speed = stats.mining_speed;
                self.stat_attempts = 0;
                self.miner_started = false;
                self.set_state(MiningState::Mining);
            }
            None => {
                self.stat_attempts += 1;
                let reason = error.map(|error| error.to_string()).unwrap_or_else(|| "no stats".to_string());
                if self.stat_attempts >= self.config.max_stat_attempts {
                    self.fail(ctx, format!("Could not read mining stats: {}", reason));
                } else {
                    warn!("Reading stats failed ({}), retrying", reason);
                    self.start_inventory(ctx);
                }
            }
        }
    }

    fn start_miner(&mut self, ctx: &mut MacroContext) {
        let mut params = match self.params.clone() {
            Some(params) => params,
            None => return self.fail(ctx, "no mining parameters".to_string()),
        };
        params.mining_speed = self.mining_speed;
        let world = ctx.world;
        let result = match ctx.features.get_mut::<BlockMiner>() {
            Some(miner) => miner.start(params, world),
            None => return self.fail(ctx, not_registered(BlockMiner::NAME)),
        };
        match result {
            Ok(()) => self.miner_started = true,
            Err(e) => self.fail(ctx, e.to_string()),
        }
    }

    fn pause_miner(&mut self, ctx: &mut MacroContext) {
        ctx.features.pause(BlockMiner::NAME, ctx.now, ctx.services);
    }

    fn resume_miner(&mut self, ctx: &mut MacroContext) {
        ctx.features.resume(BlockMiner::NAME, ctx.now, ctx.services);
        self.set_state(MiningState::Mining);
    }

    fn mining(&mut self, ctx: &mut MacroContext) {
        if !self.miner_started {
            return self.start_miner(ctx);
        }
        let (enabled, error, mined) = match ctx.features.get::<BlockMiner>() {
            Some(miner) => (miner.base().is_enabled(), miner.error(), miner.blocks_mined()),
            None => return self.fail(ctx, not_registered(BlockMiner::NAME)),
        };
        if !enabled {
            match error {
                Some(BlockMinerError::NoPointsFound) => {
                    if mined > self.mined_at_restart {
                        self.idle_restarts = 0;
                    }
                    self.mined_at_restart = mined;
                    self.restarts += 1;
                    self.idle_restarts += 1;
                    if self.idle_restarts > self.config.max_restarts {
                        self.fail(ctx, format!("No reachable blocks after {} restarts", self.config.max_restarts));
                    } else {
                        warn!("No reachable blocks left, starting over");
                        self.set_state(MiningState::Initialization);
                    }
                }
                Some(error) => self.fail(ctx, error.to_string()),
                None => self.fail(ctx, "the miner was stopped".to_string()),
            }
            return;
        }

        let world = ctx.world;
        let tool = self.tool();

        if self.config.unlock_chests && !ctx.services.queues.chests.is_empty() {
            self.pause_miner(ctx);
            let result = match ctx.features.get_mut::<AutoChestUnlocker>() {
                Some(unlocker) => unlocker.start(UnlockerParams::new(&tool, MouseButton::Left), world),
                None => return self.fail(ctx, not_registered(AutoChestUnlocker::NAME)),
            };
            match result {
                Ok(()) => self.set_state(MiningState::UnlockingChests),
                Err(e) => {
                    warn!("Skipping chests: {}", e);
                    ctx.services.queues.chests.clear();
                    self.resume_miner(ctx);
                }
            }
            return;
        }

        let fuel = world
            .inventory()
            .find_item(&tool)
            .and_then(|slot| world.inventory().item(slot))
            .and_then(|item| item.drill_fuel());
        if let Some((fuel, _)) = fuel.filter(|(fuel, _)| self.can_refuel && *fuel < self.config.refuel_threshold) {
            info!("Drill fuel is low ({}), refueling", fuel);
            self.pause_miner(ctx);
            let result = match ctx.features.get_mut::<AutoDrillRefuel>() {
                Some(refuel) => refuel.start(RefuelParams::new(&tool, &self.config.fuel_items), world),
                None => return self.fail(ctx, not_registered(AutoDrillRefuel::NAME)),
            };
            match result {
                Ok(()) => self.set_state(MiningState::Refueling),
                Err(e) => {
                    warn!("Cannot refuel ({}), mining on", e);
                    self.can_refuel = false;
                    self.resume_miner(ctx);
                }
            }
            return;
        }

        if world.inventory().is_full() {
            self.pause_miner(ctx);
            let result = match ctx.features.get_mut::<AutoSell>() {
                Some(sell) => sell.start(&self.config.sell_items, &tool, world),
                None => return self.fail(ctx, not_registered(AutoSell::NAME)),
            };
            match result {
                Ok(()) => self.set_state(MiningState::Selling),
                Err(e) => self.fail(ctx, format!("Inventory is full: {}", e)),
            }
        }
    }

    /// Waits for an interleaved feature to finish, then resumes mining.
    fn interleaved<F: Feature>(&mut self, ctx: &mut MacroContext, name: &str, fatal: bool) {
        let (enabled, error) = match ctx.features.get::<F>() {
            Some(feature) => (feature.base().is_enabled(), feature.last_error()),
            None => return self.fail(ctx, not_registered(name)),
        };
        if enabled {
            return;
        }
        match error {
            Some(error) if fatal => self.fail(ctx, error),
            Some(error) => {
                warn!("{} failed: {}", name, error);
                self.resume_miner(ctx);
            }
            None => self.resume_miner(ctx),
        }
    }
}

impl Macro for MiningMacro {
    fn base(&self) -> &MacroBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut MacroBase {
        &mut self.base
    }

    fn features(&self) -> &'static [&'static str] {
        FEATURES
    }

    fn start(&mut self, params: &MacroParams, ctx: &mut MacroContext) -> Result<(), MacroError> {
        let params = match params {
            MacroParams::Mining(params) => params.clone(),
            _ => return Err(MacroError::InvalidParams(Self::NAME)),
        };
        if ctx.world.inventory().find_item(&params.tool).is_none() {
            return Err(MacroError::Precondition(format!("missing necessary item {}", params.tool)));
        }
        self.params = Some(params);
        self.state = MiningState::Initialization;
        self.stat_attempts = 0;
        self.miner_started = false;
        self.can_refuel = true;
        self.restarts = 0;
        self.idle_restarts = 0;
        self.mined_at_restart = ctx.features.get::<BlockMiner>().map(|miner| miner.blocks_mined()).unwrap_or(0);
        self.base.enable(ctx.now);
        Ok(())
    }

    fn on_tick(&mut self, ctx: &mut MacroContext) {
        match self.state {
            MiningState::Initialization => self.start_inventory(ctx),
            MiningState::GettingStats => self.getting_stats(ctx),
            MiningState::Mining => self.mining(ctx),
            MiningState::UnlockingChests => self.interleaved::<AutoChestUnlocker>(ctx, AutoChestUnlocker::NAME, false),
            MiningState::Refueling => self.interleaved::<AutoDrillRefuel>(ctx, AutoDrillRefuel::NAME, true),
            MiningState::Selling => self.interleaved::<AutoSell>(ctx, AutoSell::NAME, true),
        }
    }

    fn counters(&self, features: &FeatureManager) -> Vec<(&'static str, u64)> {
        let mut counters = vec![("restarts", self.restarts)];
        if let Some(miner) = features.get::<BlockMiner>() {
            counters.push(("blocks_mined", miner.blocks_mined()));
        }
        if let Some(unlocker) = features.get::<AutoChestUnlocker>() {
            counters.push(("chests_unlocked", unlocker.unlocked() as u64));
        }
        if let Some(refuel) = features.get::<AutoDrillRefuel>() {
            counters.push(("refuels", refuel.refuels() as u64));
        }
        if let Some(sell) = features.get::<AutoSell>() {
            counters.push(("stacks_sold", sell.sold() as u64));
        }
        counters
    }

    crate::impl_macro_any!();
}
