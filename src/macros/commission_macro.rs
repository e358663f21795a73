use super::{Macro, MacroBase, MacroContext, MacroParams};
use crate::config::CommissionMacroConfig;
use crate::error::MacroError;
use crate::feature::{Feature, FeatureManager};
use crate::features::{
    AutoCommissionClaim, AutoMobKiller, AutoWarp, BlockMiner, BlockMinerError, CommissionClaimError, MinerParams,
    MobKillerError, MobKillerParams, RouteNavigator,
};
use crate::world::tablist::{commissions, current_area, Commission};
use crate::world::WorldEvent;
use log::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommissionState {
    Initialization,
    Warping,
    CheckingCommissions,
    Claiming,
    Navigating(String),
    Working(String),
}

/// Claims finished commissions, walks to the next one and works on it until
/// the tab list shows it done.
pub struct CommissionMacro {
    base: MacroBase,
    config: CommissionMacroConfig,
    state: CommissionState,
    tool: String,
    claim_attempts: u32,
    navigation_attempts: u32,
    completed: bool,
    work_started: bool,
    commissions_done: u64,
}

const FEATURES: &[&str] = &[
    AutoWarp::NAME,
    AutoCommissionClaim::NAME,
    RouteNavigator::NAME,
    BlockMiner::NAME,
    AutoMobKiller::NAME,
];

fn not_registered(name: &str) -> String {
    format!("feature {} is not registered", name)
}

impl CommissionMacro {
    pub const NAME: &'static str = "CommissionMacro";

    pub fn new(config: CommissionMacroConfig) -> CommissionMacro {
        CommissionMacro {
            base: MacroBase::new(Self::NAME, config.tick_delay),
            config,
            state: CommissionState::Initialization,
            tool: String::new(),
            claim_attempts: 0,
            navigation_attempts: 0,
            completed: false,
            work_started: false,
            commissions_done: 0,
        }
    }

    pub fn state(&self) -> &CommissionState {
        &self.state
    }

    fn fail(&mut self, ctx: &mut MacroContext, reason: String) {
        self.base.set_error(reason);
        self.stop(ctx.features, ctx.services);
    }

    fn set_state(&mut self, state: CommissionState) {
        if state != self.state {
            debug!("CommissionMacro: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    fn is_supported(&self, commission: &Commission) -> bool {
        self.config.commission_blocks.contains_key(&commission.name) || self.config.commission_mobs.contains_key(&commission.name)
    }

    fn initialization(&mut self, ctx: &mut MacroContext) {
        let in_area = current_area(ctx.world.scoreboard())
            .map(|area| area.contains(&self.config.mining_area))
            .unwrap_or(false);
        if in_area {
            return self.set_state(CommissionState::CheckingCommissions);
        }
        match ctx.features.get_mut::<AutoWarp>() {
            Some(warp) => {
                warp.start(&self.config.warp_destination, &self.config.mining_area);
                self.set_state(CommissionState::Warping);
            }
            None => self.fail(ctx, not_registered(AutoWarp::NAME)),
        }
    }

    fn warping(&mut self, ctx: &mut MacroContext) {
        let (enabled, error) = match ctx.features.get::<AutoWarp>() {
            Some(warp) => (warp.base().is_enabled(), warp.last_error()),
            None => return self.fail(ctx, not_registered(AutoWarp::NAME)),
        };
        match (enabled, error) {
            (true, _) => {}
            (false, Some(error)) => self.fail(ctx, error),
            (false, None) => self.set_state(CommissionState::CheckingCommissions),
        }
    }

    fn checking(&mut self, ctx: &mut MacroContext) {
        let list = commissions(ctx.world.tablist());
        if list.iter().any(|commission| commission.is_done()) {
            return self.start_claiming(ctx);
        }
        let next = match list.into_iter().find(|commission| self.is_supported(commission)) {
            Some(commission) => commission.name,
            None => return self.fail(ctx, "no supported commission in the tab list".to_string()),
        };
        info!("Next commission: {}", next);
        self.completed = false;
        self.work_started = false;

        let route = match self.config.routes.get(&next) {
            Some(route) => route.clone(),
            None => return self.set_state(CommissionState::Working(next)),
        };
        let waypoints = match ctx.services.graphs.route_to_end(&route, ctx.world.position()) {
            Some(waypoints) => waypoints,
            None => return self.fail(ctx, format!("route {} for {} is missing or unconnected", route, next)),
        };
        let world = ctx.world;
        let result = match ctx.features.get_mut::<RouteNavigator>() {
            Some(navigator) => navigator.start(waypoints, world),
            None => return self.fail(ctx, not_registered(RouteNavigator::NAME)),
        };
        match result {
            Ok(()) => self.set_state(CommissionState::Navigating(next)),
            Err(e) => self.fail(ctx, e.to_string()),
        }
    }

    fn start_claiming(&mut self, ctx: &mut MacroContext) {
        ctx.features.stop(BlockMiner::NAME, ctx.services);
        ctx.features.stop(AutoMobKiller::NAME, ctx.services);
        let world = ctx.world;
        let result = match ctx.features.get_mut::<AutoCommissionClaim>() {
            Some(claim) => claim.start(self.config.use_pigeon, world),
            None => return self.fail(ctx, not_registered(AutoCommissionClaim::NAME)),
        };
        match result {
            Ok(()) => self.set_state(CommissionState::Claiming),
            Err(e) => self.fail(ctx, e.to_string()),
        }
    }

    fn claiming(&mut self, ctx: &mut MacroContext) {
        let (enabled, error, claimed) = match ctx.features.get::<AutoCommissionClaim>() {
            Some(claim) => (claim.base().is_enabled(), claim.error(), claim.claimed()),
            None => return self.fail(ctx, not_registered(AutoCommissionClaim::NAME)),
        };
        if enabled {
            return;
        }
        match error {
            None => {
                self.claim_attempts = 0;
                self.commissions_done = claimed as u64;
                self.set_state(CommissionState::CheckingCommissions);
            }
            Some(error) => {
                self.claim_attempts += 1;
                if self.claim_attempts >= self.config.max_claim_attempts {
                    return self.fail(ctx, format!("Could not claim commissions: {}", error));
                }
                warn!("Claiming failed ({}), retrying", error);
                if error == CommissionClaimError::NothingToClaim {
                    // The tab list lags behind the menu.
                    self.set_state(CommissionState::CheckingCommissions);
                } else {
                    self.start_claiming(ctx);
                }
            }
        }
    }

    fn navigating(&mut self, ctx: &mut MacroContext, commission: String) {
        let (enabled, succeeded, error) = match ctx.features.get::<RouteNavigator>() {
            Some(navigator) => (navigator.base().is_enabled(), navigator.succeeded(), navigator.last_error()),
            None => return self.fail(ctx, not_registered(RouteNavigator::NAME)),
        };
        if enabled {
            return;
        }
        if succeeded {
            self.navigation_attempts = 0;
            return self.set_state(CommissionState::Working(commission));
        }
        self.retry_navigation(ctx, error.unwrap_or_else(|| "navigation stopped".to_string()));
    }

    fn retry_navigation(&mut self, ctx: &mut MacroContext, reason: String) {
        self.navigation_attempts += 1;
        if self.navigation_attempts >= self.config.max_navigation_attempts {
            return self.fail(ctx, format!("Could not reach the commission: {}", reason));
        }
        warn!("{}, trying again ({}/{})", reason, self.navigation_attempts, self.config.max_navigation_attempts);
        self.set_state(CommissionState::CheckingCommissions);
    }

    fn start_work(&mut self, ctx: &mut MacroContext, commission: &str) {
        let world = ctx.world;
        let result = if let Some(blocks) = self.config.commission_blocks.get(commission) {
            let params = MinerParams::new(vec![blocks.clone()], vec![1], 0.0, &self.tool);
            match ctx.features.get_mut::<BlockMiner>() {
                Some(miner) => miner.start(params, world).map_err(|e| e.to_string()),
                None => Err(not_registered(BlockMiner::NAME)),
            }
        } else if let Some(mobs) = self.config.commission_mobs.get(commission) {
            let params = MobKillerParams {
                mobs: mobs.clone(),
                weapon: self.config.weapon.clone(),
            };
            match ctx.features.get_mut::<AutoMobKiller>() {
                Some(killer) => killer.start(params, world).map_err(|e| e.to_string()),
                None => Err(not_registered(AutoMobKiller::NAME)),
            }
        } else {
            Err(format!("no work configured for {}", commission))
        };
        match result {
            Ok(()) => self.work_started = true,
            Err(reason) => self.fail(ctx, reason),
        }
    }

    fn working(&mut self, ctx: &mut MacroContext, commission: String) {
        let done = self.completed
            || commissions(ctx.world.tablist())
                .iter()
                .any(|listed| listed.name == commission && listed.is_done());
        if done {
            info!("Commission {} done", commission);
            return self.start_claiming(ctx);
        }
        if !self.work_started {
            return self.start_work(ctx, &commission);
        }

        if let Some(miner) = ctx.features.get::<BlockMiner>().filter(|_| self.config.commission_blocks.contains_key(&commission)) {
            if miner.base().is_enabled() {
                return;
            }
            match miner.error() {
                Some(BlockMinerError::NoPointsFound) | Some(BlockMinerError::NotEnoughBlocks) => {
                    self.retry_navigation(ctx, "ran out of blocks".to_string())
                }
                Some(error) => self.fail(ctx, error.to_string()),
                None => self.fail(ctx, "the miner was stopped".to_string()),
            }
        } else if let Some(killer) = ctx.features.get::<AutoMobKiller>() {
            if killer.base().is_enabled() {
                return;
            }
            match killer.error() {
                Some(MobKillerError::NoEntities) => self.retry_navigation(ctx, "no mobs around".to_string()),
                Some(error) => self.fail(ctx, error.to_string()),
                None => self.fail(ctx, "the mob killer was stopped".to_string()),
            }
        }
    }
}

impl Macro for CommissionMacro {
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
        let tool = match params {
            MacroParams::Commission { tool } => tool.clone(),
            _ => return Err(MacroError::InvalidParams(Self::NAME)),
        };
        if ctx.world.inventory().find_item(&tool).is_none() {
            return Err(MacroError::Precondition(format!("missing necessary item {}", tool)));
        }
        self.tool = tool;
        self.state = CommissionState::Initialization;
        self.claim_attempts = 0;
        self.navigation_attempts = 0;
        self.completed = false;
        self.work_started = false;
        self.base.enable(ctx.now);
        Ok(())
    }

    fn on_tick(&mut self, ctx: &mut MacroContext) {
        match self.state.clone() {
            CommissionState::Initialization => self.initialization(ctx),
            CommissionState::Warping => self.warping(ctx),
            CommissionState::CheckingCommissions => self.checking(ctx),
            CommissionState::Claiming => self.claiming(ctx),
            CommissionState::Navigating(commission) => self.navigating(ctx, commission),
            CommissionState::Working(commission) => self.working(ctx, commission),
        }
    }

    fn on_event(&mut self, event: &WorldEvent) {
        if let WorldEvent::Chat(message) = event {
            if message.contains("Commission Complete") {
                self.completed = true;
            }
        }
    }

    fn counters(&self, _features: &FeatureManager) -> Vec<(&'static str, u64)> {
        vec![
            ("commissions_claimed", self.commissions_done),
            ("navigation_attempts", self.navigation_attempts as u64),
        ]
    }

    crate::impl_macro_any!();
}
