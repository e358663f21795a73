use super::hold_item;
use crate::angle::{needed_change, rotation_to};
use crate::clock::Millis;
use crate::config::MinerConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Feature, FeatureBase};
use crate::rotation::{RotationRequest, Target};
use crate::world::map::{block_center, block_face};
use crate::world::{BlockStateId, Command, WorldQueries, WorldView};
use glam::IVec3;
use log::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMinerError {
    #[error("no blocks to mine were found nearby")]
    NotEnoughBlocks,

    #[error("the mining tool is not in the inventory")]
    NoToolsAvailable,

    #[error("none of the nearby blocks could be reached")]
    NoPointsFound,

    #[error("no block to mine has a priority above zero")]
    NoTargetBlocks,

    #[error("the pickaxe ability could not be used")]
    NoPickaxeAbility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickaxeAbility {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinerParams {
    /// Groups of block state ids; each group is mined with the priority at the same index.
    pub blocks: Vec<Vec<BlockStateId>>,
    pub priority: Vec<u32>,
    pub mining_speed: f64,
    pub tool: String,
    /// Tried once per cycle when the ability does not trigger with `tool`.
    pub alternate_tool: Option<String>,
    pub use_ability: bool,
}

impl MinerParams {
    pub fn new(blocks: Vec<Vec<BlockStateId>>, priority: Vec<u32>, mining_speed: f64, tool: &str) -> MinerParams {
        MinerParams {
            blocks,
            priority,
            mining_speed,
            tool: tool.to_string(),
            alternate_tool: None,
            use_ability: true,
        }
    }

    pub fn alternate_tool(mut self, tool: &str) -> MinerParams {
        self.alternate_tool = Some(tool.to_string());
        self
    }

    pub fn use_ability(mut self, use_ability: bool) -> MinerParams {
        self.use_ability = use_ability;
        self
    }

    /// Priority of every block state id. Ids with priority zero (or with no
    /// priority given) are left out.
    pub fn block_priority(&self) -> BTreeMap<BlockStateId, u32> {
        let mut block_priority = BTreeMap::new();
        for (idx, group) in self.blocks.iter().enumerate() {
            let priority = self.priority.get(idx).copied().unwrap_or(0);
            if priority == 0 {
                continue;
            }
            for id in group {
                let entry = block_priority.entry(*id).or_insert(priority);
                *entry = (*entry).max(priority);
            }
        }
        block_priority
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakPhase {
    Rotating,
    /// One tick for the final look to land before digging.
    Settling,
    Digging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinerState {
    Starting,
    ChoosingBlock,
    Breaking {
        target: IVec3,
        state_id: BlockStateId,
        phase: BreakPhase,
    },
    ApplyAbility {
        tried_alt: bool,
    },
}

pub struct BlockMiner {
    base: FeatureBase,
    config: MinerConfig,
    state: MinerState,
    block_priority: BTreeMap<BlockStateId, u32>,
    mining_speed: f64,
    tool: String,
    alternate_tool: Option<String>,
    use_ability: bool,
    ability: PickaxeAbility,
    oscillations: u32,
    blocks_mined: u64,
    error: Option<BlockMinerError>,
}

impl BlockMiner {
    pub const NAME: &'static str = "BlockMiner";

    pub fn new(config: MinerConfig) -> BlockMiner {
        BlockMiner {
            base: FeatureBase::new(Self::NAME),
            config,
            state: MinerState::Starting,
            block_priority: BTreeMap::new(),
            mining_speed: 0.0,
            tool: String::new(),
            alternate_tool: None,
            use_ability: false,
            ability: PickaxeAbility::Unavailable,
            oscillations: 0,
            blocks_mined: 0,
            error: None,
        }
    }

    /// Checks the parameters and starts mining. On a precondition failure the
    /// error is recorded and the miner stays stopped.
    pub fn start(&mut self, params: MinerParams, world: &dyn WorldView) -> Result<(), BlockMinerError> {
        self.error = None;
        let block_priority = params.block_priority();
        if block_priority.is_empty() {
            return Err(self.refuse(BlockMinerError::NoTargetBlocks));
        }
        if world.inventory().find_item(&params.tool).is_none() {
            return Err(self.refuse(BlockMinerError::NoToolsAvailable));
        }

        info!("Mining {} block types with {}", block_priority.len(), params.tool);
        self.block_priority = block_priority;
        self.mining_speed = params.mining_speed;
        self.tool = params.tool;
        self.alternate_tool = params.alternate_tool;
        self.use_ability = params.use_ability;
        self.oscillations = 0;
        self.state = MinerState::Starting;
        self.base.enable();
        Ok(())
    }

    fn refuse(&mut self, error: BlockMinerError) -> BlockMinerError {
        error!("Cannot start mining: {}", error);
        self.error = Some(error);
        error
    }

    fn fail(&mut self, error: BlockMinerError, services: &mut Services) {
        error!("Mining stopped: {}", error);
        self.stop(services);
        self.error = Some(error);
    }

    pub fn state(&self) -> MinerState {
        self.state
    }

    pub fn error(&self) -> Option<BlockMinerError> {
        self.error
    }

    pub fn ability(&self) -> PickaxeAbility {
        self.ability
    }

    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined
    }

    pub fn set_mining_speed(&mut self, mining_speed: f64) {
        self.mining_speed = mining_speed;
    }

    fn scan(&self, world: &dyn WorldView) -> Vec<IVec3> {
        let center = world.eye_position().floor().as_ivec3();
        world.search_blocks(center, self.config.scan_radius, |state| self.block_priority.contains_key(&state.id))
    }

    /// Estimated seconds to break a block, from its hardness and the mining speed.
    fn break_time(&self, id: BlockStateId) -> f64 {
        match self.config.hardness.get(&id) {
            Some(hardness) if self.mining_speed > 0.0 => hardness * 30.0 / self.mining_speed / 20.0,
            _ => 0.0,
        }
    }

    fn starting(&mut self, ctx: &mut TickContext) -> MinerState {
        let now = ctx.now;
        if !self.base.timer.is_scheduled() {
            self.base.timer.schedule(now, self.config.wait_threshold);
        }

        if self.scan(ctx.world).is_empty() {
            if self.base.timer.passed(now) {
                self.fail(BlockMinerError::NotEnoughBlocks, ctx.services);
            }
            return MinerState::Starting;
        }
        // Blocks are around but nothing was broken during the whole window.
        if self.base.timer.passed(now) {
            self.fail(BlockMinerError::NoPointsFound, ctx.services);
            return MinerState::Starting;
        }

        if self.use_ability && self.ability == PickaxeAbility::Available {
            self.oscillations += 1;
            if self.oscillations >= self.config.max_ability_oscillations {
                self.fail(BlockMinerError::NoPickaxeAbility, ctx.services);
                return MinerState::Starting;
            }
            self.base.timer.reset();
            return MinerState::ApplyAbility { tried_alt: false };
        }
        MinerState::ChoosingBlock
    }

    fn choosing_block(&mut self, ctx: &mut TickContext) -> MinerState {
        let world = ctx.world;
        let eye = world.eye_position();
        let facing = world.facing();
        let weights = &self.config.weights;

        let best = self
            .scan(world)
            .into_iter()
            .filter_map(|position| {
                let center = block_center(position);
                let distance = eye.distance(center);
                if distance > self.config.reach || !world.has_line_of_sight(eye, position, self.config.line_of_sight_step) {
                    return None;
                }
                let id = world.block_at(position).id;
                let priority = *self.block_priority.get(&id)? as f64;
                let angle = needed_change(facing, rotation_to(eye, center)).magnitude() as f64;
                let score = priority * weights.priority
                    - distance * weights.distance
                    - (center.y - eye.y).abs() * weights.height
                    - angle * weights.angle
                    - self.break_time(id) * weights.break_time;
                Some((position, id, score))
            })
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal));

        let (target, state_id, score) = match best {
            Some(best) => best,
            None => return MinerState::Starting,
        };
        trace!("Picked block {} at {} (score {:.1})", state_id, target, score);

        if !hold_item(world, &mut ctx.services.commands, &self.tool) {
            self.fail(BlockMinerError::NoToolsAvailable, ctx.services);
            return MinerState::Starting;
        }
        let randomness = ctx.services.rotation.default_randomness();
        ctx.services
            .rotation
            .rotate_to(RotationRequest::new(Target::Block(target), self.config.rotation_time).randomness(randomness));
        self.base.timer.reset();
        self.base.timer.schedule(ctx.now, self.config.break_timeout);
        MinerState::Breaking {
            target,
            state_id,
            phase: BreakPhase::Rotating,
        }
    }

    fn breaking(&mut self, ctx: &mut TickContext, target: IVec3, state_id: BlockStateId, phase: BreakPhase) -> MinerState {
        if ctx.world.block_at(target).id != state_id {
            self.blocks_mined += 1;
            debug!("Broke block at {}", target);
            self.base.timer.reset();
            return MinerState::Starting;
        }
        if self.base.timer.passed(ctx.now) {
            warn!("Could not break block at {} within {}ms", target, self.config.break_timeout);
            if phase == BreakPhase::Digging {
                ctx.push(Command::StopDigging);
            }
            self.base.timer.reset();
            return MinerState::Starting;
        }

        let phase = match phase {
            BreakPhase::Rotating if ctx.services.rotation.is_rotating() => BreakPhase::Rotating,
            BreakPhase::Rotating => BreakPhase::Settling,
            BreakPhase::Settling => {
                let face = block_face(ctx.world.eye_position(), target);
                ctx.push(Command::StartDigging { position: target, face });
                BreakPhase::Digging
            }
            BreakPhase::Digging => BreakPhase::Digging,
        };
        MinerState::Breaking { target, state_id, phase }
    }

    fn apply_ability(&mut self, ctx: &mut TickContext, tried_alt: bool) -> MinerState {
        let now = ctx.now;
        if !self.base.timer.is_scheduled() {
            let tool = match (&self.alternate_tool, tried_alt) {
                (Some(alternate), true) => alternate.clone(),
                _ => self.tool.clone(),
            };
            if !hold_item(ctx.world, &mut ctx.services.commands, &tool) {
                warn!("{} is not in the inventory, mining without the ability", tool);
                return MinerState::ChoosingBlock;
            }
            ctx.push(Command::UseItem);
            self.base.timer.schedule(now, self.config.ability_timeout);
            return MinerState::ApplyAbility { tried_alt };
        }

        if self.ability == PickaxeAbility::Unavailable {
            debug!("Pickaxe ability used");
            self.oscillations = 0;
            self.base.timer.reset();
            return MinerState::ChoosingBlock;
        }
        if !self.base.timer.passed(now) {
            return MinerState::ApplyAbility { tried_alt };
        }

        self.base.timer.reset();
        let alternate_available = self
            .alternate_tool
            .as_ref()
            .map(|alternate| ctx.world.inventory().find_item(alternate).is_some())
            .unwrap_or(false);
        if !tried_alt && alternate_available {
            debug!("Ability did not trigger, trying the alternate tool");
            return MinerState::ApplyAbility { tried_alt: true };
        }
        warn!("Ability did not trigger, mining without it");
        MinerState::Starting
    }
}

impl Feature for BlockMiner {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        let next = match self.state {
            MinerState::Starting => self.starting(ctx),
            MinerState::ChoosingBlock => self.choosing_block(ctx),
            MinerState::Breaking { target, state_id, phase } => self.breaking(ctx, target, state_id, phase),
            MinerState::ApplyAbility { tried_alt } => self.apply_ability(ctx, tried_alt),
        };
        if self.base.is_enabled() {
            if std::mem::discriminant(&next) != std::mem::discriminant(&self.state) {
                debug!("BlockMiner: {:?} -> {:?}", self.state, next);
            }
            self.state = next;
        }
        Ok(())
    }

    fn stop(&mut self, services: &mut Services) {
        if let MinerState::Breaking {
            phase: BreakPhase::Digging, ..
        } = self.state
        {
            services.push(Command::StopDigging);
        }
        services.rotation.stop();
        self.base.disable();
        self.state = MinerState::Starting;
        self.oscillations = 0;
        debug!("BlockMiner stopped after {} blocks", self.blocks_mined);
    }

    fn last_error(&self) -> Option<String> {
        self.error.map(|error| error.to_string())
    }

    fn on_chat(&mut self, message: &str) {
        if message.contains("is now available!") {
            self.ability = PickaxeAbility::Available;
        } else if message.contains("You used your") || message.contains("on cooldown for") {
            self.ability = PickaxeAbility::Unavailable;
        }
    }

    /// Drops a dig in progress; the block is chosen again after resuming.
    fn pause(&mut self, now: Millis, services: &mut Services) {
        if let MinerState::Breaking { phase, .. } = self.state {
            if phase == BreakPhase::Digging {
                services.push(Command::StopDigging);
            }
            self.state = MinerState::Starting;
            self.base.timer.reset();
        }
        services.rotation.stop();
        self.base.pause(now);
    }

    crate::impl_feature_any!();
}
