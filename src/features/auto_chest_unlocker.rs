use super::hold_item;
use crate::clock::{Clock, Millis};
use crate::config::ChestConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Failsafe, Feature, FeatureBase};
use crate::rotation::{RotationRequest, Target};
use crate::world::map::{block_center, block_face};
use crate::world::{Command, MouseButton, WorldView};
use glam::IVec3;
use log::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestUnlockerError {
    #[error("the item used to open chests is not in the inventory")]
    NoItem,

    #[error("too many chests could not be opened")]
    ChestTimeout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnlockerParams {
    /// Item held while clicking chests.
    pub item: String,
    pub button: MouseButton,
}

impl UnlockerParams {
    pub fn new(item: &str, button: MouseButton) -> UnlockerParams {
        UnlockerParams {
            item: item.to_string(),
            button,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnlockerState {
    Finding,
    Aiming(IVec3),
    Clicking(IVec3),
}

/// Empties the shared chest queue, clicking each chest until it disappears.
pub struct AutoChestUnlocker {
    base: FeatureBase,
    config: ChestConfig,
    state: UnlockerState,
    params: UnlockerParams,
    click: Clock,
    failed_chests: u32,
    unlocked: u32,
    error: Option<ChestUnlockerError>,
}

impl AutoChestUnlocker {
    pub const NAME: &'static str = "AutoChestUnlocker";

    pub fn new(config: ChestConfig) -> AutoChestUnlocker {
        AutoChestUnlocker {
            base: FeatureBase::new(Self::NAME).ignoring(&[Failsafe::Rotation, Failsafe::BlockChange]),
            config,
            state: UnlockerState::Finding,
            params: UnlockerParams::new("", MouseButton::Left),
            click: Clock::new(),
            failed_chests: 0,
            unlocked: 0,
            error: None,
        }
    }

    pub fn start(&mut self, params: UnlockerParams, world: &dyn WorldView) -> Result<(), ChestUnlockerError> {
        self.error = None;
        if world.inventory().find_item(&params.item).is_none() {
            error!("Cannot unlock chests: {}", ChestUnlockerError::NoItem);
            self.error = Some(ChestUnlockerError::NoItem);
            return Err(ChestUnlockerError::NoItem);
        }
        self.params = params;
        self.failed_chests = 0;
        self.state = UnlockerState::Finding;
        self.click.reset();
        self.base.enable();
        Ok(())
    }

    pub fn error(&self) -> Option<ChestUnlockerError> {
        self.error
    }

    pub fn unlocked(&self) -> u32 {
        self.unlocked
    }

    fn is_chest(&self, world: &dyn WorldView, position: IVec3) -> bool {
        self.config.chest_state_ids.contains(&world.block_at(position).id)
    }

    fn fail(&mut self, error: ChestUnlockerError, services: &mut Services) {
        error!("Chest unlocking stopped: {}", error);
        self.stop(services);
        self.error = Some(error);
    }

    fn finding(&mut self, ctx: &mut TickContext) -> UnlockerState {
        let world = ctx.world;
        let eye = world.eye_position();
        let chest = loop {
            match ctx.services.queues.chests.pop_closest(eye) {
                Some(chest) if self.is_chest(world, chest) && block_center(chest).distance(eye) <= self.config.detection_radius => {
                    break chest
                }
                Some(chest) => trace!("Dropping stale chest at {}", chest),
                None => {
                    debug!("No chest left to unlock");
                    self.stop(ctx.services);
                    return UnlockerState::Finding;
                }
            }
        };

        if !hold_item(world, &mut ctx.services.commands, &self.params.item) {
            self.fail(ChestUnlockerError::NoItem, ctx.services);
            return UnlockerState::Finding;
        }
        ctx.services.rotation.rotate_now(RotationRequest::new(Target::Block(chest), 200).priority(1));
        self.base.timer.schedule(ctx.now, self.config.chest_timeout);
        UnlockerState::Aiming(chest)
    }

    fn clicking(&mut self, ctx: &mut TickContext, chest: IVec3) -> UnlockerState {
        if !self.is_chest(ctx.world, chest) {
            self.unlocked += 1;
            info!("Unlocked chest at {}", chest);
            self.base.timer.reset();
            return UnlockerState::Finding;
        }
        if self.base.timer.passed(ctx.now) {
            self.failed_chests += 1;
            warn!("Chest at {} did not open ({}/{})", chest, self.failed_chests, self.config.max_failed_chests);
            self.base.timer.reset();
            if self.failed_chests >= self.config.max_failed_chests {
                self.fail(ChestUnlockerError::ChestTimeout, ctx.services);
            }
            return UnlockerState::Finding;
        }
        if self.click.is_scheduled() && !self.click.passed(ctx.now) {
            return UnlockerState::Clicking(chest);
        }
        match self.params.button {
            MouseButton::Left => {
                let face = block_face(ctx.world.eye_position(), chest);
                ctx.push(Command::StartDigging { position: chest, face });
                ctx.push(Command::StopDigging);
            }
            MouseButton::Right => ctx.push(Command::ActivateBlock(chest)),
        }
        self.click.schedule(ctx.now, self.config.click_interval);
        UnlockerState::Clicking(chest)
    }
}

impl Feature for AutoChestUnlocker {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        let next = match self.state {
            UnlockerState::Finding => self.finding(ctx),
            UnlockerState::Aiming(chest) if ctx.services.rotation.is_rotating() => {
                if self.base.timer.passed(ctx.now) {
                    self.clicking(ctx, chest)
                } else {
                    UnlockerState::Aiming(chest)
                }
            }
            UnlockerState::Aiming(chest) | UnlockerState::Clicking(chest) => self.clicking(ctx, chest),
        };
        if self.base.is_enabled() {
            self.state = next;
        }
        Ok(())
    }

    fn stop(&mut self, _services: &mut Services) {
        self.base.disable();
        self.state = UnlockerState::Finding;
        self.click.reset();
    }

    fn last_error(&self) -> Option<String> {
        self.error.map(|error| error.to_string())
    }

    /// Puts the current chest back in the queue.
    fn pause(&mut self, now: Millis, services: &mut Services) {
        if let UnlockerState::Aiming(chest) | UnlockerState::Clicking(chest) = self.state {
            services.queues.chests.push(chest);
            self.state = UnlockerState::Finding;
            self.base.timer.reset();
        }
        self.base.pause(now);
    }

    crate::impl_feature_any!();
}
