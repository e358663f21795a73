use super::hold_item;
use crate::config::CommissionClaimConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Feature, FeatureBase};
use crate::rotation::{RotationRequest, Target};
use crate::world::{entities_matching, ClickMode, Command, EntityId, EntityKind, ItemStack, MouseButton, WorldView};
use log::*;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionClaimError {
    #[error("the commission NPC is out of reach")]
    InaccessibleNpc,

    #[error("no pigeon in the inventory")]
    NoPigeon,

    #[error("the commissions menu did not open")]
    MenuTimeout,

    #[error("no commission is ready to be claimed")]
    NothingToClaim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClaimState {
    Starting,
    Aiming(EntityId),
    WaitingMenu,
    Claiming,
}

fn is_claimable(item: &ItemStack) -> bool {
    item.lore_contains("COMPLETED") || item.lore_contains("Click to claim")
}

/// Opens the commissions menu (pigeon or NPC) and claims every completed commission.
pub struct AutoCommissionClaim {
    base: FeatureBase,
    config: CommissionClaimConfig,
    state: ClaimState,
    use_pigeon: bool,
    interactions: u32,
    pending: VecDeque<usize>,
    claimed_now: u32,
    claimed: u32,
    error: Option<CommissionClaimError>,
}

impl AutoCommissionClaim {
    pub const NAME: &'static str = "AutoCommissionClaim";

    pub fn new(config: CommissionClaimConfig) -> AutoCommissionClaim {
        AutoCommissionClaim {
            base: FeatureBase::new(Self::NAME),
            config,
            state: ClaimState::Starting,
            use_pigeon: false,
            interactions: 0,
            pending: VecDeque::new(),
            claimed_now: 0,
            claimed: 0,
            error: None,
        }
    }

    pub fn start(&mut self, use_pigeon: bool, world: &dyn WorldView) -> Result<(), CommissionClaimError> {
        self.error = None;
        if use_pigeon && world.inventory().find_item(&self.config.pigeon_name).is_none() {
            error!("{}", CommissionClaimError::NoPigeon);
            self.error = Some(CommissionClaimError::NoPigeon);
            return Err(CommissionClaimError::NoPigeon);
        }
        self.use_pigeon = use_pigeon;
        self.interactions = 0;
        self.claimed_now = 0;
        self.pending.clear();
        self.state = ClaimState::Starting;
        self.base.enable();
        Ok(())
    }

    pub fn error(&self) -> Option<CommissionClaimError> {
        self.error
    }

    /// Commissions claimed since the feature was created.
    pub fn claimed(&self) -> u32 {
        self.claimed
    }

    fn fail(&mut self, error: CommissionClaimError, services: &mut Services) {
        error!("Claiming stopped: {}", error);
        self.stop(services);
        self.error = Some(error);
    }

    fn retry(&mut self, services: &mut Services) {
        self.interactions += 1;
        if self.interactions >= self.config.max_interactions {
            let error = if self.use_pigeon {
                CommissionClaimError::MenuTimeout
            } else {
                CommissionClaimError::InaccessibleNpc
            };
            self.fail(error, services);
        } else {
            warn!("Commissions menu did not open ({}/{})", self.interactions, self.config.max_interactions);
            self.state = ClaimState::Starting;
        }
    }

    fn starting(&mut self, ctx: &mut TickContext) {
        if self.use_pigeon {
            if !hold_item(ctx.world, &mut ctx.services.commands, &self.config.pigeon_name) {
                self.fail(CommissionClaimError::NoPigeon, ctx.services);
                return;
            }
            ctx.push(Command::UseItem);
            self.base.timer.schedule(ctx.now, self.config.menu_timeout);
            self.state = ClaimState::WaitingMenu;
            return;
        }

        let world = ctx.world;
        let names = [self.config.npc_name.clone()];
        let npc = entities_matching(world.entities(), EntityKind::Npc, &names, world.position(), self.config.interact_range)
            .first()
            .map(|npc| (npc.id, npc.height));
        match npc {
            Some((id, height)) => {
                ctx.services
                    .rotation
                    .rotate_to(RotationRequest::new(Target::Entity { id, eye_offset: height * 0.85 }, 300));
                self.base.timer.schedule(ctx.now, self.config.menu_timeout);
                self.state = ClaimState::Aiming(id);
            }
            None => self.fail(CommissionClaimError::InaccessibleNpc, ctx.services),
        }
    }
}

impl Feature for AutoCommissionClaim {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        match self.state {
            ClaimState::Starting => self.starting(ctx),
            ClaimState::Aiming(id) => {
                if !ctx.services.rotation.is_rotating() {
                    ctx.push(Command::Interact(id));
                    self.base.timer.schedule(ctx.now, self.config.menu_timeout);
                    self.state = ClaimState::WaitingMenu;
                } else if self.base.timer.passed(ctx.now) {
                    self.retry(ctx.services);
                }
            }
            ClaimState::WaitingMenu => {
                let world = ctx.world;
                match world.open_window().filter(|window| window.title_contains(&self.config.menu_title)) {
                    Some(window) => {
                        self.pending = window.container_slots_where(is_claimable).into();
                        debug!("{} commissions ready to claim", self.pending.len());
                        self.base.timer.reset();
                        self.state = ClaimState::Claiming;
                    }
                    None if self.base.timer.passed(ctx.now) => self.retry(ctx.services),
                    None => {}
                }
            }
            ClaimState::Claiming => {
                if self.base.timer.is_scheduled() && !self.base.timer.passed(ctx.now) {
                    return Ok(());
                }
                let window_id = match ctx.world.open_window() {
                    Some(window) => window.id,
                    None => {
                        self.retry(ctx.services);
                        return Ok(());
                    }
                };
                match self.pending.pop_front() {
                    Some(slot) => {
                        ctx.push(Command::ClickSlot {
                            window_id,
                            slot,
                            button: MouseButton::Left,
                            mode: ClickMode::Pickup,
                        });
                        self.claimed_now += 1;
                        self.claimed += 1;
                        self.base.timer.schedule(ctx.now, self.config.click_delay);
                    }
                    None => {
                        ctx.push(Command::CloseWindow);
                        if self.claimed_now == 0 {
                            self.fail(CommissionClaimError::NothingToClaim, ctx.services);
                        } else {
                            info!("Claimed {} commissions", self.claimed_now);
                            self.stop(ctx.services);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn stop(&mut self, services: &mut Services) {
        if let ClaimState::Aiming(_) = self.state {
            services.rotation.stop();
        }
        self.base.disable();
        self.state = ClaimState::Starting;
        self.pending.clear();
        self.interactions = 0;
    }

    fn last_error(&self) -> Option<String> {
        self.error.map(|error| error.to_string())
    }

    crate::impl_feature_any!();
}
