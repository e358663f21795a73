use super::hold_item;
use crate::config::RefuelConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Feature, FeatureBase};
use crate::world::{ClickMode, Command, MouseButton, Window, WorldView};
use log::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillRefuelError {
    #[error("no drill in the inventory")]
    NoDrill,

    #[error("no drill fuel in the inventory")]
    NoFuel,

    #[error("no abiphone in the inventory")]
    NoAbiphone,

    #[error("a refuel menu did not open")]
    MenuTimeout,

    #[error("the drill could not be refueled")]
    RefuelFailed,
}

const REFUEL_BUTTON: &str = "Refuel Drill";

#[derive(Debug, Clone, PartialEq)]
pub struct RefuelParams {
    pub drill: String,
    /// Fuel items, best first.
    pub fuel: Vec<String>,
}

impl RefuelParams {
    pub fn new(drill: &str, fuel: &[String]) -> RefuelParams {
        RefuelParams {
            drill: drill.to_string(),
            fuel: fuel.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefuelState {
    Calling,
    WaitingContacts,
    WaitingAnvil,
    PlacingDrill,
    PlacingFuel,
    Confirming,
    Collecting,
}

/// Calls the drill mechanic through the abiphone and refuels the drill in the anvil menu.
pub struct AutoDrillRefuel {
    base: FeatureBase,
    config: RefuelConfig,
    state: RefuelState,
    params: RefuelParams,
    attempts: u32,
    refuels: u32,
    error: Option<DrillRefuelError>,
}

impl AutoDrillRefuel {
    pub const NAME: &'static str = "AutoDrillRefuel";

    pub fn new(config: RefuelConfig) -> AutoDrillRefuel {
        AutoDrillRefuel {
            base: FeatureBase::new(Self::NAME),
            config,
            state: RefuelState::Calling,
            params: RefuelParams::new("", &[]),
            attempts: 0,
            refuels: 0,
            error: None,
        }
    }

    pub fn start(&mut self, params: RefuelParams, world: &dyn WorldView) -> Result<(), DrillRefuelError> {
        self.error = None;
        let inventory = world.inventory();
        let missing = if inventory.find_item(&params.drill).is_none() {
            Some(DrillRefuelError::NoDrill)
        } else if inventory.find_any(&params.fuel).is_none() {
            Some(DrillRefuelError::NoFuel)
        } else if inventory.find_item(&self.config.abiphone_name).is_none() {
            Some(DrillRefuelError::NoAbiphone)
        } else {
            None
        };
        if let Some(error) = missing {
            error!("Cannot refuel: {}", error);
            self.error = Some(error);
            return Err(error);
        }
        self.params = params;
        self.attempts = 0;
        self.state = RefuelState::Calling;
        self.base.enable();
        Ok(())
    }

    pub fn error(&self) -> Option<DrillRefuelError> {
        self.error
    }

    pub fn refuels(&self) -> u32 {
        self.refuels
    }

    fn fail(&mut self, error: DrillRefuelError, services: &mut Services) {
        error!("Refuel stopped: {}", error);
        services.push(Command::CloseWindow);
        self.stop(services);
        self.error = Some(error);
    }

    /// Counts a menu that did not show up in time and calls again if allowed.
    fn menu_timed_out(&mut self, services: &mut Services) {
        self.attempts += 1;
        if self.attempts >= self.config.max_attempts {
            self.fail(DrillRefuelError::MenuTimeout, services);
        } else {
            warn!("Refuel menu did not open ({}/{})", self.attempts, self.config.max_attempts);
            services.push(Command::CloseWindow);
            self.base.timer.reset();
            self.state = RefuelState::Calling;
        }
    }

    fn click(&mut self, ctx: &mut TickContext, window: &Window, slot: usize, mode: ClickMode, next: RefuelState) {
        ctx.push(Command::ClickSlot {
            window_id: window.id,
            slot,
            button: MouseButton::Left,
            mode,
        });
        self.base.timer.schedule(ctx.now, self.config.click_delay);
        self.state = next;
    }

    fn anvil_step(&mut self, ctx: &mut TickContext, window: &Window) {
        let world = ctx.world;
        let inventory = world.inventory();
        match self.state {
            RefuelState::PlacingDrill => {
                match inventory.find_item(&self.params.drill).and_then(|slot| window.player_slot(slot)) {
                    Some(slot) => self.click(ctx, window, slot, ClickMode::QuickMove, RefuelState::PlacingFuel),
                    None => self.fail(DrillRefuelError::NoDrill, ctx.services),
                }
            }
            RefuelState::PlacingFuel => {
                match inventory.find_any(&self.params.fuel).and_then(|slot| window.player_slot(slot)) {
                    Some(slot) => self.click(ctx, window, slot, ClickMode::QuickMove, RefuelState::Confirming),
                    None => self.fail(DrillRefuelError::NoFuel, ctx.services),
                }
            }
            RefuelState::Confirming => match window.find_item(REFUEL_BUTTON).filter(|slot| *slot < window.container_size()) {
                Some(slot) => self.click(ctx, window, slot, ClickMode::Pickup, RefuelState::Collecting),
                None => self.fail(DrillRefuelError::RefuelFailed, ctx.services),
            },
            RefuelState::Collecting => {
                let drill = &self.params.drill;
                let refueled = window.container_slots_where(|item| item.name_contains(drill) && !item.name_contains(REFUEL_BUTTON));
                match refueled.first().copied() {
                    Some(slot) => {
                        ctx.push(Command::ClickSlot {
                            window_id: window.id,
                            slot,
                            button: MouseButton::Left,
                            mode: ClickMode::QuickMove,
                        });
                        ctx.push(Command::CloseWindow);
                        self.refuels += 1;
                        info!("Drill refueled");
                        self.stop(ctx.services);
                    }
                    None => self.fail(DrillRefuelError::RefuelFailed, ctx.services),
                }
            }
            _ => {}
        }
    }
}

impl Feature for AutoDrillRefuel {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        let world = ctx.world;
        match self.state {
            RefuelState::Calling => {
                if !hold_item(world, &mut ctx.services.commands, &self.config.abiphone_name) {
                    self.fail(DrillRefuelError::NoAbiphone, ctx.services);
                    return Ok(());
                }
                ctx.push(Command::UseItem);
                self.base.timer.schedule(ctx.now, self.config.menu_timeout);
                self.state = RefuelState::WaitingContacts;
            }
            RefuelState::WaitingContacts => {
                let contact = world
                    .open_window()
                    .filter(|window| window.title_contains(&self.config.abiphone_name))
                    .and_then(|window| Some((window, window.find_item(&self.config.contact_name)?)));
                match contact {
                    Some((window, slot)) => {
                        debug!("Calling {}", self.config.contact_name);
                        self.base.timer.reset();
                        ctx.push(Command::ClickSlot {
                            window_id: window.id,
                            slot,
                            button: MouseButton::Left,
                            mode: ClickMode::Pickup,
                        });
                        self.base.timer.schedule(ctx.now, self.config.menu_timeout);
                        self.state = RefuelState::WaitingAnvil;
                    }
                    None if self.base.timer.passed(ctx.now) => self.menu_timed_out(ctx.services),
                    None => {}
                }
            }
            RefuelState::WaitingAnvil => {
                if world.open_window().map(|window| window.title_contains(&self.config.anvil_title)).unwrap_or(false) {
                    self.base.timer.reset();
                    self.state = RefuelState::PlacingDrill;
                } else if self.base.timer.passed(ctx.now) {
                    self.menu_timed_out(ctx.services);
                }
            }
            _ => {
                if self.base.timer.is_scheduled() && !self.base.timer.passed(ctx.now) {
                    return Ok(());
                }
                match world.open_window().filter(|window| window.title_contains(&self.config.anvil_title)) {
                    Some(window) => self.anvil_step(ctx, window),
                    None => self.fail(DrillRefuelError::RefuelFailed, ctx.services),
                }
            }
        }
        Ok(())
    }

    fn stop(&mut self, _services: &mut Services) {
        self.base.disable();
        self.state = RefuelState::Calling;
        self.attempts = 0;
    }

    fn last_error(&self) -> Option<String> {
        self.error.map(|error| error.to_string())
    }

    crate::impl_feature_any!();
}
