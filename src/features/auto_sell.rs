use crate::config::SellConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Feature, FeatureBase};
use crate::world::{ClickMode, Command, ItemStack, MouseButton, WorldView};
use log::*;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellError {
    #[error("there is nothing to sell")]
    NothingToSell,

    #[error("the trades menu did not open")]
    MenuTimeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SellState {
    OpeningMenu,
    WaitingMenu,
    Selling,
}

/// Shift-clicks every matching stack of the player inventory into the trades menu.
pub struct AutoSell {
    base: FeatureBase,
    config: SellConfig,
    state: SellState,
    items: Vec<String>,
    /// Never sold, usually the tool in use.
    keep: String,
    clicked: BTreeSet<usize>,
    sold: u32,
    error: Option<SellError>,
}

impl AutoSell {
    pub const NAME: &'static str = "AutoSell";

    pub fn new(config: SellConfig) -> AutoSell {
        AutoSell {
            base: FeatureBase::new(Self::NAME),
            config,
            state: SellState::OpeningMenu,
            items: Vec::new(),
            keep: String::new(),
            clicked: BTreeSet::new(),
            sold: 0,
            error: None,
        }
    }

    pub fn start(&mut self, items: &[String], keep: &str, world: &dyn WorldView) -> Result<(), SellError> {
        self.error = None;
        self.items = items.to_vec();
        self.keep = keep.to_string();
        let inventory = world.inventory();
        let sellable = (9..=44).any(|slot| inventory.item(slot).map(|item| self.sells(item)).unwrap_or(false));
        if !sellable {
            warn!("Nothing to sell");
            self.error = Some(SellError::NothingToSell);
            return Err(SellError::NothingToSell);
        }
        self.clicked.clear();
        self.state = SellState::OpeningMenu;
        self.base.enable();
        Ok(())
    }

    pub fn error(&self) -> Option<SellError> {
        self.error
    }

    fn sells(&self, item: &ItemStack) -> bool {
        let kept = !self.keep.is_empty() && item.name_contains(&self.keep);
        !kept && self.items.iter().any(|name| item.name_contains(name))
    }
    /// Stacks sold since the feature was created.
    pub fn sold(&self) -> u32 {
        self.sold
    }
}

impl Feature for AutoSell {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        match self.state {
            SellState::OpeningMenu => {
                ctx.push(Command::Chat(self.config.menu_command.clone()));
                self.base.timer.schedule(ctx.now, self.config.menu_timeout);
                self.state = SellState::WaitingMenu;
            }
            SellState::WaitingMenu => {
                let opened = ctx
                    .world
                    .open_window()
                    .map(|window| window.title_contains(&self.config.menu_title))
                    .unwrap_or(false);
                if opened {
                    self.base.timer.reset();
                    self.state = SellState::Selling;
                } else if self.base.timer.passed(ctx.now) {
                    error!("{}", SellError::MenuTimeout);
                    self.stop(ctx.services);
                    self.error = Some(SellError::MenuTimeout);
                }
            }
            SellState::Selling => {
                if self.base.timer.is_scheduled() && !self.base.timer.passed(ctx.now) {
                    return Ok(());
                }
                let world = ctx.world;
                let window = match world.open_window() {
                    Some(window) => window,
                    None => {
                        warn!("Trades menu closed while selling");
                        self.stop(ctx.services);
                        return Ok(());
                    }
                };
                let next = (window.container_size()..window.slots.len()).find(|slot| {
                    !self.clicked.contains(slot)
                        && window.item(*slot).map(|item| self.sells(item)).unwrap_or(false)
                });
                match next {
                    Some(slot) => {
                        ctx.push(Command::ClickSlot {
                            window_id: window.id,
                            slot,
                            button: MouseButton::Left,
                            mode: ClickMode::QuickMove,
                        });
                        self.clicked.insert(slot);
                        self.sold += 1;
                        self.base.timer.schedule(ctx.now, self.config.click_delay);
                    }
                    None => {
                        info!("Sold {} stacks", self.clicked.len());
                        ctx.push(Command::CloseWindow);
                        self.stop(ctx.services);
                    }
                }
            }
        }
        Ok(())
    }

    fn stop(&mut self, _services: &mut Services) {
        self.base.disable();
        self.state = SellState::OpeningMenu;
        self.clicked.clear();
    }

    fn last_error(&self) -> Option<String> {
        self.error.map(|error| error.to_string())
    }

    crate::impl_feature_any!();
}
