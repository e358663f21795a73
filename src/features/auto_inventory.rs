//! Reads mining stats from the profile item of the game menu.

use crate::config::InventoryConfig;
use crate::context::{Services, TickContext};
use crate::error::FeatureError;
use crate::feature::{Feature, FeatureBase};
use crate::world::map::parse_number;
use crate::world::{Command, ItemStack};
use log::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryError {
    #[error("the game menu did not open")]
    CannotOpenMenu,

    #[error("the profile item does not list the mining speed")]
    CannotReadStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MiningStats {
    pub mining_speed: f64,
    /// Percentage granted by the mining speed boost ability, when listed.
    pub mining_speed_boost: Option<f64>,
}

impl MiningStats {
    /// Parses lore lines such as `⸕ Mining Speed 1,234`.
    pub fn from_item(item: &ItemStack) -> Option<MiningStats> {
        let mut stats = MiningStats::default();
        let mut found = false;
        for line in &item.lore {
            if let Some((_, value)) = line.split_once("Mining Speed Boost") {
                stats.mining_speed_boost = parse_number(value);
            } else if let Some((_, value)) = line.split_once("Mining Speed") {
                if let Some(speed) = parse_number(value) {
                    stats.mining_speed = speed;
                    found = true;
                }
            }
        }
        if found {
            Some(stats)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InventoryState {
    OpeningMenu,
    WaitingMenu,
    Reading,
}

pub struct AutoInventory {
    base: FeatureBase,
    config: InventoryConfig,
    state: InventoryState,
    attempts: u32,
    stats: Option<MiningStats>,
    error: Option<InventoryError>,
}

impl AutoInventory {
    pub const NAME: &'static str = "AutoInventory";

    pub fn new(config: InventoryConfig) -> AutoInventory {
        AutoInventory {
            base: FeatureBase::new(Self::NAME),
            config,
            state: InventoryState::OpeningMenu,
            attempts: 0,
            stats: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.error = None;
        self.stats = None;
        self.attempts = 0;
        self.state = InventoryState::OpeningMenu;
        self.base.enable();
        debug!("Reading mining stats");
    }

    pub fn stats(&self) -> Option<MiningStats> {
        self.stats
    }

    pub fn error(&self) -> Option<InventoryError> {
        self.error
    }

    fn fail(&mut self, error: InventoryError, services: &mut Services) {
        error!("Could not read stats: {}", error);
        self.stop(services);
        self.error = Some(error);
    }
}

impl Feature for AutoInventory {
    fn base(&self) -> &FeatureBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut FeatureBase {
        &mut self.base
    }

    fn on_tick(&mut self, ctx: &mut TickContext) -> Result<(), FeatureError> {
        match self.state {
            InventoryState::OpeningMenu => {
                ctx.push(Command::Chat(self.config.menu_command.clone()));
                self.base.timer.schedule(ctx.now, self.config.menu_timeout);
                self.state = InventoryState::WaitingMenu;
            }
            InventoryState::WaitingMenu => {
                let opened = ctx
                    .world
                    .open_window()
                    .map(|window| window.title_contains(&self.config.menu_title))
                    .unwrap_or(false);
                if opened {
                    self.base.timer.reset();
                    self.state = InventoryState::Reading;
                } else if self.base.timer.passed(ctx.now) {
                    self.attempts += 1;
                    if self.attempts >= self.config.max_attempts {
                        self.fail(InventoryError::CannotOpenMenu, ctx.services);
                    } else {
                        warn!("Menu did not open, retrying ({}/{})", self.attempts, self.config.max_attempts);
                        self.state = InventoryState::OpeningMenu;
                    }
                }
            }
            InventoryState::Reading => {
                let stats = ctx.world.open_window().and_then(|window| {
                    let slot = window.find_item(&self.config.stats_item)?;
                    MiningStats::from_item(window.item(slot)?)
                });
                ctx.push(Command::CloseWindow);
                match stats {
                    Some(stats) => {
                        info!("Mining speed is {}", stats.mining_speed);
                        self.stats = Some(stats);
                        self.stop(ctx.services);
                    }
                    None => self.fail(InventoryError::CannotReadStats, ctx.services),
                }
            }
        }
        Ok(())
    }

    fn stop(&mut self, _services: &mut Services) {
        self.base.disable();
        self.state = InventoryState::OpeningMenu;
        self.attempts = 0;
    }

    fn last_error(&self) -> Option<String> {
        self.error.map(|error| error.to_string())
    }

    crate::impl_feature_any!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_speed_and_boost() {
        let item = ItemStack::new("Your SkyBlock Profile", 1).with_lore(&[
            "⸕ Mining Speed 1,450",
            "☘ Mining Fortune 220",
            "Mining Speed Boost 300%",
        ]);
        let stats = MiningStats::from_item(&item).unwrap();
        assert_eq!(stats.mining_speed, 1450.0);
        assert_eq!(stats.mining_speed_boost, Some(300.0));
        assert!(MiningStats::from_item(&ItemStack::new("Stone", 1)).is_none());
    }
}
