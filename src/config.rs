//! Tunables, loadable from a JSON file. Every section falls back to its
//! defaults so a partial file is valid.

use crate::clock::Millis;
use crate::error::ConfigError;
use crate::world::BlockStateId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub rotation: RotationConfig,
    pub path: PathConfig,
    pub miner: MinerConfig,
    pub chest: ChestConfig,
    pub mob_killer: MobKillerConfig,
    pub commission: CommissionClaimConfig,
    pub navigator: NavigatorConfig,
    pub refuel: RefuelConfig,
    pub warp: WarpConfig,
    pub sell: SellConfig,
    pub inventory: InventoryConfig,
    pub mining_macro: MiningMacroConfig,
    pub commission_macro: CommissionMacroConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Config::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Config, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RotationConfig {
    /// Share of the remaining delta covered per tick while following.
    pub follow_fraction: f32,
    /// Degrees of jitter per tick at randomness factor 1.
    pub jitter_degrees: f32,
    pub default_randomness: f32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        RotationConfig {
            follow_fraction: 0.1,
            jitter_degrees: 1.0,
            default_randomness: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathConfig {
    /// Horizontal blocks per tick below which the actor counts as not moving.
    pub stuck_speed: f64,
    pub stuck_timeout: Millis,
    pub aim_tolerance: f32,
    pub sprint_tolerance: f32,
    pub look_ahead: f64,
    pub min_rotation_time: Millis,
    pub max_rotation_time: Millis,
    pub planner_iterations: usize,
}

impl Default for PathConfig {
    fn default() -> Self {
        PathConfig {
            stuck_speed: 0.05,
            stuck_timeout: 1_000,
            aim_tolerance: 3.0,
            sprint_tolerance: 40.0,
            look_ahead: 5.0,
            min_rotation_time: 150,
            max_rotation_time: 450,
            planner_iterations: 5_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub priority: f64,
    pub distance: f64,
    pub height: f64,
    pub angle: f64,
    /// Weight of the estimated break time in seconds.
    pub break_time: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            priority: 100.0,
            distance: 10.0,
            height: 5.0,
            angle: 0.5,
            break_time: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MinerConfig {
    pub scan_radius: i32,
    pub reach: f64,
    /// How long Starting waits for minable blocks before giving up.
    pub wait_threshold: Millis,
    pub break_timeout: Millis,
    pub rotation_time: Millis,
    pub ability_timeout: Millis,
    pub max_ability_oscillations: u32,
    pub line_of_sight_step: f64,
    pub weights: ScoringWeights,
    /// Hardness per block state id, used for the break time estimate.
    pub hardness: BTreeMap<BlockStateId, f64>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        MinerConfig {
            scan_radius: 5,
            reach: 4.5,
            wait_threshold: 5_000,
            break_timeout: 10_000,
            rotation_time: 200,
            ability_timeout: 5_000,
            max_ability_oscillations: 4,
            line_of_sight_step: 0.25,
            weights: ScoringWeights::default(),
            hardness: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChestConfig {
    pub chest_state_ids: Vec<BlockStateId>,
    pub detection_radius: f64,
    pub click_interval: Millis,
    pub chest_timeout: Millis,
    pub max_failed_chests: u32,
}

impl Default for ChestConfig {
    fn default() -> Self {
        ChestConfig {
            chest_state_ids: vec![2_954, 2_955, 2_956, 2_957],
            detection_radius: 8.0,
            click_interval: 250,
            chest_timeout: 6_000,
            max_failed_chests: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MobKillerConfig {
    pub search_radius: f64,
    pub attack_range: f64,
    pub attack_interval: Millis,
    pub search_timeout: Millis,
    pub approach_timeout: Millis,
    pub kill_timeout: Millis,
    pub blacklist_time: Millis,
}

impl Default for MobKillerConfig {
    fn default() -> Self {
        MobKillerConfig {
            search_radius: 20.0,
            attack_range: 3.0,
            attack_interval: 150,
            search_timeout: 10_000,
            approach_timeout: 8_000,
            kill_timeout: 15_000,
            blacklist_time: 30_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommissionClaimConfig {
    pub npc_name: String,
    pub pigeon_name: String,
    pub menu_title: String,
    pub interact_range: f64,
    pub menu_timeout: Millis,
    pub click_delay: Millis,
    pub max_interactions: u32,
}

impl Default for CommissionClaimConfig {
    fn default() -> Self {
        CommissionClaimConfig {
            npc_name: "Emissary".to_string(),
            pigeon_name: "Royal Pigeon".to_string(),
            menu_title: "Commissions".to_string(),
            interact_range: 4.0,
            menu_timeout: 2_000,
            click_delay: 300,
            max_interactions: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavigatorConfig {
    pub teleport_item: String,
    pub teleport_timeout: Millis,
    pub max_teleport_attempts: u32,
    /// Distance from a waypoint that counts as arrived.
    pub arrive_distance: f64,
    pub rotation_time: Millis,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        NavigatorConfig {
            teleport_item: "Aspect of the Void".to_string(),
            teleport_timeout: 2_000,
            max_teleport_attempts: 3,
            arrive_distance: 1.5,
            rotation_time: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RefuelConfig {
    pub abiphone_name: String,
    pub contact_name: String,
    pub anvil_title: String,
    pub menu_timeout: Millis,
    pub click_delay: Millis,
    pub max_attempts: u32,
}

impl Default for RefuelConfig {
    fn default() -> Self {
        RefuelConfig {
            abiphone_name: "Abiphone".to_string(),
            contact_name: "Jotraeline Greatforge".to_string(),
            anvil_title: "Drill Anvil".to_string(),
            menu_timeout: 3_000,
            click_delay: 400,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WarpConfig {
    pub warp_timeout: Millis,
    pub max_attempts: u32,
}

impl Default for WarpConfig {
    fn default() -> Self {
        WarpConfig {
            warp_timeout: 5_000,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SellConfig {
    pub menu_command: String,
    pub menu_title: String,
    pub menu_timeout: Millis,
    pub click_delay: Millis,
}

impl Default for SellConfig {
    fn default() -> Self {
        SellConfig {
            menu_command: "/trades".to_string(),
            menu_title: "Trades".to_string(),
            menu_timeout: 3_000,
            click_delay: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InventoryConfig {
    pub menu_command: String,
    pub menu_title: String,
    pub stats_item: String,
    pub menu_timeout: Millis,
    pub max_attempts: u32,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        InventoryConfig {
            menu_command: "/sbmenu".to_string(),
            menu_title: "SkyBlock Menu".to_string(),
            stats_item: "Your SkyBlock Profile".to_string(),
            menu_timeout: 2_000,
            max_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MiningMacroConfig {
    pub tick_delay: Millis,
    pub max_stat_attempts: u32,
    /// Restarts in a row without mining a block before the macro gives up.
    pub max_restarts: u32,
    /// Refuel once drill fuel drops below this amount.
    pub refuel_threshold: u64,
    pub fuel_items: Vec<String>,
    pub sell_items: Vec<String>,
    pub unlock_chests: bool,
}

impl Default for MiningMacroConfig {
    fn default() -> Self {
        MiningMacroConfig {
            tick_delay: 50,
            max_stat_attempts: 3,
            max_restarts: 3,
            refuel_threshold: 100,
            fuel_items: vec!["Volta".to_string(), "Oil Barrel".to_string()],
            sell_items: vec!["Cobblestone".to_string(), "Mithril".to_string()],
            unlock_chests: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommissionMacroConfig {
    pub tick_delay: Millis,
    pub mining_area: String,
    pub warp_destination: String,
    pub max_claim_attempts: u32,
    pub max_navigation_attempts: u32,
    pub use_pigeon: bool,
    /// Route name in the graph store for each commission name.
    pub routes: BTreeMap<String, String>,
    /// Block state ids to mine for each mining commission.
    pub commission_blocks: BTreeMap<String, Vec<BlockStateId>>,
    /// Mob names to kill for each slayer commission.
    pub commission_mobs: BTreeMap<String, Vec<String>>,
    pub weapon: String,
}

impl Default for CommissionMacroConfig {
    fn default() -> Self {
        CommissionMacroConfig {
            tick_delay: 50,
            mining_area: "Dwarven Mines".to_string(),
            warp_destination: "forge".to_string(),
            max_claim_attempts: 3,
            max_navigation_attempts: 3,
            use_pigeon: false,
            routes: BTreeMap::new(),
            commission_blocks: BTreeMap::new(),
            commission_mobs: BTreeMap::new(),
            weapon: "Sword".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_json(r#"{"miner": {"reach": 5.0}}"#).unwrap();
        assert_eq!(config.miner.reach, 5.0);
        assert_eq!(config.miner.wait_threshold, 5_000);
        assert_eq!(config.path, PathConfig::default());
    }
}
