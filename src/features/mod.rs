//! Concrete features. Each one is an `enum` state machine ticked by the
//! [`FeatureManager`](crate::feature::FeatureManager).

use crate::world::{Command, WorldView};

pub mod auto_chest_unlocker;
pub mod auto_commission_claim;
pub mod auto_drill_refuel;
pub mod auto_inventory;
pub mod auto_mob_killer;
pub mod auto_sell;
pub mod auto_warp;
pub mod block_miner;
pub mod route_navigator;

pub use auto_chest_unlocker::{AutoChestUnlocker, ChestUnlockerError, UnlockerParams};
pub use auto_commission_claim::{AutoCommissionClaim, CommissionClaimError};
pub use auto_drill_refuel::{AutoDrillRefuel, DrillRefuelError, RefuelParams};
pub use auto_inventory::{AutoInventory, InventoryError, MiningStats};
pub use auto_mob_killer::{AutoMobKiller, MobKillerError, MobKillerParams};
pub use auto_sell::{AutoSell, SellError};
pub use auto_warp::{AutoWarp, WarpError};
pub use block_miner::{BlockMiner, BlockMinerError, MinerParams, MinerState, PickaxeAbility};
pub use route_navigator::{NavigatorError, RouteNavigator};

/// Makes sure an item whose name contains `fragment` is in hand. Returns
/// `false` when there is none in the inventory.
pub(crate) fn hold_item(world: &dyn WorldView, commands: &mut Vec<Command>, fragment: &str) -> bool {
    let inventory = world.inventory();
    if inventory.is_holding(fragment) {
        return true;
    }
    match inventory.find_item(fragment) {
        Some(slot) => {
            commands.push(Command::HoldItem { slot });
            true
        }
        None => false,
    }
}
