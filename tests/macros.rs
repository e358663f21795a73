mod common;

use commission_bot::config::Config;
use commission_bot::error::MacroError;
use commission_bot::features::{AutoChestUnlocker, AutoDrillRefuel, AutoSell, BlockMiner, MinerParams};
use commission_bot::macros::{CommissionMacro, CommissionState, MacroParams, MiningMacro, MiningState};
use commission_bot::world::{BlockState, Entity, EntityKind, ItemStack, Slot, Window, WorldEvent};
use common::*;
use glam::{DVec3, IVec3};

fn mining_params(tool: &str) -> MacroParams {
    MacroParams::Mining(MinerParams::new(vec![vec![MITHRIL]], vec![1], 0.0, tool))
}

fn mining_state(harness: &Harness) -> MiningState {
    harness.core.macros().get::<MiningMacro>().unwrap().state()
}

fn quarry() -> Harness {
    let mut world = flat_world();
    world.set_block(IVec3::new(2, 64, 0), BlockState::solid(MITHRIL));
    world.set_block(IVec3::new(0, 64, 3), BlockState::solid(MITHRIL));
    let mut harness = Harness::new(Config::default(), world);
    harness.menus.push(("/sbmenu".to_string(), profile_menu("1,250")));
    harness
}

#[test]
fn mining_macro_reads_stats_then_mines() {
    let mut harness = quarry();
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();

    let mining = harness.run_until(2_000, |harness| {
        mining_state(harness) == MiningState::Mining && harness.core.features().is_running(BlockMiner::NAME)
    });
    assert!(mining);
    assert_eq!(harness.core.macros().get::<MiningMacro>().unwrap().mining_speed(), 1_250.0);
    assert!(harness.world.window.is_none());

    let mined = harness.run_until(5_000, |harness| {
        harness.core.features().get::<BlockMiner>().unwrap().blocks_mined() >= 1
    });
    assert!(mined);

    let status = harness.core.status(harness.now);
    assert!(status.running);
    assert!(!status.paused);
    assert_eq!(status.active, Some(MiningMacro::NAME));
    assert!(status.uptime > 0);
    assert!(status.last_error.is_none());
    assert!(status.counters.iter().any(|(name, value)| *name == "blocks_mined" && *value >= 1));
    assert!(status.counters.contains(&("restarts", 0)));
}

#[test]
fn only_one_macro_runs_at_a_time() {
    let mut harness = quarry();
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();

    let again = harness.core.start_macro(0, &harness.world, mining_params("Pickaxe"));
    assert_eq!(again, Err(MacroError::AlreadyRunning(MiningMacro::NAME)));
    let other = harness
        .core
        .start_macro(0, &harness.world, MacroParams::Commission { tool: "Pickaxe".to_string() });
    assert_eq!(other, Err(MacroError::AlreadyRunning(MiningMacro::NAME)));

    harness.core.stop_macro().unwrap();
    assert!(!harness.core.status(harness.now).running);
    assert_eq!(harness.core.stop_macro(), Err(MacroError::NotRunning));
    assert_eq!(harness.core.pause_macro(harness.now), Err(MacroError::NotRunning));
}

#[test]
fn missing_tool_refuses_to_start() {
    let mut harness = quarry();
    let result = harness.core.start_macro(0, &harness.world, mining_params("Gemstone Drill"));
    assert!(matches!(result, Err(MacroError::Precondition(_))));

    let status = harness.core.status(0);
    assert!(!status.running);
    assert_eq!(status.active, None);
    assert!(status.last_error.unwrap().contains("Gemstone Drill"));
}

#[test]
fn pause_keeps_progress_and_resumes_owned_features() {
    let mut harness = quarry();
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();
    assert!(harness.run_until(2_000, |harness| harness.core.features().is_running(BlockMiner::NAME)));

    harness.core.pause_macro(harness.now).unwrap();
    let uptime = harness.core.status(harness.now).uptime;
    harness.run_for(1_000);

    let status = harness.core.status(harness.now);
    assert!(status.paused);
    assert_eq!(status.uptime, uptime);
    assert!(!harness.core.features().is_running(BlockMiner::NAME));
    assert!(harness.world.digging_at().is_none());

    harness.core.resume_macro(harness.now).unwrap();
    assert!(harness.core.features().is_running(BlockMiner::NAME));
    assert!(!harness.core.features().is_running(AutoChestUnlocker::NAME));
    let mined = harness.run_until(5_000, |harness| harness.block(IVec3::new(2, 64, 0)).is_air());
    assert!(mined);
}

#[test]
fn stats_failure_stops_the_macro() {
    let mut harness = quarry();
    harness.menus.clear();
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();

    let stopped = harness.run_until(30_000, |harness| !harness.core.status(harness.now).running);
    assert!(stopped);
    let error = harness.core.status(harness.now).last_error.unwrap();
    assert!(error.starts_with("Could not read mining stats"), "{}", error);
    assert!(harness.world.chat_log.iter().filter(|message| *message == "/sbmenu").count() >= 3);
}

/// Stats menu answered, but the only mithril is inside the scan radius and out of reach.
fn out_of_reach() -> Harness {
    let mut world = flat_world();
    world.set_block(IVec3::new(5, 64, 0), BlockState::solid(MITHRIL));
    let mut harness = Harness::new(Config::default(), world);
    harness.menus.push(("/sbmenu".to_string(), profile_menu("1,250")));
    harness
}

#[test]
fn unreachable_blocks_restart_the_macro() {
    let mut harness = out_of_reach();
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();
    assert!(harness.run_until(2_000, |harness| mining_state(harness) == MiningState::Mining));

    let restarted = harness.run_until(8_000, |harness| {
        harness.core.status(harness.now).counters.contains(&("restarts", 1))
    });
    assert!(restarted);
    assert_ne!(mining_state(&harness), MiningState::Mining);
    assert!(harness.core.status(harness.now).running);
    assert!(harness.run_until(2_000, |harness| mining_state(harness) == MiningState::Mining));
    assert!(harness.world.chat_log.iter().filter(|message| *message == "/sbmenu").count() >= 2);
}

#[test]
fn endless_restarts_stop_the_macro() {
    let mut harness = out_of_reach();
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();

    let stopped = harness.run_until(60_000, |harness| !harness.core.status(harness.now).running);
    assert!(stopped);
    let status = harness.core.status(harness.now);
    assert_eq!(status.last_error.as_deref(), Some("No reachable blocks after 3 restarts"));
    assert!(status.counters.contains(&("restarts", 4)));
    assert!(!harness.core.features().is_running(BlockMiner::NAME));
}

#[test]
fn no_blocks_around_stops_the_macro() {
    let mut harness = Harness::new(Config::default(), flat_world());
    harness.menus.push(("/sbmenu".to_string(), profile_menu("1,250")));
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();
    assert!(harness.run_until(2_000, |harness| harness.core.features().is_running(BlockMiner::NAME)));

    let stopped = harness.run_until(8_000, |harness| !harness.core.status(harness.now).running);
    assert!(stopped);
    let status = harness.core.status(harness.now);
    assert_eq!(status.last_error.as_deref(), Some("no blocks to mine were found nearby"));
    assert!(status.counters.contains(&("restarts", 0)));
}

#[test]
fn chests_interrupt_mining() {
    let chest = IVec3::new(-2, 64, -2);
    let mut harness = quarry();
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();
    assert!(harness.run_until(2_000, |harness| mining_state(harness) == MiningState::Mining));

    let chest_state = BlockState::passable(2_954);
    harness.world.set_block(chest, chest_state);
    let event = WorldEvent::BlockChange { position: chest, state: chest_state };
    harness.core.dispatch(harness.now, &harness.world, &event);
    assert_eq!(harness.core.services().queues.chests.len(), 1);

    let unlocking = harness.run_until(1_000, |harness| harness.core.features().is_running(AutoChestUnlocker::NAME));
    assert!(unlocking);
    assert_eq!(mining_state(&harness), MiningState::UnlockingChests);
    assert!(!harness.core.features().is_running(BlockMiner::NAME));

    harness.run_for(500);
    harness.world.set_block(chest, BlockState::AIR);
    let resumed = harness.run_until(2_000, |harness| mining_state(harness) == MiningState::Mining);
    assert!(resumed);
    assert!(harness.core.features().is_running(BlockMiner::NAME));
    assert_eq!(harness.core.features().get::<AutoChestUnlocker>().unwrap().unlocked(), 1);
}

#[test]
fn distant_chests_are_not_queued() {
    let mut harness = quarry();
    let far = IVec3::new(40, 64, 0);
    let event = WorldEvent::BlockChange {
        position: far,
        state: BlockState::passable(2_954),
    };
    harness.core.dispatch(0, &harness.world, &event);
    assert!(harness.core.services().queues.chests.is_empty());
}

#[test]
fn full_inventory_is_sold_without_the_tool() {
    let mut harness = quarry();
    for slot in (9..=35).chain(37..=44) {
        let name = if slot < 36 { "Mithril" } else { "Cobblestone" };
        harness.world.inventory.set_slot(slot, Slot::with(ItemStack::new(name, 64)));
    }
    let mut trades = Window::new(3, "Trades", 54);
    for slot in 9..=44 {
        trades.slots[54 + slot - 9] = harness.world.inventory.get_slot(slot).cloned().unwrap_or_default();
    }
    harness.menus.push(("/trades".to_string(), trades));
    harness.core.start_macro(0, &harness.world, mining_params("Pickaxe")).unwrap();

    let selling = harness.run_until(3_000, |harness| mining_state(harness) == MiningState::Selling);
    assert!(selling);
    assert!(!harness.core.features().is_running(BlockMiner::NAME));

    let sold = harness.run_until(10_000, |harness| {
        harness.world.clicks.iter().filter(|(window_id, _)| *window_id == 3).count() == 35
    });
    assert!(sold);
    let pickaxe = 54 + 36 - 9;
    assert!(!harness.world.clicks.contains(&(3, pickaxe)));
    for slot in (9..=35).chain(37..=44) {
        harness.world.inventory.set_slot(slot, Slot::empty());
    }

    let resumed = harness.run_until(2_000, |harness| {
        mining_state(harness) == MiningState::Mining && harness.core.features().is_running(BlockMiner::NAME)
    });
    assert!(resumed);
    assert!(harness.world.window.is_none());
    assert_eq!(harness.core.features().get::<AutoSell>().unwrap().sold(), 35);
}

fn drill(fuel: u32) -> ItemStack {
    let fuel = format!("Fuel: {}/3,000", fuel);
    ItemStack::new("Mithril Drill SX-R226", 1).with_lore(&["Breaking Power 5", fuel.as_str()])
}

#[test]
fn low_fuel_calls_the_mechanic() {
    let mut harness = quarry();
    harness.world.inventory.set_slot(36, Slot::with(drill(50)));
    harness.world.inventory.set_slot(37, Slot::with(ItemStack::new("Abiphone XII Mega", 1)));
    harness.world.inventory.set_slot(12, Slot::with(ItemStack::new("Volta", 4)));
    harness.core.start_macro(0, &harness.world, mining_params("Drill")).unwrap();

    let called = harness.run_until(3_000, |harness| harness.world.used_items.iter().any(|name| name.contains("Abiphone")));
    assert!(called);
    assert_eq!(mining_state(&harness), MiningState::Refueling);

    let mut contacts = Window::new(4, "Abiphone XII Mega", 27);
    contacts.slots[10] = Slot::with(ItemStack::new("Jotraeline Greatforge", 1));
    let opened = harness.world.show_window(contacts);
    harness.core.dispatch(harness.now, &harness.world, &opened);
    assert!(harness.run_until(1_000, |harness| harness.world.clicks.contains(&(4, 10))));

    let mut anvil = Window::new(5, "Drill Anvil", 54);
    anvil.slots[13] = Slot::with(drill(3_000));
    anvil.slots[22] = Slot::with(ItemStack::new("Refuel Drill", 1));
    let opened = harness.world.show_window(anvil);
    harness.core.dispatch(harness.now, &harness.world, &opened);

    let refueled = harness.run_until(5_000, |harness| {
        harness.core.features().get::<AutoDrillRefuel>().unwrap().refuels() == 1
    });
    assert!(refueled);
    harness.world.inventory.set_slot(36, Slot::with(drill(3_000)));
    let anvil_clicks: Vec<(i32, usize)> = harness.world.clicks.iter().copied().filter(|(window_id, _)| *window_id == 5).collect();
    assert_eq!(anvil_clicks, vec![(5, 81), (5, 57), (5, 22), (5, 13)]);

    let resumed = harness.run_until(2_000, |harness| {
        mining_state(harness) == MiningState::Mining && harness.core.features().is_running(BlockMiner::NAME)
    });
    assert!(resumed);
    assert!(harness.core.status(harness.now).counters.contains(&("refuels", 1)));
}

fn commissions_menu() -> Window {
    let mut window = Window::new(2, "Commissions", 27);
    window.slots[11] = Slot::with(ItemStack::new("Mithril Miner", 1).with_lore(&["COMPLETED", "Click to claim rewards!"]));
    window.slots[12] = Slot::with(ItemStack::new("Goblin Slayer", 1).with_lore(&["Progress: 3/10"]));
    window
}

fn commission_state(harness: &Harness) -> CommissionState {
    harness.core.macros().get::<CommissionMacro>().unwrap().state().clone()
}

#[test]
fn commission_macro_works_then_claims() {
    let mut config = Config::default();
    config
        .commission_macro
        .commission_blocks
        .insert("Mithril Miner".to_string(), vec![MITHRIL]);
    let mut world = flat_world();
    world.set_block(IVec3::new(2, 64, 0), BlockState::solid(MITHRIL));
    world.scoreboard = vec!["Dec 1st".to_string(), " ⏣ Dwarven Mines".to_string()];
    world.tablist = vec!["Commissions:".to_string(), " Mithril Miner: 45%".to_string()];
    world
        .entities
        .push(Entity::new(12, EntityKind::Npc, "Emissary Braum", DVec3::new(0.5, 64.0, 3.5)));
    let mut harness = Harness::new(config, world);

    harness
        .core
        .start_macro(0, &harness.world, MacroParams::Commission { tool: "Pickaxe".to_string() })
        .unwrap();
    let working = harness.run_until(2_000, |harness| {
        matches!(commission_state(harness), CommissionState::Working(_)) && harness.core.features().is_running(BlockMiner::NAME)
    });
    assert!(working);
    assert!(harness.world.chat_log.is_empty());

    harness.world.tablist[1] = " Mithril Miner: DONE".to_string();
    let interacted = harness.run_until(3_000, |harness| !harness.world.interactions.is_empty());
    assert!(interacted);
    assert_eq!(harness.world.interactions[0], 12);
    assert_eq!(commission_state(&harness), CommissionState::Claiming);
    assert!(!harness.core.features().is_running(BlockMiner::NAME));

    harness.world.tablist[1] = " Mithril Miner: 0%".to_string();
    let opened = harness.world.show_window(commissions_menu());
    harness.core.dispatch(harness.now, &harness.world, &opened);

    let back_to_work = harness.run_until(3_000, |harness| {
        commission_state(harness) == CommissionState::Working("Mithril Miner".to_string())
    });
    assert!(back_to_work);
    assert_eq!(harness.world.clicks, vec![(2, 11)]);
    assert!(harness.world.window.is_none());
    let status = harness.core.status(harness.now);
    assert!(status.counters.contains(&("commissions_claimed", 1)));
}

#[test]
fn commission_macro_warps_outside_the_mines() {
    let mut config = Config::default();
    config
        .commission_macro
        .commission_blocks
        .insert("Mithril Miner".to_string(), vec![MITHRIL]);
    let mut world = flat_world();
    world.scoreboard = vec![" ⏣ Village".to_string()];
    let mut harness = Harness::new(config, world);

    harness
        .core
        .start_macro(0, &harness.world, MacroParams::Commission { tool: "Pickaxe".to_string() })
        .unwrap();
    assert!(harness.run_until(500, |harness| !harness.world.chat_log.is_empty()));
    assert_eq!(harness.world.chat_log[0], "/warp forge");
    assert_eq!(commission_state(&harness), CommissionState::Warping);

    harness.world.scoreboard = vec![" ⏣ Dwarven Mines".to_string()];
    let checked = harness.run_until(6_000, |harness| commission_state(harness) != CommissionState::Warping);
    assert!(checked);
}
