mod common;

use commission_bot::config::Config;
use commission_bot::error::ControlError;
use commission_bot::feature::Feature;
use commission_bot::features::{BlockMiner, BlockMinerError, MinerParams, MinerState};
use commission_bot::world::{BlockState, WorldEvent};
use common::*;
use glam::IVec3;

fn miner(harness: &Harness) -> &BlockMiner {
    harness.core.features().get::<BlockMiner>().unwrap()
}

fn mithril_params() -> MinerParams {
    MinerParams::new(vec![vec![MITHRIL]], vec![1], 1_000.0, "Pickaxe")
}

#[test]
fn breaks_a_nearby_block() {
    let target = IVec3::new(3, 64, 0);
    let mut world = flat_world();
    world.set_block(target, BlockState::solid(MITHRIL));
    let mut harness = Harness::new(Config::default(), world);
    harness.core.start_miner(mithril_params(), &harness.world).unwrap();

    let mut seen = Vec::new();
    let broken = harness.run_until(5_000, |harness| {
        let state = miner(harness).state();
        if seen.last().map(|last| std::mem::discriminant(last) != std::mem::discriminant(&state)).unwrap_or(true) {
            seen.push(state);
        }
        harness.block(target).is_air() && state == MinerState::Starting
    });

    assert!(broken);
    assert!(seen.contains(&MinerState::ChoosingBlock));
    assert!(seen.iter().any(|state| matches!(state, MinerState::Breaking { target: t, .. } if *t == target)));
    assert_eq!(miner(&harness).blocks_mined(), 1);
}

#[test]
fn gives_up_without_blocks() {
    let mut harness = Harness::new(Config::default(), flat_world());
    harness.core.start_miner(mithril_params(), &harness.world).unwrap();

    harness.run_for(5_000);
    assert!(miner(&harness).base().is_enabled());

    harness.run_for(100);
    assert!(!miner(&harness).base().is_enabled());
    assert_eq!(miner(&harness).error(), Some(BlockMinerError::NotEnoughBlocks));
}

#[test]
fn refuses_zero_priorities() {
    let mut world = flat_world();
    world.set_block(IVec3::new(2, 64, 0), BlockState::solid(MITHRIL));
    let mut harness = Harness::new(Config::default(), world);

    let params = MinerParams::new(vec![vec![MITHRIL]], vec![0], 1_000.0, "Pickaxe");
    let result = harness.core.start_miner(params, &harness.world);
    assert_eq!(result, Err(ControlError::Miner(BlockMinerError::NoTargetBlocks)));

    harness.run_for(500);
    assert!(!miner(&harness).base().is_enabled());
    assert!(harness.world.digging_at().is_none());
}

#[test]
fn refuses_without_tool() {
    let mut harness = Harness::new(Config::default(), flat_world());
    let params = MinerParams::new(vec![vec![MITHRIL]], vec![1], 1_000.0, "Gemstone Drill");
    let result = harness.core.start_miner(params, &harness.world);
    assert_eq!(result, Err(ControlError::Miner(BlockMinerError::NoToolsAvailable)));
}

#[test]
fn stops_when_ability_never_triggers() {
    let mut config = Config::default();
    config.miner.ability_timeout = 200;
    let mut world = flat_world();
    world.set_block(IVec3::new(2, 64, 0), BlockState::solid(MITHRIL));
    let mut harness = Harness::new(config, world);
    harness.core.start_miner(mithril_params(), &harness.world).unwrap();

    let available = WorldEvent::Chat("Mining Speed Boost is now available!".to_string());
    harness.core.dispatch(0, &harness.world, &available);

    let stopped = harness.run_until(5_000, |harness| !miner(harness).base().is_enabled());
    assert!(stopped);
    assert_eq!(miner(&harness).error(), Some(BlockMinerError::NoPickaxeAbility));
    assert!(harness.world.used_items.len() >= 3);
}

#[test]
fn used_ability_goes_back_to_mining() {
    let target = IVec3::new(2, 64, 0);
    let mut config = Config::default();
    config.miner.ability_timeout = 1_000;
    let mut world = flat_world();
    world.set_block(target, BlockState::solid(MITHRIL));
    let mut harness = Harness::new(config, world);
    harness.core.start_miner(mithril_params(), &harness.world).unwrap();

    harness.core.dispatch(0, &harness.world, &WorldEvent::Chat("Mining Speed Boost is now available!".to_string()));
    let used = harness.run_until(1_000, |harness| !harness.world.used_items.is_empty());
    assert!(used);

    let confirmation = WorldEvent::Chat("You used your Mining Speed Boost Pickaxe Ability!".to_string());
    harness.core.dispatch(harness.now, &harness.world, &confirmation);
    let broken = harness.run_until(3_000, |harness| harness.block(target).is_air());
    assert!(broken);
    assert!(miner(&harness).error().is_none());
}

#[test]
fn stop_clears_the_dig() {
    let target = IVec3::new(2, 64, 0);
    let mut world = flat_world();
    world.dig_time = 10_000;
    world.set_block(target, BlockState::solid(MITHRIL));
    let mut harness = Harness::new(Config::default(), world);
    harness.core.start_miner(mithril_params(), &harness.world).unwrap();

    let digging = harness.run_until(2_000, |harness| harness.world.digging_at().is_some());
    assert!(digging);

    harness.core.stop_feature(BlockMiner::NAME).unwrap();
    harness.step();
    assert!(harness.world.digging_at().is_none());
    assert_eq!(miner(&harness).state(), MinerState::Starting);
    assert!(harness.core.stop_feature("NoSuchFeature").is_err());
}

#[test]
fn blocks_out_of_reach_end_with_no_points() {
    let mut world = flat_world();
    world.set_block(IVec3::new(5, 64, 0), BlockState::solid(MITHRIL));
    let mut harness = Harness::new(Config::default(), world);
    harness.core.start_miner(mithril_params(), &harness.world).unwrap();

    harness.run_for(5_000);
    assert!(miner(&harness).base().is_enabled());
    assert!(harness.world.digging_at().is_none());

    harness.run_for(100);
    assert!(!miner(&harness).base().is_enabled());
    assert_eq!(miner(&harness).error(), Some(BlockMinerError::NoPointsFound));
    assert_eq!(miner(&harness).blocks_mined(), 0);
}
