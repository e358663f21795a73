mod common;

use commission_bot::config::Config;
use commission_bot::error::ControlError;
use commission_bot::features::{AutoMobKiller, MobKillerError, MobKillerParams};
use commission_bot::world::{Entity, EntityKind, ItemStack, Slot};
use common::*;
use glam::DVec3;

fn killer(harness: &Harness) -> &AutoMobKiller {
    harness.core.features().get::<AutoMobKiller>().unwrap()
}

fn armed_world() -> commission_bot::world::SimWorld {
    let mut world = flat_world();
    world.inventory.set_slot(37, Slot::with(ItemStack::new("Aspect of the Dragons Sword", 1)));
    world
}

#[test]
fn attacks_until_the_mob_dies() {
    let mut config = Config::default();
    config.mob_killer.search_timeout = 1_000;
    let mut world = armed_world();
    world
        .entities
        .push(Entity::new(7, EntityKind::Mob, "Goblin", DVec3::new(2.5, 64.0, 0.5)));
    world
        .entities
        .push(Entity::new(8, EntityKind::Npc, "Goblin Trader", DVec3::new(1.5, 64.0, 1.5)));
    let mut harness = Harness::new(config, world);
    harness
        .core
        .start_mob_killer(MobKillerParams::new(&["goblin"], "Sword"), &harness.world)
        .unwrap();

    let attacked = harness.run_until(1_000, |harness| !harness.world.attacks.is_empty());
    assert!(attacked);
    assert_eq!(killer(&harness).target(), Some(7));
    assert!(harness.world.inventory.is_holding("Sword"));
    assert!(harness.world.attacks.iter().all(|id| *id == 7));

    harness.world.entities[0].health = Some(0.0);
    assert!(harness.run_until(500, |harness| killer(harness).kills() == 1));
    assert_eq!(killer(&harness).target(), None);

    let gave_up = harness.run_until(2_000, |harness| !harness.core.features().is_running(AutoMobKiller::NAME));
    assert!(gave_up);
    assert_eq!(killer(&harness).error(), Some(MobKillerError::NoEntities));
}

#[test]
fn unreachable_mobs_are_blacklisted() {
    let mut world = armed_world();
    world
        .entities
        .push(Entity::new(9, EntityKind::Mob, "Goblin", DVec3::new(0.5, 64.0, 12.5)));
    let mut harness = Harness::new(Config::default(), world);
    harness
        .core
        .start_mob_killer(MobKillerParams::new(&["Goblin"], "Sword"), &harness.world)
        .unwrap();

    let blacklisted = harness.run_until(1_000, |harness| {
        harness.core.services().queues.mobs.is_blacklisted(9, harness.now)
    });
    assert!(blacklisted);
    harness.run_for(500);
    assert_eq!(killer(&harness).target(), None);
    assert!(harness.world.attacks.is_empty());
    assert!(harness.core.features().is_running(AutoMobKiller::NAME));
}

#[test]
fn refuses_without_weapon() {
    let mut harness = Harness::new(Config::default(), flat_world());
    let result = harness
        .core
        .start_mob_killer(MobKillerParams::new(&["Goblin"], "Sword"), &harness.world);
    assert_eq!(result, Err(ControlError::MobKiller(MobKillerError::NoWeapon)));
    assert!(!harness.core.features().is_running(AutoMobKiller::NAME));
}
