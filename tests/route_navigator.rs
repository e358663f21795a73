mod common;

use commission_bot::config::Config;
use commission_bot::features::{BlockMiner, RouteNavigator};
use commission_bot::graph::{Graph, TransportMethod};
use commission_bot::macros::{CommissionMacro, CommissionState, MacroParams};
use commission_bot::world::{BlockState, Control, ItemStack, Slot};
use common::*;
use glam::{DVec3, IVec3};

fn commission_state(harness: &Harness) -> CommissionState {
    harness.core.macros().get::<CommissionMacro>().unwrap().state().clone()
}

/// A commission macro in the mines whose only commission has a route ending at `end`.
fn routed(end: IVec3, action: TransportMethod) -> Harness {
    let mut config = Config::default();
    config
        .commission_macro
        .commission_blocks
        .insert("Mithril Miner".to_string(), vec![MITHRIL]);
    config
        .commission_macro
        .routes
        .insert("Mithril Miner".to_string(), "mithril".to_string());
    let mut world = flat_world();
    world.simulate_movement = true;
    world.set_block(end + IVec3::new(2, 0, 0), BlockState::solid(MITHRIL));
    world.scoreboard = vec![" ⏣ Dwarven Mines".to_string()];
    world.tablist = vec!["Commissions:".to_string(), " Mithril Miner: 10%".to_string()];

    let mut graph = Graph::new();
    let start = graph.add_waypoint(IVec3::new(0, 64, 0), TransportMethod::Move);
    let end = graph.add_waypoint(end, action);
    graph.connect(start, end, true).unwrap();

    let mut harness = Harness::new(config, world);
    harness.core.graphs_mut().insert("mithril", graph);
    harness
}

fn start(harness: &mut Harness) {
    harness
        .core
        .start_macro(0, &harness.world, MacroParams::Commission { tool: "Pickaxe".to_string() })
        .unwrap();
}

#[test]
fn walks_the_route_before_working() {
    let mut harness = routed(IVec3::new(0, 64, 5), TransportMethod::Move);
    start(&mut harness);

    let navigating = harness.run_until(500, |harness| {
        matches!(commission_state(harness), CommissionState::Navigating(_))
    });
    assert!(navigating);
    assert!(harness.core.features().is_running(RouteNavigator::NAME));

    let working = harness.run_until(8_000, |harness| {
        matches!(commission_state(harness), CommissionState::Working(_))
    });
    assert!(working);
    assert!(harness.core.features().get::<RouteNavigator>().unwrap().succeeded());
    assert_eq!(harness.world.position.floor().as_ivec3(), IVec3::new(0, 64, 5));

    assert!(harness.run_until(500, |harness| harness.core.features().is_running(BlockMiner::NAME)));
}

#[test]
fn teleports_with_the_void_item() {
    let mut harness = routed(IVec3::new(0, 64, 6), TransportMethod::Aotv);
    harness
        .world
        .inventory
        .set_slot(38, Slot::with(ItemStack::new("Aspect of the Void", 1)));
    start(&mut harness);

    let used = harness.run_until(3_000, |harness| harness.world.used_items.iter().any(|name| name == "Aspect of the Void"));
    assert!(used);
    assert!(!harness.world.is_pressed(Control::Forward));
    harness.world.position = DVec3::new(0.5, 64.0, 6.5);

    let working = harness.run_until(1_000, |harness| {
        matches!(commission_state(harness), CommissionState::Working(_))
    });
    assert!(working);
    assert_eq!(harness.core.features().get::<RouteNavigator>().unwrap().index(), 2);
}

#[test]
fn missing_teleport_item_stops_the_macro() {
    let mut harness = routed(IVec3::new(0, 64, 6), TransportMethod::Etherwarp);
    start(&mut harness);

    let stopped = harness.run_until(1_000, |harness| !harness.core.status(harness.now).running);
    assert!(stopped);
    let error = harness.core.status(harness.now).last_error.unwrap();
    assert_eq!(error, "the teleport item is not in the inventory");
}
