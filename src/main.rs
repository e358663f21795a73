use commission_bot::clock::Millis;
use commission_bot::config::Config;
use commission_bot::features::MinerParams;
use commission_bot::macros::MacroParams;
use commission_bot::world::{BlockState, ItemStack, SimWorld, Slot, Window};
use commission_bot::Core;
use glam::{DVec3, IVec3};
use log::*;

const MITHRIL: u32 = 7_118;
const TICK: Millis = 50;

/// A small quarry with a handful of ore blocks around the actor.
fn quarry() -> SimWorld {
    let mut world = SimWorld::new(DVec3::new(0.5, 64.0, 0.5));
    world.fill_floor(63, (-6, -6), (6, 6), BlockState::solid(1));
    for position in [IVec3::new(2, 64, 0), IVec3::new(0, 65, -2), IVec3::new(-2, 64, 1), IVec3::new(1, 66, 2)] {
        world.set_block(position, BlockState::solid(MITHRIL));
    }
    world.inventory.set_slot(36, Slot::with(ItemStack::new("Titanium Pickaxe", 1)));
    world
}

fn profile_menu() -> Window {
    let mut window = Window::new(1, "SkyBlock Menu", 54);
    window.slots[13] = Slot::with(ItemStack::new("Your SkyBlock Profile", 1).with_lore(&["⸕ Mining Speed 1,250"]));
    window
}

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match Config::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!("Could not load {}: {}", path, e);
                return;
            }
        },
        None => Config::default(),
    };

    let mut world = quarry();
    let mut core = Core::new(config, 0);
    let params = MinerParams::new(vec![vec![MITHRIL]], vec![1], 0.0, "Pickaxe");
    if let Err(e) = core.start_macro(0, &world, MacroParams::Mining(params)) {
        error!("{}", e);
        return;
    }

    let mut now = 0;
    let mut answered = 0;
    while now < 60_000 && core.status(now).running {
        now += TICK;
        let commands = core.tick(now, &world);
        let mut events = world.apply(now, &commands);
        // The game answers the menu command with the menu window.
        if world.chat_log.len() > answered {
            answered = world.chat_log.len();
            if world.chat_log.iter().any(|message| message == "/sbmenu") && world.window.is_none() {
                events.push(world.show_window(profile_menu()));
            }
        }
        for event in &events {
            core.dispatch(now, &world, event);
        }
    }

    let status = core.status(now);
    info!("Stopped after {}ms: {:?}", now, status);
    for (name, value) in &status.counters {
        println!("{}: {}", name, value);
    }
    if let Some(error) = status.last_error {
        println!("last error: {}", error);
    }
}
