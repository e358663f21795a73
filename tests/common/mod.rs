#![allow(dead_code)]

use commission_bot::clock::Millis;
use commission_bot::config::Config;
use commission_bot::world::{BlockState, ItemStack, SimWorld, Slot, Window};
use commission_bot::Core;
use glam::{DVec3, IVec3};

pub const TICK: Millis = 50;
pub const MITHRIL: u32 = 7_118;

/// A flat stone floor at y=63 with the actor standing on it at the origin
/// and a pickaxe in the first hotbar slot.
pub fn flat_world() -> SimWorld {
    let mut world = SimWorld::new(DVec3::new(0.5, 64.0, 0.5));
    world.fill_floor(63, (-8, -8), (8, 8), BlockState::solid(1));
    world.inventory.set_slot(36, Slot::with(ItemStack::new("Mithril Pickaxe", 1)));
    world
}

pub fn profile_menu(mining_speed: &str) -> Window {
    let mut window = Window::new(1, "SkyBlock Menu", 54);
    let lore = format!("⸕ Mining Speed {}", mining_speed);
    window.slots[13] = Slot::with(ItemStack::new("Your SkyBlock Profile", 1).with_lore(&[lore.as_str()]));
    window
}

/// Drives a [`Core`] against a [`SimWorld`] the way the adapter would.
pub struct Harness {
    pub core: Core,
    pub world: SimWorld,
    pub now: Millis,
    /// Window shown when the actor sends the matching chat command.
    pub menus: Vec<(String, Window)>,
    answered: usize,
}

impl Harness {
    pub fn new(config: Config, world: SimWorld) -> Harness {
        Harness {
            core: Core::new(config, 7),
            world,
            now: 0,
            menus: Vec::new(),
            answered: 0,
        }
    }

    pub fn step(&mut self) {
        self.now += TICK;
        let commands = self.core.tick(self.now, &self.world);
        let mut events = self.world.apply(self.now, &commands);
        while self.answered < self.world.chat_log.len() {
            let message = self.world.chat_log[self.answered].clone();
            self.answered += 1;
            if let Some((_, window)) = self.menus.iter().find(|(command, _)| *command == message) {
                let window = window.clone();
                events.push(self.world.show_window(window));
            }
        }
        for event in &events {
            self.core.dispatch(self.now, &self.world, event);
        }
    }

    /// Steps until `done` holds or `limit` milliseconds passed. Returns whether `done` held.
    pub fn run_until<F: FnMut(&Harness) -> bool>(&mut self, limit: Millis, mut done: F) -> bool {
        let end = self.now + limit;
        while self.now < end {
            self.step();
            if done(self) {
                return true;
            }
        }
        false
    }

    pub fn run_for(&mut self, duration: Millis) {
        let end = self.now + duration;
        while self.now < end {
            self.step();
        }
    }

    pub fn block(&self, position: IVec3) -> BlockState {
        use commission_bot::world::WorldView;
        self.world.block_at(position)
    }
}
