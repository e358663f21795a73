//! In-memory world used by the demo binary and the tests.

use super::*;
use crate::angle::{clamp_pitch, yaw_direction, Angle};
use crate::clock::Millis;
use log::*;
use std::collections::{BTreeMap, HashMap};

pub struct SimWorld {
    blocks: HashMap<IVec3, BlockState>,
    pub position: DVec3,
    pub velocity: DVec3,
    pub facing: Angle,
    pub entities: Vec<Entity>,
    pub inventory: PlayerInventory,
    pub window: Option<Window>,
    pub tablist: Vec<String>,
    pub scoreboard: Vec<String>,

    pub controls: BTreeMap<Control, bool>,
    /// Time a started dig takes before the block turns to air.
    pub dig_time: Millis,
    digging: Option<(IVec3, Millis)>,
    /// When set, held movement keys move the actor each applied tick.
    pub simulate_movement: bool,

    pub chat_log: Vec<String>,
    pub used_items: Vec<String>,
    pub clicks: Vec<(i32, usize)>,
    pub attacks: Vec<EntityId>,
    pub interactions: Vec<EntityId>,
    pub activated_blocks: Vec<IVec3>,
}

impl SimWorld {
    pub fn new(position: DVec3) -> SimWorld {
        SimWorld {
            blocks: HashMap::new(),
            position,
            velocity: DVec3::ZERO,
            facing: Angle::ZERO,
            entities: Vec::new(),
            inventory: PlayerInventory::new(),
            window: None,
            tablist: Vec::new(),
            scoreboard: Vec::new(),
            controls: BTreeMap::new(),
            dig_time: 250,
            digging: None,
            simulate_movement: false,
            chat_log: Vec::new(),
            used_items: Vec::new(),
            clicks: Vec::new(),
            attacks: Vec::new(),
            interactions: Vec::new(),
            activated_blocks: Vec::new(),
        }
    }

    pub fn set_block(&mut self, position: IVec3, state: BlockState) {
        if state.is_air() {
            self.blocks.remove(&position);
        } else {
            self.blocks.insert(position, state);
        }
    }

    /// Fills a horizontal square of `state` at height `y`.
    pub fn fill_floor(&mut self, y: i32, from: (i32, i32), to: (i32, i32), state: BlockState) {
        for x in from.0..=to.0 {
            for z in from.1..=to.1 {
                self.set_block(IVec3::new(x, y, z), state);
            }
        }
    }

    pub fn is_pressed(&self, control: Control) -> bool {
        self.controls.get(&control).copied().unwrap_or(false)
    }

    pub fn digging_at(&self) -> Option<IVec3> {
        self.digging.map(|(position, _)| position)
    }

    pub fn show_window(&mut self, window: Window) -> WorldEvent {
        let event = WorldEvent::WindowOpened {
            window_id: window.id,
            title: window.title.clone(),
        };
        self.window = Some(window);
        event
    }

    /// Applies the commands emitted during the tick at `now` and advances
    /// digging and movement. Returns the events the change produced.
    pub fn apply(&mut self, now: Millis, commands: &[Command]) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        for command in commands {
            match command {
                Command::SetControl { control, pressed } => {
                    self.controls.insert(*control, *pressed);
                }
                Command::Look(angle) => {
                    self.facing = Angle::new(angle.yaw, clamp_pitch(angle.pitch));
                }
                Command::StartDigging { position, .. } => {
                    self.digging = Some((*position, now));
                }
                Command::StopDigging => {
                    self.digging = None;
                }
                Command::UseItem => {
                    let name = self.inventory.held_item().map(|item| item.name.clone()).unwrap_or_default();
                    self.used_items.push(name);
                }
                Command::Attack(id) => self.attacks.push(*id),
                Command::Interact(id) => self.interactions.push(*id),
                Command::ActivateBlock(position) => self.activated_blocks.push(*position),
                Command::ClickSlot { window_id, slot, .. } => self.clicks.push((*window_id, *slot)),
                Command::Chat(message) => self.chat_log.push(message.clone()),
                Command::HoldItem { slot } => self.hold_item(*slot),
                Command::CloseWindow => {
                    if let Some(window) = self.window.take() {
                        events.push(WorldEvent::WindowClosed { window_id: window.id });
                    }
                }
            }
        }

        if let Some((position, started_at)) = self.digging {
            if now.saturating_sub(started_at) >= self.dig_time {
                trace!("Block at {} broken", position);
                self.set_block(position, BlockState::AIR);
                self.digging = None;
                events.push(WorldEvent::BlockChange {
                    position,
                    state: BlockState::AIR,
                });
            }
        }

        if self.simulate_movement {
            self.step_movement();
        }
        events
    }

    fn hold_item(&mut self, slot: usize) {
        if (HOTBAR_START..=44).contains(&slot) {
            self.inventory.set_held_hotbar_slot(slot - HOTBAR_START);
            return;
        }
        let held = HOTBAR_START + self.inventory.held_hotbar_slot();
        let picked = self.inventory.get_slot(slot).cloned().unwrap_or_default();
        let previous = self.inventory.get_slot(held).cloned().unwrap_or_default();
        self.inventory.set_slot(held, picked);
        self.inventory.set_slot(slot, previous);
    }

    fn step_movement(&mut self) {
        if !self.is_pressed(Control::Forward) {
            self.velocity = DVec3::ZERO;
            return;
        }
        let speed = if self.is_pressed(Control::Sprint) { 0.28 } else { 0.22 };
        let mut next = self.position + yaw_direction(self.facing.yaw) * speed;
        if self.is_pressed(Control::Jump) && !self.can_walk_between(self.position, next) {
            let raised = next + DVec3::Y;
            if self.can_walk_between(self.position + DVec3::Y, raised) {
                next = raised;
            }
        }
        if self.can_walk_between(self.position, next) {
            while !self.is_on_ground(next) && next.y > self.position.y - 3.0 {
                next.y -= 1.0;
            }
            self.velocity = next - self.position;
            self.position = next;
        } else {
            self.velocity = DVec3::ZERO;
        }
    }
}

impl WorldView for SimWorld {
    fn position(&self) -> DVec3 {
        self.position
    }

    fn velocity(&self) -> DVec3 {
        self.velocity
    }

    fn facing(&self) -> Angle {
        self.facing
    }

    fn block_at(&self, position: IVec3) -> BlockState {
        self.blocks.get(&position).copied().unwrap_or(BlockState::AIR)
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn inventory(&self) -> &PlayerInventory {
        &self.inventory
    }

    fn open_window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    fn tablist(&self) -> &[String] {
        &self.tablist
    }

    fn scoreboard(&self) -> &[String] {
        &self.scoreboard
    }
}
