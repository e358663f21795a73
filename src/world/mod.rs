//! The world/actor adapter boundary.
//!
//! The core never talks to the game connection directly. Each tick it reads a
//! [`WorldView`] and pushes [`Command`]s into a buffer, the same way a mission
//! used to push serverbound packets. Incoming notifications arrive as
//! [`WorldEvent`]s through a single dispatch entry point.

use crate::angle::Angle;
use glam::{DVec3, IVec3};

pub mod entities;
pub mod inventory;
pub mod map;
pub mod sim;
pub mod tablist;

pub use entities::*;
pub use inventory::*;
pub use map::WorldQueries;
pub use sim::SimWorld;

pub type BlockStateId = u32;
pub type EntityId = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockState {
    pub id: BlockStateId,
    /// Has a full collision box and blocks sight.
    pub solid: bool,
}

impl BlockState {
    pub const AIR_ID: BlockStateId = 0;
    pub const AIR: BlockState = BlockState { id: Self::AIR_ID, solid: false };

    pub const fn solid(id: BlockStateId) -> BlockState {
        BlockState { id, solid: true }
    }

    pub const fn passable(id: BlockStateId) -> BlockState {
        BlockState { id, solid: false }
    }

    pub fn is_air(&self) -> bool {
        self.id == Self::AIR_ID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Control {
    Forward,
    Back,
    Left,
    Right,
    Jump,
    Sprint,
    Sneak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFace {
    Bottom,
    Top,
    North,
    South,
    West,
    East,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    Pickup,
    QuickMove,
}

/// Input the core asks the adapter to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetControl { control: Control, pressed: bool },
    Look(Angle),
    StartDigging { position: IVec3, face: BlockFace },
    StopDigging,
    UseItem,
    Attack(EntityId),
    Interact(EntityId),
    ActivateBlock(IVec3),
    ClickSlot { window_id: i32, slot: usize, button: MouseButton, mode: ClickMode },
    Chat(String),
    /// Hold the stack found at a player inventory slot.
    HoldItem { slot: usize },
    CloseWindow,
}

/// Notification delivered by the adapter between ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    Chat(String),
    BlockChange { position: IVec3, state: BlockState },
    WindowOpened { window_id: i32, title: String },
    WindowClosed { window_id: i32 },
    InventoryUpdate,
    EntitySpawn(EntityId),
    EntityDespawn(EntityId),
    EntityMove(EntityId),
}

/// Read-only projection of the world for the current tick.
pub trait WorldView {
    /// Feet position of the actor.
    fn position(&self) -> DVec3;
    /// Movement per tick.
    fn velocity(&self) -> DVec3;
    fn facing(&self) -> Angle;
    fn block_at(&self, position: IVec3) -> BlockState;
    fn entities(&self) -> &[Entity];
    fn inventory(&self) -> &PlayerInventory;
    fn open_window(&self) -> Option<&Window>;
    fn tablist(&self) -> &[String];
    fn scoreboard(&self) -> &[String];

    fn eye_height(&self) -> f64 {
        1.62
    }

    fn eye_position(&self) -> DVec3 {
        self.position() + DVec3::new(0.0, self.eye_height(), 0.0)
    }

    /// Block the actor is standing in.
    fn footing(&self) -> IVec3 {
        self.position().floor().as_ivec3()
    }
}
