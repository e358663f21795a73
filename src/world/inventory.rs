use crate::world::map::parse_number;
use array_macro::array;
use log::*;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemStack {
    pub name: String,
    pub count: u32,
    pub lore: Vec<String>,
}

impl ItemStack {
    pub fn new(name: &str, count: u32) -> ItemStack {
        ItemStack {
            name: name.to_string(),
            count,
            lore: Vec::new(),
        }
    }

    pub fn with_lore(mut self, lore: &[&str]) -> ItemStack {
        self.lore = lore.iter().map(|line| line.to_string()).collect();
        self
    }

    pub fn name_contains(&self, fragment: &str) -> bool {
        self.name.to_lowercase().contains(&fragment.to_lowercase())
    }

    pub fn lore_contains(&self, fragment: &str) -> bool {
        self.lore.iter().any(|line| line.contains(fragment))
    }

    /// Reads `Fuel: 1,234/3,000` from the lore.
    pub fn drill_fuel(&self) -> Option<(u64, u64)> {
        let line = self.lore.iter().find(|line| line.trim_start().starts_with("Fuel:"))?;
        let (_, value) = line.split_once(':')?;
        let (current, max) = value.split_once('/')?;
        Some((parse_number(current)? as u64, parse_number(max)? as u64))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slot {
    pub item: Option<ItemStack>,
}

impl Slot {
    pub const fn empty() -> Slot {
        Slot { item: None }
    }

    pub fn with(item: ItemStack) -> Slot {
        Slot { item: Some(item) }
    }
}

pub const PLAYER_INVENTORY_SIZE: usize = 46;
pub const HOTBAR_START: usize = 36;

/// The player window: crafting 0..=4, armor 5..=8, main 9..=35, hotbar 36..=44, offhand 45.
#[derive(Debug, Clone)]
pub struct PlayerInventory {
    slots: [Slot; PLAYER_INVENTORY_SIZE],
    held_hotbar_slot: usize,
}

impl Default for PlayerInventory {
    fn default() -> Self {
        PlayerInventory::new()
    }
}

impl PlayerInventory {
    pub fn new() -> PlayerInventory {
        PlayerInventory {
            slots: array![Slot::empty(); 46],
            held_hotbar_slot: 0,
        }
    }

    pub fn set_slot(&mut self, slot_id: usize, slot: Slot) {
        match self.slots.get_mut(slot_id) {
            Some(target) => *target = slot,
            None => warn!(
                "Failed to set slot {} as there are only {} slots in the player inventory.",
                slot_id, PLAYER_INVENTORY_SIZE
            ),
        }
    }

    pub fn get_slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn get_slot(&self, slot_id: usize) -> Option<&Slot> {
        self.slots.get(slot_id)
    }

    pub fn get_main_inventory(&self) -> &[Slot] {
        &self.slots[9..=35]
    }

    pub fn get_hotbar(&self) -> &[Slot] {
        &self.slots[HOTBAR_START..=44]
    }

    pub fn held_hotbar_slot(&self) -> usize {
        self.held_hotbar_slot
    }

    /// Selects a hotbar slot (0..=8).
    pub fn set_held_hotbar_slot(&mut self, hotbar_slot: usize) {
        if hotbar_slot < 9 {
            self.held_hotbar_slot = hotbar_slot;
        }
    }

    pub fn held_item(&self) -> Option<&ItemStack> {
        self.slots[HOTBAR_START + self.held_hotbar_slot].item.as_ref()
    }

    pub fn is_holding(&self, fragment: &str) -> bool {
        self.held_item().map(|item| item.name_contains(fragment)).unwrap_or(false)
    }

    /// First slot (hotbar first, then main inventory) whose item name contains `fragment`.
    pub fn find_item(&self, fragment: &str) -> Option<usize> {
        (HOTBAR_START..=44)
            .chain(9..=35)
            .find(|slot_id| {
                self.slots[*slot_id]
                    .item
                    .as_ref()
                    .map(|item| item.name_contains(fragment))
                    .unwrap_or(false)
            })
    }

    pub fn find_any(&self, fragments: &[String]) -> Option<usize> {
        fragments.iter().find_map(|fragment| self.find_item(fragment))
    }

    pub fn item(&self, slot_id: usize) -> Option<&ItemStack> {
        self.slots.get(slot_id).and_then(|slot| slot.item.as_ref())
    }

    pub fn count_items(&self, fragment: &str) -> u32 {
        self.slots[9..=44]
            .iter()
            .filter_map(|slot| slot.item.as_ref())
            .filter(|item| item.name_contains(fragment))
            .map(|item| item.count)
            .sum()
    }

    pub fn free_slots(&self) -> usize {
        self.slots[9..=44].iter().filter(|slot| slot.item.is_none()).count()
    }

    pub fn is_full(&self) -> bool {
        self.free_slots() == 0
    }
}

/// Container currently open on top of the player inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub id: i32,
    pub title: String,
    /// Container slots followed by the 36 player inventory slots.
    pub slots: Vec<Slot>,
}

impl Window {
    pub fn new(id: i32, title: &str, container_size: usize) -> Window {
        Window {
            id,
            title: title.to_string(),
            slots: vec![Slot::empty(); container_size + 36],
        }
    }

    pub fn container_size(&self) -> usize {
        self.slots.len().saturating_sub(36)
    }

    pub fn title_contains(&self, fragment: &str) -> bool {
        self.title.contains(fragment)
    }

    pub fn find_item(&self, fragment: &str) -> Option<usize> {
        self.slots.iter().position(|slot| {
            slot.item
                .as_ref()
                .map(|item| item.name_contains(fragment))
                .unwrap_or(false)
        })
    }

    /// Container slot ids whose item satisfies `predicate`.
    pub fn container_slots_where<F: Fn(&ItemStack) -> bool>(&self, predicate: F) -> Vec<usize> {
        self.slots[..self.container_size()]
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.item.as_ref().filter(|item| predicate(item)).map(|_| idx))
            .collect()
    }

    /// Window slot id of a player main/hotbar inventory slot (9..=44).
    pub fn player_slot(&self, inventory_slot: usize) -> Option<usize> {
        if (9..=44).contains(&inventory_slot) {
            Some(self.container_size() + inventory_slot - 9)
        } else {
            None
        }
    }

    pub fn item(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(|slot| slot.item.as_ref())
    }
}
