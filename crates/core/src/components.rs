//! Plain component records composed into actors and items.
//! This module exists so stat bookkeeping stays free of world lookups.
//! It does not own death, damage messages, or effect resolution; see `combat` and `action`.

use serde::{Deserialize, Serialize};

use crate::types::{EntityId, EquipmentSlot};

pub const LEVEL_UP_HP: i32 = 20;
pub const LEVEL_UP_POWER: i32 = 1;
pub const LEVEL_UP_DEFENSE: i32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fighter {
    pub max_hp: i32,
    pub base_power: i32,
    pub base_defense: i32,
    hp: i32,
}

impl Fighter {
    pub fn new(hp: i32, base_power: i32, base_defense: i32) -> Self {
        Self { max_hp: hp, base_power, base_defense, hp }
    }

    pub fn hp(&self) -> i32 {
        self.hp
    }

    pub fn set_hp(&mut self, value: i32) {
        self.hp = value.clamp(0, self.max_hp);
    }

    /// Returns how much was actually recovered.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if self.hp >= self.max_hp {
            return 0;
        }
        let before = self.hp;
        self.set_hp(self.hp + amount);
        self.hp - before
    }

    pub fn is_at_full_health(&self) -> bool {
        self.hp >= self.max_hp
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    pub capacity: usize,
    pub items: Vec<EntityId>,
}

impl Inventory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity, items: Vec::new() }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn contains(&self, item: EntityId) -> bool {
        self.items.contains(&item)
    }

    pub(crate) fn remove(&mut self, item: EntityId) -> bool {
        let Some(index) = self.items.iter().position(|&held| held == item) else {
            return false;
        };
        self.items.remove(index);
        true
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Equipment {
    pub weapon: Option<EntityId>,
    pub armor: Option<EntityId>,
}

impl Equipment {
    pub fn slot(&self, slot: EquipmentSlot) -> Option<EntityId> {
        match slot {
            EquipmentSlot::Weapon => self.weapon,
            EquipmentSlot::Armor => self.armor,
        }
    }

    pub fn slot_mut(&mut self, slot: EquipmentSlot) -> &mut Option<EntityId> {
        match slot {
            EquipmentSlot::Weapon => &mut self.weapon,
            EquipmentSlot::Armor => &mut self.armor,
        }
    }

    pub fn is_equipped(&self, item: EntityId) -> bool {
        self.weapon == Some(item) || self.armor == Some(item)
    }

    pub fn equipped(&self) -> impl Iterator<Item = EntityId> {
        self.weapon.into_iter().chain(self.armor)
    }

    /// Clears whichever slot holds `item`; returns whether one did.
    pub(crate) fn clear(&mut self, item: EntityId) -> bool {
        if self.weapon == Some(item) {
            self.weapon = None;
            true
        } else if self.armor == Some(item) {
            self.armor = None;
            true
        } else {
            false
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub current_level: u32,
    pub current_xp: u32,
    pub level_up_base: u32,
    pub level_up_factor: u32,
    pub xp_given: u32,
}

impl Level {
    /// Progression curve for an actor that can level.
    pub fn curve(level_up_base: u32, level_up_factor: u32) -> Self {
        Self { current_level: 1, current_xp: 0, level_up_base, level_up_factor, xp_given: 0 }
    }

    /// Level record for a monster that only hands out experience.
    pub fn reward(xp_given: u32) -> Self {
        Self { current_level: 1, current_xp: 0, level_up_base: 0, level_up_factor: 0, xp_given }
    }

    pub fn tracks_experience(&self) -> bool {
        self.level_up_base > 0
    }

    pub fn experience_to_next_level(&self) -> u32 {
        self.level_up_base + (self.current_level - 1) * self.level_up_factor
    }

    /// Adds experience and returns how many levels were gained.
    pub fn add_xp(&mut self, xp: u32) -> u32 {
        if xp == 0 || !self.tracks_experience() {
            return 0;
        }
        self.current_xp += xp;
        let mut gained = 0;
        while self.current_xp >= self.experience_to_next_level() {
            self.current_xp -= self.experience_to_next_level();
            self.current_level += 1;
            gained += 1;
        }
        gained
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Consumable {
    Healing { amount: i32 },
    Lightning { damage: i32, max_range: f32 },
    Confusion { turns: u32 },
    Fireball { damage: i32, radius: f32 },
}

impl Consumable {
    /// Whether activation needs a target cell chosen by the user.
    pub fn needs_target(&self) -> bool {
        matches!(self, Self::Confusion { .. } | Self::Fireball { .. })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equippable {
    pub slot: EquipmentSlot,
    pub power_bonus: i32,
    pub defense_bonus: i32,
}
