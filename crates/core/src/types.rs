//! Small value types shared by every module.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct EntityId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { y: self.y + dy, x: self.x + dx }
    }

    pub fn chebyshev(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }

    pub fn euclidean(self, other: Pos) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Draw order at a shared cell; later tiers are drawn on top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RenderTier {
    Corpse,
    Item,
    Actor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EquipmentSlot {
    Weapon,
    Armor,
}

/// The eight compass steps, in the order used for deterministic tie-breaks.
pub const DIRECTIONS: [(i32, i32); 8] =
    [(0, -1), (1, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1)];

pub mod palette {
    use super::Rgb;

    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);
    pub const PLAYER_ATTACK: Rgb = Rgb(0xE0, 0xE0, 0xE0);
    pub const ENEMY_ATTACK: Rgb = Rgb(0xFF, 0xC0, 0xC0);
    pub const PLAYER_DIE: Rgb = Rgb(0xFF, 0x30, 0x30);
    pub const ENEMY_DIE: Rgb = Rgb(0xFF, 0xA0, 0x30);
    pub const CORPSE: Rgb = Rgb(0xBF, 0x00, 0x00);
    pub const IMPOSSIBLE: Rgb = Rgb(0x80, 0x80, 0x80);
    pub const HEALTH_RECOVERED: Rgb = Rgb(0x00, 0xFF, 0x00);
    pub const STATUS_EFFECT: Rgb = Rgb(0x3F, 0xFF, 0x3F);
    pub const WELCOME_TEXT: Rgb = Rgb(0x20, 0xA0, 0xFF);
    pub const DESCEND: Rgb = Rgb(0x9F, 0x3F, 0xFF);
}
