//! Entity records stored in the world arena.
//! An entity is either an actor or an item; capabilities are composed from `components`.

use crate::ai::Behavior;
use crate::components::{Consumable, Equipment, Equippable, Fighter, Inventory, Level};
use crate::types::{EntityId, Pos, RenderTier, Rgb};

/// Back-reference to whatever currently holds an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    World,
    Inventory(EntityId),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub fighter: Fighter,
    pub ai: Option<Behavior>,
    pub inventory: Inventory,
    pub equipment: Equipment,
    pub level: Level,
}

impl Actor {
    pub fn is_alive(&self) -> bool {
        self.ai.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Item {
    pub consumable: Option<Consumable>,
    pub equippable: Option<Equippable>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    Actor(Actor),
    Item(Item),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub glyph: char,
    pub color: Rgb,
    pub pos: Pos,
    pub tier: RenderTier,
    pub blocks_movement: bool,
    pub container: Container,
    pub body: Body,
}

impl Entity {
    pub fn actor(&self) -> Option<&Actor> {
        match &self.body {
            Body::Actor(actor) => Some(actor),
            Body::Item(_) => None,
        }
    }

    pub fn actor_mut(&mut self) -> Option<&mut Actor> {
        match &mut self.body {
            Body::Actor(actor) => Some(actor),
            Body::Item(_) => None,
        }
    }

    pub fn item(&self) -> Option<&Item> {
        match &self.body {
            Body::Item(item) => Some(item),
            Body::Actor(_) => None,
        }
    }

    pub fn is_alive_actor(&self) -> bool {
        self.actor().is_some_and(Actor::is_alive)
    }

    pub fn is_on_map(&self) -> bool {
        self.container == Container::World
    }
}
