//! Deterministic core of a turn-based dungeon crawler.
//!
//! Front ends drive a [`Session`] with [`Action`]s and render its [`Frame`].

pub mod action;
pub mod ai;
pub mod combat;
pub mod components;
pub mod config;
pub mod content;
pub mod entity;
pub mod error;
pub mod map;
pub mod mapgen;
pub mod message_log;
pub mod save;
pub mod session;
pub mod types;
pub mod visibility;
pub mod world;

pub use action::{Action, Resolved};
pub use ai::Behavior;
pub use config::{CountRange, GeneratorConfig, SessionConfig};
pub use content::{Prototypes, keys};
pub use entity::{Actor, Body, Container, Entity, Item};
pub use error::{ActionError, ConfigError, Impossible, SaveError, SessionError};
pub use map::{GameMap, TileKind};
pub use mapgen::MapGenerator;
pub use message_log::{Message, MessageLog};
pub use session::{Frame, Session, TurnOutcome};
pub use types::*;
pub use visibility::{Shadowcast, VisibilityService};
pub use world::{RenderEntity, World};
