//! Versioned save files for a whole session.
//!
//! The byte layout is two JSON lines:
//! - Line 1: header with `format_version`, `build_id` and the body's `sha256_hex`.
//! - Line 2: the body. Entities are stored as records with dense `u32` handles,
//!   so the format does not depend on arena keys.
//!
//! Loading checks the version and checksum before decoding, then re-links every
//! handle and validates the rebuilt world.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use slotmap::SecondaryMap;

use crate::ai::Behavior;
use crate::components::{Consumable, Equipment, Equippable, Fighter, Inventory, Level};
use crate::config::SessionConfig;
use crate::content::Prototypes;
use crate::entity::{Actor, Body, Container, Entity, Item};
use crate::error::SaveError;
use crate::map::{GameMap, TileKind};
use crate::message_log::MessageLog;
use crate::session::Session;
use crate::types::{EntityId, Pos, RenderTier, Rgb};
use crate::world::World;

pub const SAVE_FORMAT_VERSION: u32 = 1;
pub const BUILD_ID: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// File format structs
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct SaveHeader {
    format_version: u32,
    build_id: String,
    sha256_hex: String,
}

#[derive(Serialize, Deserialize, Debug)]
struct SaveBody {
    seed: u64,
    turn: u64,
    config: SessionConfig,
    player: u32,
    floor: FloorRecord,
    /// Placed entities first, in placement order; held items after.
    entities: Vec<EntityRecord>,
    log: MessageLog,
}

#[derive(Serialize, Deserialize, Debug)]
struct FloorRecord {
    floor_index: u32,
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
    explored: Vec<bool>,
    downstairs: Pos,
    entry: Pos,
    room_count: usize,
}

#[derive(Serialize, Deserialize, Debug)]
struct EntityRecord {
    name: String,
    glyph: char,
    color: Rgb,
    pos: Pos,
    tier: RenderTier,
    blocks_movement: bool,
    /// Handle of the carrying actor; `None` means on the map.
    holder: Option<u32>,
    body: BodyRecord,
}

#[derive(Serialize, Deserialize, Debug)]
enum BodyRecord {
    Actor(ActorRecord),
    Item { consumable: Option<Consumable>, equippable: Option<Equippable> },
}

#[derive(Serialize, Deserialize, Debug)]
struct ActorRecord {
    fighter: Fighter,
    ai: Option<Behavior>,
    capacity: usize,
    items: Vec<u32>,
    weapon: Option<u32>,
    armor: Option<u32>,
    level: Level,
}

fn body_sha256(body_json: &[u8]) -> String {
    let digest = Sha256::digest(body_json);
    format!("{digest:064x}")
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn handle_of(handles: &SecondaryMap<EntityId, u32>, id: EntityId) -> Result<u32, SaveError> {
    handles
        .get(id)
        .copied()
        .ok_or_else(|| SaveError::InvalidState(format!("{id:?} is referenced but not stored")))
}

fn entity_record(
    entity: &Entity,
    handles: &SecondaryMap<EntityId, u32>,
) -> Result<EntityRecord, SaveError> {
    let holder = match entity.container {
        Container::World => None,
        Container::Inventory(holder) => Some(handle_of(handles, holder)?),
    };
    let body = match &entity.body {
        Body::Actor(actor) => BodyRecord::Actor(ActorRecord {
            fighter: actor.fighter.clone(),
            ai: actor.ai.clone(),
            capacity: actor.inventory.capacity,
            items: actor
                .inventory
                .items
                .iter()
                .map(|&item| handle_of(handles, item))
                .collect::<Result<_, _>>()?,
            weapon: actor.equipment.weapon.map(|id| handle_of(handles, id)).transpose()?,
            armor: actor.equipment.armor.map(|id| handle_of(handles, id)).transpose()?,
            level: actor.level.clone(),
        }),
        Body::Item(item) => {
            BodyRecord::Item { consumable: item.consumable, equippable: item.equippable }
        }
    };
    Ok(EntityRecord {
        name: entity.name.clone(),
        glyph: entity.glyph,
        color: entity.color,
        pos: entity.pos,
        tier: entity.tier,
        blocks_movement: entity.blocks_movement,
        holder,
        body,
    })
}

fn snapshot(session: &Session) -> Result<SaveBody, SaveError> {
    let world = &session.world;
    let ordered: Vec<&Entity> =
        world.placed().chain(world.entities().filter(|entity| !entity.is_on_map())).collect();

    let mut handles = SecondaryMap::new();
    for (handle, entity) in ordered.iter().enumerate() {
        handles.insert(entity.id, handle as u32);
    }
    let entities = ordered
        .iter()
        .map(|entity| entity_record(entity, &handles))
        .collect::<Result<Vec<_>, _>>()?;

    let map = &world.map;
    Ok(SaveBody {
        seed: session.seed,
        turn: session.turn,
        config: session.config.clone(),
        player: handle_of(&handles, session.player)?,
        floor: FloorRecord {
            floor_index: world.floor_index,
            width: map.width,
            height: map.height,
            tiles: map.tiles.clone(),
            explored: map.explored.clone(),
            downstairs: map.downstairs,
            entry: world.entry,
            room_count: world.room_count,
        },
        entities,
        log: session.log.clone(),
    })
}

/// Serializes `session` into the two-line save layout.
pub fn encode(session: &Session) -> Result<Vec<u8>, SaveError> {
    let body_json = serde_json::to_string(&snapshot(session)?)?;
    let header = SaveHeader {
        format_version: SAVE_FORMAT_VERSION,
        build_id: BUILD_ID.to_string(),
        sha256_hex: body_sha256(body_json.as_bytes()),
    };
    let header_json = serde_json::to_string(&header)?;
    Ok(format!("{header_json}\n{body_json}\n").into_bytes())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn split_lines(bytes: &[u8]) -> Result<(&[u8], &[u8]), SaveError> {
    let Some(newline) = bytes.iter().position(|&byte| byte == b'\n') else {
        return Err(SaveError::MissingHeader);
    };
    let (header, rest) = (&bytes[..newline], &bytes[newline + 1..]);
    if header.is_empty() {
        return Err(SaveError::MissingHeader);
    }
    let body = rest.strip_suffix(b"\n").unwrap_or(rest);
    Ok((header, body))
}

fn rebuild_map(floor: &FloorRecord) -> Result<GameMap, SaveError> {
    let cells = floor.width * floor.height;
    if floor.tiles.len() != cells || floor.explored.len() != cells {
        return Err(SaveError::InvalidState(format!(
            "{}x{} floor stores {} tiles and {} explored flags",
            floor.width,
            floor.height,
            floor.tiles.len(),
            floor.explored.len()
        )));
    }
    let mut map = GameMap::new(floor.width, floor.height);
    map.tiles.clone_from(&floor.tiles);
    map.explored.clone_from(&floor.explored);
    map.downstairs = floor.downstairs;
    Ok(map)
}

/// Body with every handle field left empty; `link` fills them in.
fn unlinked_entity(record: &EntityRecord) -> Entity {
    let body = match &record.body {
        BodyRecord::Actor(actor) => Body::Actor(Actor {
            fighter: actor.fighter.clone(),
            ai: actor.ai.clone(),
            inventory: Inventory::with_capacity(actor.capacity),
            equipment: Equipment::default(),
            level: actor.level.clone(),
        }),
        BodyRecord::Item { consumable, equippable } => {
            Body::Item(Item { consumable: *consumable, equippable: *equippable })
        }
    };
    let container = match record.holder {
        None => Container::World,
        Some(_) => Container::Inventory(EntityId::default()),
    };
    Entity {
        id: EntityId::default(),
        name: record.name.clone(),
        glyph: record.glyph,
        color: record.color,
        pos: record.pos,
        tier: record.tier,
        blocks_movement: record.blocks_movement,
        container,
        body,
    }
}

fn resolve(ids: &[EntityId], handle: u32) -> Result<EntityId, SaveError> {
    ids.get(handle as usize).copied().ok_or(SaveError::DanglingHandle(handle))
}

fn link(
    world: &mut World,
    record: &EntityRecord,
    id: EntityId,
    ids: &[EntityId],
) -> Result<(), SaveError> {
    let lookup = |handle: u32| resolve(ids, handle);
    let holder = record.holder.map(lookup).transpose()?;
    let actor_links = match &record.body {
        BodyRecord::Actor(actor) => Some((
            actor.items.iter().map(|&handle| lookup(handle)).collect::<Result<Vec<_>, _>>()?,
            actor.weapon.map(lookup).transpose()?,
            actor.armor.map(lookup).transpose()?,
        )),
        BodyRecord::Item { .. } => None,
    };

    let Some(entity) = world.get_mut(id) else {
        return Err(SaveError::InvalidState(format!("restored entity {id:?} vanished")));
    };
    if let Some(holder) = holder {
        entity.container = Container::Inventory(holder);
    }
    if let (Some(actor), Some((items, weapon, armor))) = (entity.actor_mut(), actor_links) {
        actor.inventory.items = items;
        actor.equipment = Equipment { weapon, armor };
    }
    Ok(())
}

/// Restores a session from bytes produced by [`encode`].
pub fn decode(bytes: &[u8], prototypes: Prototypes) -> Result<Session, SaveError> {
    let (header_line, body_line) = split_lines(bytes)?;
    let header: SaveHeader = serde_json::from_slice(header_line)?;
    if header.format_version != SAVE_FORMAT_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found: header.format_version,
            expected: SAVE_FORMAT_VERSION,
        });
    }
    let actual = body_sha256(body_line);
    if actual != header.sha256_hex {
        return Err(SaveError::ChecksumMismatch { expected: header.sha256_hex, actual });
    }
    if header.build_id != BUILD_ID {
        tracing::warn!(
            saved = %header.build_id,
            current = BUILD_ID,
            "save written by another build"
        );
    }

    let body: SaveBody = serde_json::from_slice(body_line)?;
    body.config.validate().map_err(|error| SaveError::InvalidState(error.to_string()))?;

    let mut world = World::new(rebuild_map(&body.floor)?, body.floor.floor_index);
    world.entry = body.floor.entry;
    world.room_count = body.floor.room_count;
    let ids: Vec<EntityId> =
        body.entities.iter().map(|record| world.restore(unlinked_entity(record))).collect();
    for (record, &id) in body.entities.iter().zip(&ids) {
        link(&mut world, record, id, &ids)?;
    }

    let player = resolve(&ids, body.player)?;
    if world.actor(player).is_none() {
        return Err(SaveError::InvalidState("player handle does not name an actor".to_string()));
    }
    world.validate().map_err(|error| SaveError::InvalidState(error.to_string()))?;

    let mut session =
        Session::from_parts(world, player, body.log, body.turn, body.seed, body.config, prototypes);
    session.update_visibility().map_err(|error| SaveError::InvalidState(error.to_string()))?;
    Ok(session)
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes next to `path` and renames over it, so a crash never leaves half a save.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = temp_path(path);
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

impl Session {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveError> {
        encode(self)
    }

    pub fn from_bytes(bytes: &[u8], prototypes: Prototypes) -> Result<Self, SaveError> {
        decode(bytes, prototypes)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), SaveError> {
        write_atomic(path, &encode(self)?)?;
        tracing::info!(path = %path.display(), turn = self.turn, "session saved");
        Ok(())
    }

    pub fn load_from_path(path: &Path, prototypes: Prototypes) -> Result<Self, SaveError> {
        let bytes = fs::read(path)?;
        let session = decode(&bytes, prototypes)?;
        tracing::info!(path = %path.display(), turn = session.turn, "session loaded");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use tempfile::tempdir;

    fn played_session() -> Session {
        let mut session =
            Session::new(77, SessionConfig::default(), Prototypes::standard()).expect("session");
        for _ in 0..3 {
            session.submit(Action::Wait).expect("wait");
        }
        session
    }

    fn reseal(body_json: &str, format_version: u32) -> Vec<u8> {
        let header = SaveHeader {
            format_version,
            build_id: BUILD_ID.to_string(),
            sha256_hex: body_sha256(body_json.as_bytes()),
        };
        let header_json = serde_json::to_string(&header).expect("header");
        format!("{header_json}\n{body_json}\n").into_bytes()
    }

    fn body_of(bytes: &[u8]) -> String {
        let (_, body) = split_lines(bytes).expect("two lines");
        String::from_utf8(body.to_vec()).expect("utf-8")
    }

    #[test]
    fn round_trip_preserves_state_and_links() {
        let session = played_session();
        let restored =
            Session::from_bytes(&session.to_bytes().expect("encode"), Prototypes::standard())
                .expect("decode");

        assert_eq!(restored.snapshot_hash(), session.snapshot_hash());
        assert_eq!(restored.turn(), 3);
        assert_eq!(restored.log(), session.log());

        let player = restored.world().actor(restored.player()).expect("player");
        let weapon = player.equipment.weapon.expect("weapon link");
        assert!(player.inventory.contains(weapon));
        assert_eq!(
            restored.world().get(weapon).map(|e| e.container),
            Some(Container::Inventory(restored.player()))
        );
        restored.world().validate().expect("valid world");
    }

    #[test]
    fn tampered_body_fails_the_checksum() {
        let mut bytes = played_session().to_bytes().expect("encode");
        let last = bytes.len() - 3;
        bytes[last] = if bytes[last] == b'1' { b'2' } else { b'1' };
        assert!(matches!(
            Session::from_bytes(&bytes, Prototypes::standard()),
            Err(SaveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn other_format_versions_are_refused() {
        let bytes = played_session().to_bytes().expect("encode");
        let resealed = reseal(&body_of(&bytes), SAVE_FORMAT_VERSION + 1);
        assert!(matches!(
            Session::from_bytes(&resealed, Prototypes::standard()),
            Err(SaveError::UnsupportedVersion { found: 2, expected: 1 })
        ));
    }

    #[test]
    fn headerless_and_malformed_input_are_distinct_errors() {
        assert!(matches!(
            Session::from_bytes(b"{}", Prototypes::standard()),
            Err(SaveError::MissingHeader)
        ));
        assert!(matches!(
            Session::from_bytes(&reseal("{\"seed\":", SAVE_FORMAT_VERSION), Prototypes::standard()),
            Err(SaveError::Json(_))
        ));
    }

    #[test]
    fn dangling_player_handle_is_reported() {
        let bytes = played_session().to_bytes().expect("encode");
        let mut body: serde_json::Value = serde_json::from_str(&body_of(&bytes)).expect("json");
        body["player"] = serde_json::json!(99_999);
        let resealed = reseal(&body.to_string(), SAVE_FORMAT_VERSION);
        assert!(matches!(
            Session::from_bytes(&resealed, Prototypes::standard()),
            Err(SaveError::DanglingHandle(99_999))
        ));
    }

    #[test]
    fn file_save_is_atomic_and_loads_back() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("saves").join("run.sav");
        let session = played_session();

        session.save_to_path(&path).expect("save");
        assert!(path.exists());
        assert!(!temp_path(&path).exists());

        let loaded = Session::load_from_path(&path, Prototypes::standard()).expect("load");
        assert_eq!(loaded.snapshot_hash(), session.snapshot_hash());
    }
}
