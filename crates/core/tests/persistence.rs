use tempfile::tempdir;
use tombs_core::{Action, Container, Prototypes, SaveError, Session, SessionConfig, TurnOutcome};

fn played(seed: u64, turns: usize) -> Session {
    let mut session =
        Session::new(seed, SessionConfig::default(), Prototypes::standard()).expect("session");
    for step in 0..turns {
        let (dx, dy) = [(1, 0), (0, 1), (-1, 0), (0, -1)][step % 4];
        session.submit(Action::Bump { dx, dy }).expect("turn");
    }
    session
}

#[test]
fn test_saved_session_continues_identically() {
    let mut original = played(404, 6);
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("run.sav");
    original.save_to_path(&path).expect("save");

    let mut restored = Session::load_from_path(&path, Prototypes::standard()).expect("load");
    assert_eq!(restored.snapshot_hash(), original.snapshot_hash());
    assert_eq!(restored.floor_index(), original.floor_index());
    assert_eq!(restored.log(), original.log());

    for step in 0..8 {
        let action = if step % 2 == 0 { Action::Wait } else { Action::Bump { dx: 1, dy: 1 } };
        let a = original.submit(action).expect("original turn");
        let b = restored.submit(action).expect("restored turn");
        assert_eq!(a, b);
        assert_eq!(original.snapshot_hash(), restored.snapshot_hash(), "diverged at step {step}");
    }
}

#[test]
fn test_restored_containers_point_at_live_entities() {
    let session = played(7, 2);
    let restored =
        Session::from_bytes(&session.to_bytes().expect("encode"), Prototypes::standard())
            .expect("decode");

    let world = restored.world();
    for entity in world.entities() {
        if let Container::Inventory(holder) = entity.container {
            let holder = world.actor(holder).expect("holder is an actor");
            assert!(holder.inventory.contains(entity.id));
        }
    }
    let player = world.actor(restored.player()).expect("player");
    for item in player.equipment.equipped() {
        assert!(player.inventory.contains(item));
    }
}

#[test]
fn test_descended_sessions_round_trip() {
    let mut session = played(11, 0);
    let player = session.player();
    let stairs = session.world().map.downstairs;
    session.world_mut().get_mut(player).expect("player").pos = stairs;
    assert_eq!(
        session.submit(Action::TakeStairs).expect("descend"),
        TurnOutcome::Descended { floor_index: 2 }
    );

    let restored =
        Session::from_bytes(&session.to_bytes().expect("encode"), Prototypes::standard())
            .expect("decode");
    assert_eq!(restored.floor_index(), 2);
    assert_eq!(restored.snapshot_hash(), session.snapshot_hash());
}

#[test]
fn test_missing_save_file_is_an_io_error() {
    let dir = tempdir().expect("tempdir");
    let result = Session::load_from_path(&dir.path().join("absent.sav"), Prototypes::standard());
    assert!(matches!(result, Err(SaveError::Io(_))));
}
