use anyhow::{Context, Result, bail};
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tombs_core::{Action, DIRECTIONS, Pos, Prototypes, Session, SessionConfig, TurnOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    turns: u32,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

fn random_action(rng: &mut ChaCha8Rng, session: &Session) -> Action {
    let held = session
        .world()
        .actor(session.player())
        .map_or(0, |player| player.inventory.items.len());
    let item = |rng: &mut ChaCha8Rng| {
        if held == 0 { None } else { session.inventory_slot(rng.next_u64() as usize % held) }
    };

    match rng.next_u64() % 10 {
        0..=4 => {
            let (dx, dy) = choose(rng, &DIRECTIONS);
            Action::Bump { dx, dy }
        }
        5 => Action::PickUp,
        6 => match item(rng) {
            Some(item) => {
                let origin =
                    session.world().get(session.player()).map_or(Pos::new(0, 0), |e| e.pos);
                let target = origin.offset(choose(rng, &[-2, 0, 2]), choose(rng, &[-2, 0, 2]));
                Action::UseItem { item, target: Some(target) }
            }
            None => Action::Wait,
        },
        7 => item(rng).map_or(Action::Wait, |item| Action::Equip { item }),
        8 => item(rng).map_or(Action::Wait, |item| Action::DropItem { item }),
        _ => choose(rng, &[Action::Wait, Action::TakeStairs]),
    }
}

fn check_invariants(session: &Session) -> Result<()> {
    let world = session.world();
    world.validate().context("world invariant failed")?;
    for entity in world.placed() {
        if let Some(actor) = entity.actor() {
            let hp = actor.fighter.hp();
            if hp < 0 || hp > actor.fighter.max_hp {
                bail!("{} has {hp}/{} hp", entity.name, actor.fighter.max_hp);
            }
            if !world.is_walkable(entity.pos) {
                bail!("{} is inside a wall at {:?}", entity.name, entity.pos);
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    println!("Starting fuzz harness on seed {} for max {} turns...", args.seed, args.turns);
    let mut session = Session::new(args.seed, SessionConfig::default(), Prototypes::standard())
        .context("Failed to start session")?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let mut rejected = 0u32;
    for step in 0..args.turns {
        let action = random_action(&mut rng, &session);
        let outcome =
            session.submit(action).with_context(|| format!("fatal error at step {step}"))?;
        check_invariants(&session).with_context(|| format!("after step {step}: {action:?}"))?;

        match outcome {
            TurnOutcome::PlayerDied => {
                let (floor, turn) = (session.floor_index(), session.turn());
                println!("Player died on floor {floor} after {turn} turns");
                break;
            }
            TurnOutcome::Rejected(_) => rejected += 1,
            TurnOutcome::Descended { floor_index } => println!("Reached floor {floor_index}"),
            TurnOutcome::Completed | TurnOutcome::Exit => {}
        }
    }

    println!(
        "Fuzzing completed successfully: {} turns, {rejected} rejected actions, hash 0x{:016x}",
        session.turn(),
        session.snapshot_hash()
    );
    Ok(())
}
