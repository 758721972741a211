use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use serde::Deserialize;
use tombs_core::{Action, Pos, Prototypes, Session, SessionConfig, TurnOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start (or resume) a session and apply a scripted list of steps
    Run {
        #[arg(short, long, default_value_t = 1)]
        seed: u64,
        /// TOML file overriding the default session settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// JSON list of steps to submit in order
        #[arg(long)]
        script: Option<PathBuf>,
        /// Where to write the save; defaults to the per-user data directory
        #[arg(long)]
        save: Option<PathBuf>,
        /// Resume from an existing save instead of generating a new session
        #[arg(long, conflicts_with_all = ["seed", "config"])]
        load: Option<PathBuf>,
    },
    /// Print a summary of a save file
    Inspect {
        save: PathBuf,
        #[arg(short, long, default_value_t = 10)]
        messages: usize,
    },
}

/// One scripted input. Item steps name inventory slots, not entity handles.
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum ScriptStep {
    Move { dx: i32, dy: i32 },
    Wait,
    Pickup,
    Use { slot: usize, target: Option<Pos> },
    Drop { slot: usize },
    Equip { slot: usize },
    Stairs,
    Escape,
}

fn default_save_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "Tombs").map(|proj_dirs| {
        let mut path = proj_dirs.data_dir().to_path_buf();
        path.push("session.sav");
        path
    })
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    let Some(path) = path else {
        return Ok(SessionConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    SessionConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid config file: {}", path.display()))
}

fn load_script(path: Option<&Path>) -> Result<Vec<ScriptStep>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| "Failed to deserialize script JSON")
}

/// Maps a step onto an action; `None` when it names an empty inventory slot.
fn to_action(session: &Session, step: &ScriptStep) -> Option<Action> {
    let action = match *step {
        ScriptStep::Move { dx, dy } => Action::Bump { dx, dy },
        ScriptStep::Wait => Action::Wait,
        ScriptStep::Pickup => Action::PickUp,
        ScriptStep::Use { slot, target } => {
            Action::UseItem { item: session.inventory_slot(slot)?, target }
        }
        ScriptStep::Drop { slot } => Action::DropItem { item: session.inventory_slot(slot)? },
        ScriptStep::Equip { slot } => Action::Equip { item: session.inventory_slot(slot)? },
        ScriptStep::Stairs => Action::TakeStairs,
        ScriptStep::Escape => Action::Escape,
    };
    Some(action)
}

fn save(session: &Session, path: &Path) -> Result<()> {
    session
        .save_to_path(path)
        .with_context(|| format!("Failed to write save file: {}", path.display()))?;
    println!("Saved to {}", path.display());
    Ok(())
}

fn print_summary(session: &Session, messages: usize) {
    println!("Seed: {}", session.seed());
    println!("Floor: {}", session.floor_index());
    println!("Turn: {}", session.turn());
    if let Some(player) = session.world().actor(session.player()) {
        println!(
            "Player: HP {}/{}, level {}, XP {}/{}",
            player.fighter.hp(),
            player.fighter.max_hp,
            player.level.current_level,
            player.level.current_xp,
            player.level.experience_to_next_level()
        );
        for (slot, &item) in player.inventory.items.iter().enumerate() {
            let name = session.world().get(item).map_or("?", |entity| entity.name.as_str());
            let marker = if player.equipment.is_equipped(item) { " (equipped)" } else { "" };
            println!("  [{slot}] {name}{marker}");
        }
    }
    println!("Snapshot Hash: 0x{:016x}", session.snapshot_hash());
    for message in session.log().recent(messages) {
        println!("> {}", message.full_text());
    }
}

fn run(
    seed: u64,
    config: Option<PathBuf>,
    script: Option<PathBuf>,
    save_path: Option<PathBuf>,
    load: Option<PathBuf>,
) -> Result<()> {
    let mut session = match &load {
        Some(path) => Session::load_from_path(path, Prototypes::standard())
            .with_context(|| format!("Failed to load save file: {}", path.display()))?,
        None => Session::new(seed, load_config(config.as_deref())?, Prototypes::standard())
            .with_context(|| "Failed to start session")?,
    };
    let steps = load_script(script.as_deref())?;
    let save_path = save_path.or(load).or_else(default_save_path);

    for (index, step) in steps.iter().enumerate() {
        let Some(action) = to_action(&session, step) else {
            tracing::warn!(index, ?step, "step names an empty inventory slot; skipped");
            continue;
        };
        match session.submit(action) {
            Ok(TurnOutcome::Exit) => {
                println!("Escape requested at step {index}.");
                break;
            }
            Ok(TurnOutcome::PlayerDied) => {
                println!("The player died at step {index}.");
                break;
            }
            Ok(outcome) => tracing::debug!(index, ?outcome, "step applied"),
            Err(error) => {
                if let Some(path) = &save_path
                    && let Err(save_error) = session.save_to_path(path)
                {
                    tracing::warn!(%save_error, "best-effort save failed");
                }
                return Err(error).with_context(|| format!("Fatal error at step {index}"));
            }
        }
    }

    print_summary(&session, 5);
    match save_path {
        Some(path) => save(&session, &path),
        None => bail!("No save path given and no per-user data directory is available"),
    }
}

fn inspect(path: &Path, messages: usize) -> Result<()> {
    let session = Session::load_from_path(path, Prototypes::standard())
        .with_context(|| format!("Failed to load save file: {}", path.display()))?;
    print_summary(&session, messages);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Run { seed, config, script, save, load } => run(seed, config, script, save, load),
        Command::Inspect { save, messages } => inspect(&save, messages),
    }
}
