//! Failure types shared by the resolver, the session, and persistence.
//! `Impossible` is recoverable and shown to the user; the rest end the session.

use std::io;

use thiserror::Error;

/// A rejected action. Nothing was mutated and no turn was consumed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Impossible {
    #[error("Nothing to attack.")]
    NothingToAttack,
    #[error("There is nothing here to pick up.")]
    NothingToPickUp,
    #[error("Your inventory is full.")]
    InventoryFull,
    #[error("You do not carry that item.")]
    NotCarried,
    #[error("That item cannot be used.")]
    NotUsable,
    #[error("That item cannot be equipped.")]
    NotEquippable,
    #[error("Your health is already full.")]
    HealthFull,
    #[error("No enemy is close enough to strike.")]
    NoTargetInRange,
    #[error("You must select an area to target.")]
    TargetRequired,
    #[error("You cannot target an area that you cannot see.")]
    TargetNotVisible,
    #[error("You must select an enemy to target.")]
    TargetNotEnemy,
    #[error("You cannot confuse yourself!")]
    TargetSelf,
    #[error("There are no targets in the radius.")]
    NoTargetsInRadius,
    #[error("There are no stairs here.")]
    NoStairs,
    #[error("You are dead.")]
    Dead,
}

/// Outcome of a failed resolution: either a rejection or a fatal fault.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Impossible(#[from] Impossible),
    #[error(transparent)]
    Fatal(#[from] SessionError),
}

/// Unrecoverable session failure. Hosts should attempt a best-effort save and stop.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("internal invariant violated: {0}")]
    Invariant(String),
    #[error("the floor could not be generated: {0}")]
    Generation(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

impl SessionError {
    pub(crate) fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant(detail.into())
    }
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save payload is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("save header is missing or truncated")]
    MissingHeader,
    #[error("unsupported save format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("save checksum mismatch: header {expected}, payload {actual}")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("save refers to entity #{0}, which does not exist")]
    DanglingHandle(u32),
    #[error("restored session is inconsistent: {0}")]
    InvalidState(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
