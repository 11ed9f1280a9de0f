//! # Shadowrealm
//!
//! Client core for a browser-style multiplayer dungeon RPG.
//!
//! ## Architecture Overview
//!
//! Everything that is not presentation lives here. The crate is organised
//! around a handful of components:
//!
//! - **Domain Model**: players, skills, items, enemies, bosses, dungeons and chat
//! - **Generation System**: the 50-dungeon world and its balance scaling laws
//! - **Multiplayer Session**: presence projection and chat history over an
//!   abstract realtime pub/sub channel
//! - **Combat System**: the single-player dungeon floor state machine
//! - **Notifications**: ephemeral, auto-expiring UI events
//!
//! External collaborators (authentication, realtime transport, key-value
//! persistence) are consumed through traits so the host decides what backs
//! them. [`realtime::LocalHub`] and [`storage::MemoryStore`] are in-process
//! implementations for offline play and tests.

pub mod game;
pub mod generation;
pub mod notifications;
pub mod realtime;
pub mod storage;

// Core module re-exports
pub use game::*;
pub use generation::*;
pub use notifications::*;
pub use realtime::*;
pub use storage::*;

/// Core error type for the Shadowrealm client core.
#[derive(thiserror::Error, Debug)]
pub enum RealmError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Realtime transport failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Character storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Action cannot be performed
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Authentication provider error
    #[error("Auth error: {0}")]
    Auth(String),
}

/// Result type used throughout the Shadowrealm codebase.
pub type RealmResult<T> = Result<T, RealmError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Game configuration constants.
pub mod config {
    use std::time::Duration;

    /// Realtime channel every client joins unless told otherwise
    pub const DEFAULT_CHANNEL: &str = "mmo-world";

    /// Number of chat messages retained client-side
    pub const CHAT_HISTORY_LIMIT: usize = 50;

    /// Key prefix for saved characters, suffixed with `_<userId>`
    pub const CHARACTER_STORAGE_PREFIX: &str = "mmo_character";

    /// Width of the overworld in world units
    pub const WORLD_WIDTH: f64 = 800.0;

    /// Height of the overworld in world units
    pub const WORLD_HEIGHT: f64 = 600.0;

    /// Where new and unknown players stand
    pub const SPAWN_X: f64 = 400.0;
    pub const SPAWN_Y: f64 = 300.0;

    /// Delay before moving on after a boss falls
    pub const BOSS_ADVANCE_DELAY: Duration = Duration::from_secs(2);

    /// Delay before a defeated player is ejected from the dungeon
    pub const DEFEAT_EXIT_DELAY: Duration = Duration::from_secs(2);

    /// Delay before leaving a completed dungeon
    pub const COMPLETION_EXIT_DELAY: Duration = Duration::from_secs(3);

    /// Mana cost of every in-dungeon combat skill
    pub const DUNGEON_SKILL_MANA_COST: u32 = 20;

    /// Maximum number of skills on a hotbar
    pub const HOTBAR_SIZE: usize = 10;
}
