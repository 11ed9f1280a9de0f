//! # Game Module
//!
//! Domain model and the single-player systems that operate on it.
//!
//! This module contains the fundamental building blocks of the client core:
//! - Players, skills, items, enemies, bosses and dungeons
//! - Chat messages and the bounded chat history
//! - The session context that ties a signed-in user to a saved character
//! - The dungeon combat state machine and its deferred transitions

pub mod autoplay;
pub mod chat;
pub mod combat;
pub mod entities;
pub mod gear;
pub mod player;
pub mod rolls;
pub mod schedule;
pub mod skills;
pub mod state;
pub mod world;

pub use autoplay::*;
pub use chat::*;
pub use combat::*;
pub use entities::*;
pub use gear::*;
pub use player::*;
pub use rolls::*;
pub use schedule::*;
pub use skills::*;
pub use state::*;
pub use world::*;

use crate::config;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Represents a 2D coordinate on the overworld.
///
/// # Examples
///
/// ```
/// use shadowrealm::Position;
///
/// let pos = Position::new(10.0, 5.0);
/// assert_eq!(pos.x, 10.0);
/// assert_eq!(pos.y, 5.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The spot new characters appear at.
    pub fn spawn() -> Self {
        Self::new(config::SPAWN_X, config::SPAWN_Y)
    }

    /// Calculates the Euclidean distance to another position.
    pub fn distance(self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::spawn()
    }
}

/// A point in the 3D world map (dungeon entrances, landmarks, safe zones).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MapPosition {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn origin() -> Self {
        Self::default()
    }
}

/// Rectangular extents player positions are clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f64,
    pub height: f64,
}

impl WorldBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamps a coordinate pair into `[0, width] x [0, height]`.
    ///
    /// Non-finite input collapses to the nearest edge (NaN goes to 0).
    /// Negative or NaN extents behave as 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use shadowrealm::{Position, WorldBounds};
    ///
    /// let bounds = WorldBounds::new(800.0, 600.0);
    /// assert_eq!(bounds.clamp(-5.0, 900.0), Position::new(0.0, 600.0));
    /// ```
    pub fn clamp(&self, x: f64, y: f64) -> Position {
        // f64::max ignores NaN, so neither side can panic
        let fix = |v: f64, max: f64| v.max(0.0).min(max.max(0.0));
        Position::new(fix(x, self.width), fix(y, self.height))
    }

    /// Both extents finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.width, self.height].iter().all(|v| v.is_finite() && *v >= 0.0)
    }

    pub fn contains(&self, pos: Position) -> bool {
        (0.0..=self.width).contains(&pos.x) && (0.0..=self.height).contains(&pos.y)
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self::new(config::WORLD_WIDTH, config::WORLD_HEIGHT)
    }
}

/// Creates a new process-unique opaque id such as `enemy_3f2a...`.
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_distance() {
        let pos1 = Position::new(0.0, 0.0);
        let pos2 = Position::new(3.0, 4.0);
        assert_eq!(pos1.distance(pos2), 5.0);
    }

    #[test]
    fn test_default_position_is_spawn() {
        assert_eq!(Position::default(), Position::new(400.0, 300.0));
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = WorldBounds::default();
        assert_eq!(bounds.clamp(100.0, 200.0), Position::new(100.0, 200.0));
        assert_eq!(bounds.clamp(-1.0, -1.0), Position::new(0.0, 0.0));
        assert_eq!(bounds.clamp(801.0, 601.0), Position::new(800.0, 600.0));
        assert_eq!(bounds.clamp(f64::NAN, f64::INFINITY), Position::new(0.0, 600.0));
        assert!(bounds.contains(bounds.clamp(1e9, -1e9)));
    }

    #[test]
    fn test_clamp_with_degenerate_bounds() {
        let bounds = WorldBounds::new(-1.0, f64::NAN);
        assert!(!bounds.is_valid());
        assert_eq!(bounds.clamp(10.0, 10.0), Position::new(0.0, 0.0));
        assert!(WorldBounds::default().is_valid());
    }

    #[test]
    fn test_id_uniqueness() {
        let id1 = new_id("enemy");
        let id2 = new_id("enemy");
        assert_ne!(id1, id2);
        assert!(id1.starts_with("enemy_"));
    }
}
