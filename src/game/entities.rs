//! # Entities Module
//!
//! Hostile combat entities found on dungeon floors: regular enemies and the
//! boss guarding the last floor together with its loot chest.

use super::{Item, MapPosition};
use serde::{Deserialize, Serialize};

/// Common behaviour of anything the player can fight.
pub trait Foe {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn level(&self) -> u32;
    fn health(&self) -> u32;
    fn max_health(&self) -> u32;

    /// Attack-power scalar; retaliation rolls in `[10, 10 + attack_power)`.
    fn attack_power(&self) -> u32;

    /// Applies damage, flooring health at zero. Returns the damage applied.
    fn apply_damage(&mut self, amount: u32) -> u32;

    fn is_alive(&self) -> bool {
        self.health() > 0
    }
}

/// A regular floor enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub health: u32,
    pub max_health: u32,
    pub damage: u32,
    pub position: MapPosition,
    pub is_alive: bool,
    pub loot_table: Vec<Item>,
}

impl Foe for Enemy {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn health(&self) -> u32 {
        self.health
    }

    fn max_health(&self) -> u32 {
        self.max_health
    }

    fn attack_power(&self) -> u32 {
        self.damage
    }

    fn apply_damage(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.health);
        self.health -= applied;
        self.is_alive = self.health > 0;
        applied
    }
}

/// A named boss attack. Content data; the combat loop does not use it yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BossAbility {
    pub id: String,
    pub name: String,
    pub damage: u32,
    pub cooldown_ms: u64,
    pub description: String,
}

/// Reward chest dropped by a boss. Opens exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonChest {
    pub id: String,
    pub dungeon_level: u32,
    pub items: Vec<Item>,
    pub is_opened: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<u64>,
}

impl DungeonChest {
    pub fn new(id: String, dungeon_level: u32, items: Vec<Item>) -> Self {
        Self {
            id,
            dungeon_level,
            items,
            is_opened: false,
            opened_by: None,
            opened_at: None,
        }
    }

    /// Opens the chest for `player_id` and hands over its items.
    ///
    /// Returns `None` if the chest was already opened; the first opener is
    /// kept.
    pub fn open(&mut self, player_id: &str, now_ms: u64) -> Option<Vec<Item>> {
        if self.is_opened {
            return None;
        }
        self.is_opened = true;
        self.opened_by = Some(player_id.to_string());
        self.opened_at = Some(now_ms);
        Some(std::mem::take(&mut self.items))
    }
}

/// The final-floor boss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boss {
    pub id: String,
    pub name: String,
    pub level: u32,
    pub health: u32,
    pub max_health: u32,
    pub damage: u32,
    pub position: MapPosition,
    pub is_alive: bool,
    pub chest: DungeonChest,
    pub abilities: Vec<BossAbility>,
}

impl Boss {
    pub fn has_ability(&self, name: &str) -> bool {
        self.abilities.iter().any(|ability| ability.name == name)
    }
}

impl Foe for Boss {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn health(&self) -> u32 {
        self.health
    }

    fn max_health(&self) -> u32 {
        self.max_health
    }

    fn attack_power(&self) -> u32 {
        self.damage
    }

    fn apply_damage(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.health);
        self.health -= applied;
        self.is_alive = self.health > 0;
        applied
    }
}
