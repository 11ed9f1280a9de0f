//! # Player Module
//!
//! Player characters, their class templates and cosmetic appearance.
//!
//! Every resource mutation goes through a clamping method so that
//! `0 <= health <= max_health` and `0 <= mana <= max_mana` hold at all times.
//! Fields are public for reading and serialization; writers should use the
//! mutators.

use super::{new_id, Position, WorldBounds};
use crate::{RealmError, RealmResult};
use serde::{Deserialize, Serialize};

/// Playable classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterClass {
    Healer,
    Tank,
    Dps,
}

impl CharacterClass {
    pub fn all() -> [CharacterClass; 3] {
        [Self::Healer, Self::Tank, Self::Dps]
    }

    /// Wire name used in presence metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healer => "healer",
            Self::Tank => "tank",
            Self::Dps => "dps",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "healer" => Some(Self::Healer),
            "tank" => Some(Self::Tank),
            "dps" => Some(Self::Dps),
            _ => None,
        }
    }

    /// Starting resources for a freshly created character of this class.
    pub fn template(&self) -> ClassTemplate {
        match self {
            Self::Healer => ClassTemplate {
                class: *self,
                display_name: "Healer",
                description: "Masters of restoration magic, keeping allies alive in battle",
                max_health: 80,
                max_mana: 120,
            },
            Self::Tank => ClassTemplate {
                class: *self,
                display_name: "Tank",
                description: "Heavily armored warriors who protect their allies",
                max_health: 150,
                max_mana: 60,
            },
            Self::Dps => ClassTemplate {
                class: *self,
                display_name: "DPS",
                description: "Swift damage dealers who eliminate enemies quickly",
                max_health: 100,
                max_mana: 80,
            },
        }
    }
}

/// Fixed per-class character creation data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassTemplate {
    pub class: CharacterClass,
    pub display_name: &'static str,
    pub description: &'static str,
    pub max_health: u32,
    pub max_mana: u32,
}

/// Allegiance, cosmetic apart from chat channel routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Faction {
    Alliance,
    Horde,
    #[default]
    Neutral,
}

impl Faction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alliance => "alliance",
            Self::Horde => "horde",
            Self::Neutral => "neutral",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "alliance" => Some(Self::Alliance),
            "horde" => Some(Self::Horde),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Race {
    #[default]
    Human,
    Elf,
    Dwarf,
    Orc,
    Undead,
    Troll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
}

/// Cosmetic character appearance. Has no gameplay effect.
///
/// Missing fields deserialize to their defaults, so partially filled
/// appearance objects from other clients are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterAppearance {
    pub race: Race,
    pub gender: Gender,
    /// 1-10
    pub hairstyle: u8,
    pub eye_color: String,
    pub hair_color: String,
    pub skin_color: String,
    /// 1-8
    pub mouth_type: u8,
    /// 0-8, 0 means no beard
    pub beard_style: u8,
    pub beard_color: String,
    /// 1-5
    pub body_type: u8,
    /// 1-6
    pub face_type: u8,
}

impl Default for CharacterAppearance {
    fn default() -> Self {
        Self {
            race: Race::Human,
            gender: Gender::Male,
            hairstyle: 1,
            eye_color: "#8B4513".to_string(),
            hair_color: "#2C1810".to_string(),
            skin_color: "#FDBCB4".to_string(),
            mouth_type: 1,
            beard_style: 0,
            beard_color: "#2C1810".to_string(),
            body_type: 3,
            face_type: 1,
        }
    }
}

/// Choices made on the character creation screen.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterDraft {
    pub name: String,
    pub class: CharacterClass,
    pub faction: Faction,
    pub appearance: CharacterAppearance,
}

impl CharacterDraft {
    pub fn new(name: impl Into<String>, class: CharacterClass) -> Self {
        Self {
            name: name.into(),
            class,
            faction: Faction::Neutral,
            appearance: CharacterAppearance::default(),
        }
    }

    pub fn with_faction(mut self, faction: Faction) -> Self {
        self.faction = faction;
        self
    }

    pub fn with_appearance(mut self, appearance: CharacterAppearance) -> Self {
        self.appearance = appearance;
        self
    }
}

/// Partial stat change broadcast to other players.
///
/// Only the fields that are `Some` are applied and serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mana: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
}

impl StatsUpdate {
    pub fn health(health: u32) -> Self {
        Self { health: Some(health), ..Self::default() }
    }

    pub fn mana(mana: u32) -> Self {
        Self { mana: Some(mana), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.health.is_none() && self.mana.is_none() && self.level.is_none()
    }
}

/// Current and maximum resources of a combatant.
///
/// The dungeon combat machine works on a copy of these and hands them back
/// to the owning player when the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    health: u32,
    max_health: u32,
    mana: u32,
    max_mana: u32,
}

impl Vitals {
    /// Builds clamped vitals; current values above their maximum are cut down.
    pub fn new(health: u32, max_health: u32, mana: u32, max_mana: u32) -> Self {
        Self {
            health: health.min(max_health),
            max_health,
            mana: mana.min(max_mana),
            max_mana,
        }
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn mana(&self) -> u32 {
        self.mana
    }

    pub fn max_mana(&self) -> u32 {
        self.max_mana
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Fraction of health left, in `[0, 1]`.
    pub fn health_ratio(&self) -> f64 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f64 / self.max_health as f64
        }
    }

    /// Returns the damage actually applied.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let applied = amount.min(self.health);
        self.health -= applied;
        applied
    }

    /// Returns the health actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health - before
    }

    /// Spends `amount` mana if available; leaves mana untouched otherwise.
    pub fn spend_mana(&mut self, amount: u32) -> bool {
        if self.mana < amount {
            return false;
        }
        self.mana -= amount;
        true
    }

    pub fn restore_mana(&mut self, amount: u32) {
        self.mana = self.mana.saturating_add(amount).min(self.max_mana);
    }
}

/// A participant in the world.
///
/// The local client is authoritative only for its own record; records of
/// other players are projections rebuilt from presence snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub user_id: String,
    pub character_name: String,
    pub character_class: CharacterClass,
    pub level: u32,
    pub experience: u64,
    pub health: u32,
    pub max_health: u32,
    pub mana: u32,
    pub max_mana: u32,
    pub faction: Faction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    pub position_x: f64,
    pub position_y: f64,
    pub is_online: bool,
    /// Epoch milliseconds
    pub last_seen: u64,
    /// Epoch milliseconds
    pub created_at: u64,
    #[serde(default)]
    pub appearance: CharacterAppearance,
}

impl Player {
    /// Creates a level 1 character from a creation draft.
    ///
    /// # Examples
    ///
    /// ```
    /// use shadowrealm::{CharacterClass, CharacterDraft, Player};
    ///
    /// let player = Player::create("user-1", CharacterDraft::new("  Aria ", CharacterClass::Tank), 0).unwrap();
    /// assert_eq!(player.character_name, "Aria");
    /// assert_eq!(player.max_health, 150);
    /// assert_eq!(player.level, 1);
    /// ```
    pub fn create(user_id: &str, draft: CharacterDraft, now_ms: u64) -> RealmResult<Self> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(RealmError::InvalidAction(
                "Character name cannot be empty".to_string(),
            ));
        }

        let template = draft.class.template();
        let spawn = Position::spawn();
        Ok(Self {
            id: new_id("player"),
            user_id: user_id.to_string(),
            character_name: name.to_string(),
            character_class: draft.class,
            level: 1,
            experience: 0,
            health: template.max_health,
            max_health: template.max_health,
            mana: template.max_mana,
            max_mana: template.max_mana,
            faction: draft.faction,
            guild_id: None,
            position_x: spawn.x,
            position_y: spawn.y,
            is_online: true,
            last_seen: now_ms,
            created_at: now_ms,
            appearance: draft.appearance,
        })
    }

    pub fn position(&self) -> Position {
        Position::new(self.position_x, self.position_y)
    }

    /// Moves the player, clamped into `bounds`. Returns the stored position.
    pub fn set_position(&mut self, x: f64, y: f64, bounds: &WorldBounds) -> Position {
        let pos = bounds.clamp(x, y);
        self.position_x = pos.x;
        self.position_y = pos.y;
        pos
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    pub fn set_health(&mut self, health: u32) {
        self.health = health.min(self.max_health);
    }

    pub fn set_mana(&mut self, mana: u32) {
        self.mana = mana.min(self.max_mana);
    }

    pub fn set_max_health(&mut self, max_health: u32) {
        self.max_health = max_health;
        self.health = self.health.min(max_health);
    }

    pub fn set_max_mana(&mut self, max_mana: u32) {
        self.max_mana = max_mana;
        self.mana = self.mana.min(max_mana);
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: u32) {
        self.set_health(self.health.saturating_add(amount));
    }

    /// Spends mana if enough is available.
    pub fn spend_mana(&mut self, amount: u32) -> bool {
        if self.mana < amount {
            return false;
        }
        self.mana -= amount;
        true
    }

    pub fn restore_mana(&mut self, amount: u32) {
        self.set_mana(self.mana.saturating_add(amount));
    }

    /// Restores any invariant a deserialized or decoded record may violate.
    pub fn clamp_resources(&mut self) {
        self.health = self.health.min(self.max_health);
        self.mana = self.mana.min(self.max_mana);
    }

    /// Applies the fields present in a partial stats update.
    pub fn apply_stats(&mut self, stats: &StatsUpdate) {
        if let Some(level) = stats.level {
            self.level = level.max(1);
        }
        if let Some(health) = stats.health {
            self.set_health(health);
        }
        if let Some(mana) = stats.mana {
            self.set_mana(mana);
        }
    }

    pub fn vitals(&self) -> Vitals {
        Vitals::new(self.health, self.max_health, self.mana, self.max_mana)
    }

    pub fn apply_vitals(&mut self, vitals: &Vitals) {
        self.max_health = vitals.max_health();
        self.max_mana = vitals.max_mana();
        self.set_health(vitals.health());
        self.set_mana(vitals.mana());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_player() -> Player {
        Player::create("user-1", CharacterDraft::new("Hero", CharacterClass::Dps), 1_000).unwrap()
    }

    #[test]
    fn test_class_templates() {
        assert_eq!(CharacterClass::Healer.template().max_health, 80);
        assert_eq!(CharacterClass::Healer.template().max_mana, 120);
        assert_eq!(CharacterClass::Tank.template().max_health, 150);
        assert_eq!(CharacterClass::Tank.template().max_mana, 60);
        assert_eq!(CharacterClass::Dps.template().max_health, 100);
        assert_eq!(CharacterClass::Dps.template().max_mana, 80);
    }

    #[test]
    fn test_player_creation() {
        let player = test_player();
        assert_eq!(player.user_id, "user-1");
        assert_eq!(player.level, 1);
        assert_eq!(player.experience, 0);
        assert_eq!(player.health, player.max_health);
        assert_eq!(player.position(), Position::new(400.0, 300.0));
        assert!(player.is_online);
        assert_eq!(player.created_at, 1_000);
    }

    #[test]
    fn test_blank_name_rejected() {
        let result = Player::create("u", CharacterDraft::new("   ", CharacterClass::Tank), 0);
        assert!(matches!(result, Err(RealmError::InvalidAction(_))));
    }

    #[test]
    fn test_resource_clamping() {
        let mut player = test_player();
        player.take_damage(1_000);
        assert_eq!(player.health, 0);
        assert!(!player.is_alive());

        player.heal(10_000);
        assert_eq!(player.health, player.max_health);

        assert!(!player.spend_mana(10_000));
        assert_eq!(player.mana, player.max_mana);
        assert!(player.spend_mana(30));
        assert_eq!(player.mana, 50);

        player.set_max_mana(20);
        assert_eq!(player.mana, 20);
    }

    #[test]
    fn test_apply_stats_only_touches_present_fields() {
        let mut player = test_player();
        player.apply_stats(&StatsUpdate::mana(5));
        assert_eq!(player.mana, 5);
        assert_eq!(player.health, 100);

        player.apply_stats(&StatsUpdate { health: Some(500), mana: None, level: Some(3) });
        assert_eq!(player.health, 100);
        assert_eq!(player.level, 3);
    }

    #[test]
    fn test_stats_update_serializes_changed_fields_only() {
        let json = serde_json::to_value(StatsUpdate::health(42)).unwrap();
        assert_eq!(json, serde_json::json!({ "health": 42 }));
    }

    #[test]
    fn test_player_json_uses_camel_case() {
        let player = test_player();
        let json = serde_json::to_value(&player).unwrap();
        assert_eq!(json["characterClass"], "dps");
        assert_eq!(json["positionX"], 400.0);
        let back: Player = serde_json::from_value(json).unwrap();
        assert_eq!(back, player);
    }

    #[test]
    fn test_vitals_round_trip_through_player() {
        let mut player = test_player();
        let mut vitals = player.vitals();
        assert_eq!(vitals.take_damage(30), 30);
        assert!(vitals.spend_mana(20));
        player.apply_vitals(&vitals);
        assert_eq!(player.health, 70);
        assert_eq!(player.mana, 60);
    }

    proptest! {
        #[test]
        fn prop_vitals_stay_in_range(ops in proptest::collection::vec((0u8..4, 0u32..500), 0..64)) {
            let mut vitals = Vitals::new(100, 100, 100, 100);
            for (op, amount) in ops {
                match op {
                    0 => { vitals.take_damage(amount); }
                    1 => { vitals.heal(amount); }
                    2 => { vitals.spend_mana(amount); }
                    _ => vitals.restore_mana(amount),
                }
                prop_assert!(vitals.health() <= vitals.max_health());
                prop_assert!(vitals.mana() <= vitals.max_mana());
            }
        }
    }
}
