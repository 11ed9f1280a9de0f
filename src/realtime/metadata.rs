//! # Presence Metadata
//!
//! The JSON a client attaches to its subscription and publications, and the
//! lenient decoder that turns other clients' metadata back into [`Player`]
//! projections.
//!
//! Metadata comes from clients we do not control. Decoding never fails: each
//! field is read on its own and a missing or wrongly typed value falls back
//! to its default. Numeric zero is a real value and is kept; an empty string
//! is treated as missing.

use crate::config::{SPAWN_X, SPAWN_Y};
use crate::{CharacterAppearance, CharacterClass, Faction, Player, PresenceMember, StatsUpdate};
use serde_json::{json, Map, Value};

const UNKNOWN_NAME: &str = "Unknown";
const DEFAULT_LEVEL: u32 = 1;
const DEFAULT_RESOURCE: u32 = 100;

/// Everything a client advertises about its character on a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceMetadata {
    /// `None` when the sender did not say; callers substitute the transport
    /// user id
    pub player_id: Option<String>,
    pub character_name: String,
    pub character_class: CharacterClass,
    pub level: u32,
    pub faction: Faction,
    pub health: u32,
    pub mana: u32,
    pub max_health: u32,
    pub max_mana: u32,
    pub experience: u64,
    pub position_x: f64,
    pub position_y: f64,
    pub appearance: CharacterAppearance,
}

impl Default for PresenceMetadata {
    fn default() -> Self {
        Self {
            player_id: None,
            character_name: UNKNOWN_NAME.to_string(),
            character_class: CharacterClass::Dps,
            level: DEFAULT_LEVEL,
            faction: Faction::Neutral,
            health: DEFAULT_RESOURCE,
            mana: DEFAULT_RESOURCE,
            max_health: DEFAULT_RESOURCE,
            max_mana: DEFAULT_RESOURCE,
            experience: 0,
            position_x: SPAWN_X,
            position_y: SPAWN_Y,
            appearance: CharacterAppearance::default(),
        }
    }
}

impl PresenceMetadata {
    /// Snapshot of a local player.
    pub fn from_player(player: &Player) -> Self {
        Self {
            player_id: Some(player.id.clone()),
            character_name: player.character_name.clone(),
            character_class: player.character_class,
            level: player.level,
            faction: player.faction,
            health: player.health,
            mana: player.mana,
            max_health: player.max_health,
            max_mana: player.max_mana,
            experience: player.experience,
            position_x: player.position_x,
            position_y: player.position_y,
            appearance: player.appearance.clone(),
        }
    }

    /// Decodes metadata sent by another client.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use shadowrealm::{CharacterClass, PresenceMetadata};
    ///
    /// let meta = PresenceMetadata::decode(Some(&json!({
    ///     "characterName": "Brakka",
    ///     "characterClass": "tank",
    ///     "level": "nine",
    ///     "health": 0,
    /// })));
    /// assert_eq!(meta.character_name, "Brakka");
    /// assert_eq!(meta.character_class, CharacterClass::Tank);
    /// assert_eq!(meta.level, 1);
    /// assert_eq!(meta.health, 0);
    /// ```
    pub fn decode(value: Option<&Value>) -> Self {
        let defaults = Self::default();
        let Some(fields) = value.and_then(Value::as_object) else {
            return defaults;
        };

        Self {
            player_id: text(fields, "playerId"),
            character_name: text(fields, "characterName").unwrap_or(defaults.character_name),
            character_class: text(fields, "characterClass")
                .and_then(|class| CharacterClass::parse(&class))
                .unwrap_or(defaults.character_class),
            level: count(fields, "level").unwrap_or(defaults.level),
            faction: text(fields, "faction")
                .and_then(|faction| Faction::parse(&faction))
                .unwrap_or(defaults.faction),
            health: count(fields, "health").unwrap_or(defaults.health),
            mana: count(fields, "mana").unwrap_or(defaults.mana),
            max_health: count(fields, "maxHealth").unwrap_or(defaults.max_health),
            max_mana: count(fields, "maxMana").unwrap_or(defaults.max_mana),
            experience: fields
                .get("experience")
                .and_then(whole_number)
                .unwrap_or(defaults.experience),
            position_x: coordinate(fields, "positionX").unwrap_or(defaults.position_x),
            position_y: coordinate(fields, "positionY").unwrap_or(defaults.position_y),
            appearance: fields
                .get("appearance")
                .and_then(|raw| serde_json::from_value(raw.clone()).ok())
                .unwrap_or(defaults.appearance),
        }
    }

    /// Builds the projection of a remote player. Resources are clamped after
    /// decoding, so `health <= max_health` holds even for hostile input.
    pub fn into_player(self, user_id: &str, joined_at: u64, last_seen: u64) -> Player {
        let mut player = Player {
            id: self.player_id.unwrap_or_else(|| user_id.to_string()),
            user_id: user_id.to_string(),
            character_name: self.character_name,
            character_class: self.character_class,
            level: self.level,
            experience: self.experience,
            health: self.health,
            max_health: self.max_health,
            mana: self.mana,
            max_mana: self.max_mana,
            faction: self.faction,
            guild_id: None,
            position_x: self.position_x,
            position_y: self.position_y,
            is_online: true,
            last_seen,
            created_at: joined_at,
            appearance: self.appearance,
        };
        player.clamp_resources();
        player
    }

    /// Full metadata, as attached to a subscription and to movement updates.
    pub fn to_value(&self) -> Value {
        json!({
            "playerId": self.player_id,
            "characterName": self.character_name,
            "characterClass": self.character_class.as_str(),
            "level": self.level,
            "faction": self.faction.as_str(),
            "health": self.health,
            "mana": self.mana,
            "maxHealth": self.max_health,
            "maxMana": self.max_mana,
            "experience": self.experience,
            "positionX": self.position_x,
            "positionY": self.position_y,
            "appearance": serde_json::to_value(&self.appearance).unwrap_or(Value::Null),
            "isOnline": true,
        })
    }
}

/// Projects one presence member into a [`Player`].
pub fn player_from_member(member: &PresenceMember) -> Player {
    PresenceMetadata::decode(member.metadata.as_ref()).into_player(
        &member.user_id,
        member.joined_at,
        member.last_seen,
    )
}

/// Sender identity attached to chat messages.
pub fn chat_sender_metadata(player: &Player) -> Value {
    json!({
        "playerId": player.id,
        "characterName": player.character_name,
        "characterClass": player.character_class.as_str(),
        "level": player.level,
        "faction": player.faction.as_str(),
    })
}

/// Sender identity attached to skill and combat signals.
pub fn action_sender_metadata(player: &Player) -> Value {
    json!({
        "playerId": player.id,
        "characterName": player.character_name,
        "characterClass": player.character_class.as_str(),
    })
}

/// Identity plus the fields a stats update changed.
pub fn stats_sender_metadata(player: &Player, stats: &StatsUpdate) -> Value {
    let mut meta = Map::new();
    meta.insert("playerId".to_string(), json!(player.id));
    meta.insert("characterName".to_string(), json!(player.character_name));
    if let Ok(Value::Object(changed)) = serde_json::to_value(stats) {
        meta.extend(changed);
    }
    Value::Object(meta)
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Non-negative integer, accepting integral floats such as `42.0`.
fn whole_number(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

fn count(fields: &Map<String, Value>, key: &str) -> Option<u32> {
    fields
        .get(key)
        .and_then(whole_number)
        .and_then(|n| u32::try_from(n).ok())
}

fn coordinate(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields
        .get(key)
        .and_then(Value::as_f64)
        .filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CharacterDraft, Race};
    use proptest::prelude::*;

    fn member(metadata: Option<Value>) -> PresenceMember {
        PresenceMember {
            user_id: "user-7".to_string(),
            metadata,
            joined_at: 1_000,
            last_seen: 2_000,
        }
    }

    #[test]
    fn test_missing_metadata_uses_defaults() {
        let player = player_from_member(&member(None));
        assert_eq!(player.id, "user-7");
        assert_eq!(player.character_name, "Unknown");
        assert_eq!(player.character_class, CharacterClass::Dps);
        assert_eq!(player.level, 1);
        assert_eq!(player.health, 100);
        assert_eq!(player.max_mana, 100);
        assert_eq!(player.faction, Faction::Neutral);
        assert_eq!((player.position_x, player.position_y), (400.0, 300.0));
        assert!(player.is_online);
        assert_eq!(player.created_at, 1_000);
        assert_eq!(player.last_seen, 2_000);
    }

    #[test]
    fn test_non_object_metadata_uses_defaults() {
        let meta = PresenceMetadata::decode(Some(&json!([1, 2, 3])));
        assert_eq!(meta, PresenceMetadata::default());
    }

    #[test]
    fn test_wrong_types_fall_back_per_field() {
        let meta = PresenceMetadata::decode(Some(&json!({
            "playerId": 17,
            "characterName": "Vex",
            "characterClass": "wizard",
            "level": -3,
            "faction": "horde",
            "mana": 12.5,
            "positionX": "left",
            "positionY": 10,
        })));
        assert_eq!(meta.player_id, None);
        assert_eq!(meta.character_name, "Vex");
        assert_eq!(meta.character_class, CharacterClass::Dps);
        assert_eq!(meta.level, 1);
        assert_eq!(meta.faction, Faction::Horde);
        assert_eq!(meta.mana, 100);
        assert_eq!(meta.position_x, 400.0);
        assert_eq!(meta.position_y, 10.0);
    }

    #[test]
    fn test_zero_is_kept() {
        let meta = PresenceMetadata::decode(Some(&json!({
            "health": 0,
            "mana": 0.0,
            "experience": 0,
            "positionX": 0,
        })));
        assert_eq!(meta.health, 0);
        assert_eq!(meta.mana, 0);
        assert_eq!(meta.position_x, 0.0);
    }

    #[test]
    fn test_resources_clamped_after_decode() {
        let player = player_from_member(&member(Some(json!({
            "health": 500,
            "maxHealth": 80,
            "mana": 90,
            "maxMana": 0,
        }))));
        assert_eq!(player.health, 80);
        assert_eq!(player.mana, 0);
    }

    #[test]
    fn test_partial_appearance() {
        let meta = PresenceMetadata::decode(Some(&json!({
            "appearance": { "race": "orc", "hairstyle": 4 }
        })));
        assert_eq!(meta.appearance.race, Race::Orc);
        assert_eq!(meta.appearance.hairstyle, 4);
        assert_eq!(meta.appearance.body_type, 3);

        let broken = PresenceMetadata::decode(Some(&json!({ "appearance": "tall" })));
        assert_eq!(broken.appearance, CharacterAppearance::default());
    }

    #[test]
    fn test_local_player_survives_encoding() {
        let player =
            Player::create("user-1", CharacterDraft::new("Ayla", CharacterClass::Healer), 5).unwrap();
        let wire = PresenceMetadata::from_player(&player).to_value();
        assert_eq!(wire["isOnline"], true);
        assert_eq!(wire["characterClass"], "healer");

        let decoded = PresenceMetadata::decode(Some(&wire)).into_player("user-1", 5, 5);
        assert_eq!(decoded.id, player.id);
        assert_eq!(decoded.max_health, 80);
        assert_eq!(decoded.mana, 120);
        assert_eq!(decoded.appearance, player.appearance);
    }

    #[test]
    fn test_sender_metadata_shapes() {
        let player =
            Player::create("user-1", CharacterDraft::new("Ayla", CharacterClass::Tank), 5).unwrap();
        let chat = chat_sender_metadata(&player);
        assert_eq!(chat["level"], 1);
        assert_eq!(chat["faction"], "neutral");

        let action = action_sender_metadata(&player);
        assert!(action.get("level").is_none());

        let stats = stats_sender_metadata(&player, &StatsUpdate::mana(7));
        assert_eq!(stats["mana"], 7);
        assert!(stats.get("health").is_none());
        assert_eq!(stats["characterName"], "Ayla");
    }

    fn field_name() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("playerId".to_string()),
            Just("characterName".to_string()),
            Just("characterClass".to_string()),
            Just("level".to_string()),
            Just("health".to_string()),
            Just("maxHealth".to_string()),
            Just("mana".to_string()),
            Just("maxMana".to_string()),
            Just("experience".to_string()),
            Just("positionX".to_string()),
            Just("appearance".to_string()),
            "[a-z]{1,6}",
        ]
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>().prop_map(|f| json!(f)),
            ".{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 8, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                proptest::collection::vec((field_name(), inner), 0..10)
                    .prop_map(|pairs| Value::Object(pairs.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_decode_never_breaks_invariants(raw in arb_json()) {
            let player = player_from_member(&member(Some(raw)));
            prop_assert!(player.health <= player.max_health);
            prop_assert!(player.mana <= player.max_mana);
            prop_assert!(player.position_x.is_finite() && player.position_y.is_finite());
            prop_assert!(!player.id.is_empty());
            prop_assert!(!player.character_name.is_empty());
        }
    }
}
