//! # Items
//!
//! Loot items, their rarity tiers and sparse stat bundles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Weapon,
    Armor,
    Consumable,
    Material,
    Accessory,
}

impl ItemType {
    pub fn all() -> [ItemType; 5] {
        [
            Self::Weapon,
            Self::Armor,
            Self::Consumable,
            Self::Material,
            Self::Accessory,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weapon => "weapon",
            Self::Armor => "armor",
            Self::Consumable => "consumable",
            Self::Material => "material",
            Self::Accessory => "accessory",
        }
    }
}

/// Ordinal value tier. Declaration order is ascending value, so `Ord` can be
/// used to compare rarities directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// All rarities in ascending order.
    pub fn all() -> [Rarity; 5] {
        [
            Self::Common,
            Self::Uncommon,
            Self::Rare,
            Self::Epic,
            Self::Legendary,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    /// Stat multiplier applied to every rolled stat of this rarity.
    pub fn stat_multiplier(&self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 1.5,
            Self::Rare => 2.0,
            Self::Epic => 3.0,
            Self::Legendary => 5.0,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional stat bonuses. Absent stats are omitted from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_chance: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_damage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healing_power: Option<u32>,
}

impl ItemStats {
    /// Number of stats present.
    pub fn len(&self) -> usize {
        [
            self.damage,
            self.defense,
            self.health,
            self.mana,
            self.critical_chance,
            self.critical_damage,
            self.healing_power,
        ]
        .iter()
        .filter(|stat| stat.is_some())
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A generated piece of loot. Immutable once created; ownership moves to
/// whichever player receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub rarity: Rarity,
    pub level: u32,
    pub stats: ItemStats,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Epic < Rarity::Legendary);
        let mut sorted = Rarity::all();
        sorted.reverse();
        sorted.sort();
        assert_eq!(sorted, Rarity::all());
    }

    #[test]
    fn test_sparse_stats_serialization() {
        let stats = ItemStats {
            damage: Some(12),
            ..ItemStats::default()
        };
        assert_eq!(stats.len(), 1);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json, serde_json::json!({ "damage": 12 }));
    }

    #[test]
    fn test_item_type_field_name() {
        let item = Item {
            id: "item_1".to_string(),
            name: "Simple Sword".to_string(),
            item_type: ItemType::Weapon,
            rarity: Rarity::Common,
            level: 1,
            stats: ItemStats::default(),
            description: String::new(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "weapon");
        assert_eq!(json["rarity"], "common");
    }
}
