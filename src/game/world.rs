//! # World Module
//!
//! Dungeons, their floors, and the static overworld map.

use super::{Boss, Enemy, Foe, MapPosition};
use serde::{Deserialize, Serialize};

/// One combat stage of a dungeon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DungeonFloor {
    pub id: String,
    pub dungeon_id: String,
    /// 1-based
    pub floor_number: u32,
    pub enemies: Vec<Enemy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boss: Option<Boss>,
    pub is_cleared: bool,
    pub required_level: u32,
}

impl DungeonFloor {
    /// A floor is clear when every enemy and the boss (if any) is at zero
    /// health.
    pub fn is_clear(&self) -> bool {
        self.enemies.iter().all(|enemy| enemy.health == 0)
            && self.boss.as_ref().map_or(true, |boss| boss.health == 0)
    }

    pub fn is_boss_floor(&self) -> bool {
        self.boss.is_some()
    }

    pub fn live_enemy_count(&self) -> usize {
        self.enemies.iter().filter(|enemy| Foe::is_alive(*enemy)).count()
    }
}

/// An instanced dungeon: ordered floors ending in a boss floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dungeon {
    pub id: String,
    pub name: String,
    /// Difficulty tier
    pub level: u32,
    pub position: MapPosition,
    pub floors: Vec<DungeonFloor>,
    pub is_active: bool,
    pub players_inside: Vec<String>,
    pub created_at: u64,
}

impl Dungeon {
    pub fn floor(&self, index: usize) -> Option<&DungeonFloor> {
        self.floors.get(index)
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.floors.last().and_then(|floor| floor.boss.as_ref())
    }

    /// Checks that exactly the last floor carries the boss.
    pub fn has_valid_layout(&self) -> bool {
        let Some((last, rest)) = self.floors.split_last() else {
            return false;
        };
        last.boss.is_some() && rest.iter().all(|floor| floor.boss.is_none())
    }

    /// Records a player entering. Returns false if they were already inside.
    pub fn enter(&mut self, player_id: &str) -> bool {
        if self.players_inside.iter().any(|id| id == player_id) {
            return false;
        }
        self.players_inside.push(player_id.to_string());
        true
    }

    /// Records a player leaving. Returns false if they were not inside.
    pub fn leave(&mut self, player_id: &str) -> bool {
        let before = self.players_inside.len();
        self.players_inside.retain(|id| id != player_id);
        self.players_inside.len() != before
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeZoneKind {
    Town,
    Outpost,
    Sanctuary,
}

/// An area where combat is not allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeZone {
    pub id: String,
    pub name: String,
    pub position: MapPosition,
    pub radius: f64,
    #[serde(rename = "type")]
    pub kind: SafeZoneKind,
}

impl SafeZone {
    /// Horizontal (x/z) containment test.
    pub fn contains(&self, pos: MapPosition) -> bool {
        let dx = pos.x - self.position.x;
        let dz = pos.z - self.position.z;
        (dx * dx + dz * dz).sqrt() <= self.radius
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiomeKind {
    Forest,
    Mountain,
    Desert,
    Swamp,
    Plains,
    Tundra,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BiomeKind,
    pub area: Area,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LandmarkKind {
    Mountain,
    Lake,
    Forest,
    Ruins,
    Tower,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LandmarkKind,
    pub position: MapPosition,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainData {
    /// Indexed `[x][z]`
    pub height_map: Vec<Vec<f64>>,
    pub biomes: Vec<Biome>,
    pub landmarks: Vec<Landmark>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// The complete generated world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMap {
    pub id: String,
    pub name: String,
    pub size: MapSize,
    pub dungeons: Vec<Dungeon>,
    pub safe_zones: Vec<SafeZone>,
    pub terrain: TerrainData,
}

impl GameMap {
    pub fn dungeon(&self, id: &str) -> Option<&Dungeon> {
        self.dungeons.iter().find(|dungeon| dungeon.id == id)
    }

    /// Dungeons a character of `level` may enter, lowest first.
    pub fn dungeons_for_level(&self, level: u32) -> Vec<&Dungeon> {
        self.dungeons
            .iter()
            .filter(|dungeon| dungeon.level <= level)
            .collect()
    }

    pub fn safe_zone_at(&self, pos: MapPosition) -> Option<&SafeZone> {
        self.safe_zones.iter().find(|zone| zone.contains(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DungeonChest;

    fn enemy(id: &str, health: u32) -> Enemy {
        Enemy {
            id: id.to_string(),
            name: "Cave Spider".to_string(),
            level: 1,
            health,
            max_health: health.max(1),
            damage: 10,
            position: MapPosition::origin(),
            is_alive: health > 0,
            loot_table: Vec::new(),
        }
    }

    fn boss(health: u32) -> Boss {
        Boss {
            id: "boss_1".to_string(),
            name: "Rat King".to_string(),
            level: 6,
            health,
            max_health: 6000,
            damage: 300,
            position: MapPosition::origin(),
            is_alive: health > 0,
            chest: DungeonChest::new("chest_1".to_string(), 1, Vec::new()),
            abilities: Vec::new(),
        }
    }

    fn floor(enemies: Vec<Enemy>, boss: Option<Boss>) -> DungeonFloor {
        DungeonFloor {
            id: "floor".to_string(),
            dungeon_id: "dungeon_01".to_string(),
            floor_number: 1,
            enemies,
            boss,
            is_cleared: false,
            required_level: 1,
        }
    }

    #[test]
    fn test_floor_clear_rules() {
        assert!(floor(vec![], None).is_clear());
        assert!(!floor(vec![enemy("a", 0), enemy("b", 5)], None).is_clear());
        assert!(floor(vec![enemy("a", 0), enemy("b", 0)], None).is_clear());
        assert!(!floor(vec![enemy("a", 0)], Some(boss(1))).is_clear());
        assert!(floor(vec![], Some(boss(0))).is_clear());
    }

    #[test]
    fn test_dungeon_membership() {
        let mut dungeon = Dungeon {
            id: "dungeon_01".to_string(),
            name: "Crypt of Dawn".to_string(),
            level: 1,
            position: MapPosition::origin(),
            floors: vec![floor(vec![], None), floor(vec![], Some(boss(10)))],
            is_active: true,
            players_inside: Vec::new(),
            created_at: 0,
        };
        assert!(dungeon.has_valid_layout());
        assert!(dungeon.enter("p1"));
        assert!(!dungeon.enter("p1"));
        assert_eq!(dungeon.players_inside, vec!["p1".to_string()]);
        assert!(dungeon.leave("p1"));
        assert!(!dungeon.leave("p1"));
    }

    #[test]
    fn test_safe_zone_containment() {
        let zone = SafeZone {
            id: "safe_zone_1".to_string(),
            name: "Central City".to_string(),
            position: MapPosition::origin(),
            radius: 1000.0,
            kind: SafeZoneKind::Town,
        };
        assert!(zone.contains(MapPosition::new(600.0, 50.0, 600.0)));
        assert!(!zone.contains(MapPosition::new(800.0, 0.0, 800.0)));
    }
}
