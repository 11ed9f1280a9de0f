//! # Encounter Generation
//!
//! Floor enemies and dungeon bosses. Health, damage and enemy counts follow
//! fixed scaling laws keyed on dungeon level; names are drawn from pools
//! that get more menacing with level.

use super::utils;
use crate::{
    new_id, Boss, BossAbility, DungeonChest, Enemy, GenerationConfig, Generator, ItemGenerator,
    MapPosition, Rarity, RealmError, RealmResult,
};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

fn enemy_pool(dungeon_level: u32) -> &'static [&'static str] {
    match dungeon_level {
        0..=50 => &[
            "Goblin Scout", "Skeleton Warrior", "Wild Wolf", "Cave Spider", "Bandit Thief",
            "Orc Grunt", "Zombie Shambler", "Giant Rat", "Slime Blob", "Kobold Fighter",
        ],
        51..=100 => &[
            "Goblin Berserker", "Skeleton Archer", "Dire Wolf", "Venomous Spider", "Bandit Captain",
            "Orc Warrior", "Undead Knight", "Shadow Stalker", "Fire Imp", "Stone Golem",
        ],
        101..=200 => &[
            "Orc Chieftain", "Death Knight", "Frost Wraith", "Lightning Elemental", "Dark Assassin",
            "Troll Berserker", "Bone Dragon", "Void Walker", "Flame Demon", "Crystal Guardian",
        ],
        201..=300 => &[
            "Shadow Lord", "Lich Mage", "Storm Titan", "Infernal Beast", "Void Reaper",
            "Ancient Golem", "Nightmare Spawn", "Chaos Warrior", "Elemental Master", "Soul Devourer",
        ],
        301..=400 => &[
            "Demon Prince", "Arch Lich", "Titan Destroyer", "Void Emperor", "Chaos God",
            "Ancient Dragon", "Nightmare King", "Destroyer of Worlds", "Elemental Overlord",
            "Death Incarnate",
        ],
        _ => &[
            "Cosmic Horror", "Reality Bender", "Time Destroyer", "Dimension Ripper", "Universe Ender",
            "Eternal Nightmare", "Infinite Void", "Absolute Chaos", "Divine Destroyer",
            "Omnipotent Terror",
        ],
    }
}

fn boss_pool(dungeon_level: u32) -> &'static [&'static str] {
    match dungeon_level {
        0..=50 => &[
            "Goblin King", "Skeleton Lord", "Alpha Wolf", "Spider Matriarch", "Bandit Chief",
            "Orc Warlord", "Zombie Master", "Rat King", "Slime Overlord", "Kobold Shaman",
        ],
        51..=100 => &[
            "Goblin Emperor", "Bone Sovereign", "Dire Alpha", "Arachnid Queen", "Shadow Captain",
            "Orc Chieftain", "Death Lord", "Void Stalker", "Flame Overlord", "Stone Titan",
        ],
        101..=200 => &[
            "Orc Overlord", "Death Emperor", "Frost Sovereign", "Lightning Lord", "Shadow Master",
            "Troll King", "Dragon Lich", "Void Emperor", "Inferno King", "Crystal Overlord",
        ],
        201..=300 => &[
            "Shadow Emperor", "Arch Lich", "Storm Sovereign", "Infernal Overlord", "Void Sovereign",
            "Ancient Titan", "Nightmare Emperor", "Chaos Overlord", "Elemental God", "Soul Emperor",
        ],
        301..=400 => &[
            "Demon Emperor", "Lich God", "Titan Sovereign", "Void God", "Chaos Emperor",
            "Dragon God", "Nightmare Sovereign", "World Destroyer", "Elemental Emperor", "Death God",
        ],
        _ => &[
            "Cosmic Emperor", "Reality God", "Time Sovereign", "Dimension Emperor", "Universe God",
            "Eternal Sovereign", "Infinite Emperor", "Absolute God", "Divine Emperor",
            "Omnipotent Sovereign",
        ],
    }
}

/// Number of enemies on a floor before the random bonus of 0..=2.
///
/// # Examples
///
/// ```
/// use shadowrealm::base_enemy_count;
///
/// assert_eq!(base_enemy_count(1, 1), 3);
/// assert_eq!(base_enemy_count(1, 2), 4);
/// assert_eq!(base_enemy_count(491, 2), 12);
/// ```
pub fn base_enemy_count(dungeon_level: u32, floor_number: u32) -> u32 {
    let base = (3 + dungeon_level / 50).min(8);
    if floor_number == 1 {
        base
    } else {
        // floor(base * 1.5)
        base * 3 / 2
    }
}

/// Probability that an enemy carries loot.
pub fn loot_chance(dungeon_level: u32) -> f64 {
    (0.3 + dungeon_level as f64 / 1000.0).min(0.8)
}

/// Generates the enemy roster for one plain floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnemyGenerator {
    pub dungeon_level: u32,
    /// 1-based
    pub floor_number: u32,
}

impl EnemyGenerator {
    pub fn new(dungeon_level: u32, floor_number: u32) -> Self {
        Self {
            dungeon_level,
            floor_number,
        }
    }

    /// Level shared by every enemy on this floor.
    pub fn enemy_level(&self) -> u32 {
        (self.dungeon_level + self.floor_number).saturating_sub(1)
    }

    pub fn roll(&self, rng: &mut StdRng) -> Vec<Enemy> {
        let count = base_enemy_count(self.dungeon_level, self.floor_number) + rng.gen_range(0..3);
        let level = self.enemy_level();
        let pool = enemy_pool(self.dungeon_level);
        let loot = ItemGenerator::new(self.dungeon_level);

        (0..count)
            .map(|_| {
                let name = utils::pick(pool, rng).to_string();
                let health = level * 100 + utils::below(level * 20, rng);
                let damage = level * 20 + utils::below(level * 5, rng);
                let loot_count = if rng.gen::<f64>() < loot_chance(self.dungeon_level) {
                    rng.gen_range(1..=2)
                } else {
                    0
                };
                Enemy {
                    id: new_id("enemy"),
                    name,
                    level,
                    health,
                    max_health: health,
                    damage,
                    position: MapPosition::new(
                        (rng.gen::<f64>() - 0.5) * 30.0,
                        0.0,
                        (rng.gen::<f64>() - 0.5) * 30.0,
                    ),
                    is_alive: true,
                    loot_table: loot.roll_many(loot_count, rng),
                }
            })
            .collect()
    }
}

impl Generator<Vec<Enemy>> for EnemyGenerator {
    fn generate(&self, _config: &GenerationConfig, rng: &mut StdRng) -> RealmResult<Vec<Enemy>> {
        let enemies = self.roll(rng);
        debug!(
            "Generated {} enemies for level {} floor {}",
            enemies.len(),
            self.dungeon_level,
            self.floor_number
        );
        Ok(enemies)
    }

    fn validate(&self, enemies: &Vec<Enemy>, _config: &GenerationConfig) -> RealmResult<()> {
        let base = base_enemy_count(self.dungeon_level, self.floor_number) as usize;
        if enemies.len() < base || enemies.len() > base + 2 {
            return Err(RealmError::GenerationFailed(format!(
                "expected {}..={} enemies, got {}",
                base,
                base + 2,
                enemies.len()
            )));
        }
        let level = self.enemy_level();
        for enemy in enemies {
            let health_ok = enemy.health >= level * 100 && enemy.health < level * 120 + 1;
            let damage_ok = enemy.damage >= level * 20 && enemy.damage < level * 25 + 1;
            if enemy.level != level || !health_ok || !damage_ok || enemy.loot_table.len() > 2 {
                return Err(RealmError::GenerationFailed(format!(
                    "enemy {} breaks the level {} scaling law",
                    enemy.name, level
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "EnemyGenerator"
    }
}

/// Abilities a boss of `boss_level` knows, weakest first.
pub fn boss_abilities(boss_level: u32) -> Vec<BossAbility> {
    let mut abilities = Vec::new();
    let mut push = |slot: &str, name: &str, multiplier: u32, cooldown_ms: u64, description: &str| {
        abilities.push(BossAbility {
            id: new_id(&format!("ability_{}", slot)),
            name: name.to_string(),
            damage: boss_level * multiplier,
            cooldown_ms,
            description: description.to_string(),
        });
    };

    push("basic", "Devastating Strike", 60, 3_000, "A powerful melee attack that deals massive damage");
    push("area", "Area Devastation", 40, 6_000, "Damages all nearby enemies in a large radius");
    if boss_level >= 50 {
        push("special", "Elemental Fury", 80, 10_000, "Unleashes elemental magic dealing extreme damage");
    }
    if boss_level >= 100 {
        push("ultimate", "Reality Shatter", 100, 15_000, "Tears through reality itself, dealing catastrophic damage");
    }
    if boss_level >= 200 {
        push("godlike", "Divine Annihilation", 150, 20_000, "Channels divine power to obliterate all opposition");
    }
    abilities
}

/// Number of regular items in a boss chest.
pub fn chest_item_count(dungeon_level: u32) -> usize {
    (3 + dungeon_level / 25).min(10) as usize
}

/// Rarity of the bonus chest item high-level bosses always drop.
pub fn guaranteed_chest_rarity(dungeon_level: u32) -> Option<Rarity> {
    if dungeon_level >= 300 {
        Some(Rarity::Legendary)
    } else if dungeon_level >= 200 {
        Some(Rarity::Epic)
    } else if dungeon_level >= 100 {
        Some(Rarity::Rare)
    } else {
        None
    }
}

/// Generates the boss guarding a dungeon's last floor.
///
/// # Examples
///
/// ```
/// use shadowrealm::{BossGenerator, GenerationConfig, Generator};
/// use shadowrealm::generation::utils::create_rng;
///
/// let config = GenerationConfig::default();
/// let boss = BossGenerator::new(95, "dungeon_10")
///     .generate(&config, &mut create_rng(&config))
///     .unwrap();
/// assert_eq!(boss.level, 100);
/// assert!((100_000..120_000).contains(&boss.health));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BossGenerator {
    pub dungeon_level: u32,
    pub dungeon_id: String,
}

impl BossGenerator {
    pub fn new(dungeon_level: u32, dungeon_id: impl Into<String>) -> Self {
        Self {
            dungeon_level,
            dungeon_id: dungeon_id.into(),
        }
    }

    pub fn boss_level(&self) -> u32 {
        self.dungeon_level + 5
    }

    pub fn roll(&self, rng: &mut StdRng) -> Boss {
        let level = self.boss_level();
        let name = utils::pick(boss_pool(self.dungeon_level), rng).to_string();
        let health = level * 1000 + utils::below(level * 200, rng);
        let damage = level * 50 + utils::below(level * 10, rng);

        let loot = ItemGenerator::new(self.dungeon_level);
        let mut items = loot.roll_many(chest_item_count(self.dungeon_level), rng);
        if let Some(rarity) = guaranteed_chest_rarity(self.dungeon_level) {
            // Stats and name keep the sampled rarity; only the label is raised
            let mut item = loot.roll(rng);
            item.rarity = item.rarity.max(rarity);
            items.push(item);
        }

        Boss {
            id: format!("boss_{}", self.dungeon_id),
            name,
            level,
            health,
            max_health: health,
            damage,
            position: MapPosition::origin(),
            is_alive: true,
            chest: DungeonChest::new(format!("chest_{}", self.dungeon_id), self.dungeon_level, items),
            abilities: boss_abilities(level),
        }
    }
}

impl Generator<Boss> for BossGenerator {
    fn generate(&self, _config: &GenerationConfig, rng: &mut StdRng) -> RealmResult<Boss> {
        Ok(self.roll(rng))
    }

    fn validate(&self, boss: &Boss, _config: &GenerationConfig) -> RealmResult<()> {
        let level = self.boss_level();
        if boss.level != level
            || boss.health < level * 1000
            || boss.health >= level * 1200
            || boss.damage < level * 50
            || boss.damage >= level * 60
        {
            return Err(RealmError::GenerationFailed(format!(
                "boss {} breaks the level {} scaling law",
                boss.name, level
            )));
        }
        let expected = chest_item_count(self.dungeon_level)
            + usize::from(guaranteed_chest_rarity(self.dungeon_level).is_some());
        if boss.chest.items.len() != expected {
            return Err(RealmError::GenerationFailed(format!(
                "chest holds {} items, expected {}",
                boss.chest.items.len(),
                expected
            )));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "BossGenerator"
    }
}
