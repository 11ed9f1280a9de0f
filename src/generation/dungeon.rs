//! # Dungeon Generation
//!
//! Builds the dungeon ladder: one dungeon every ten levels, each made of two
//! plain floors followed by a boss floor, spread further from the world
//! centre as the level rises.

use super::utils;
use crate::{
    now_millis, BossGenerator, Dungeon, DungeonFloor, EnemyGenerator, GenerationConfig, Generator,
    MapPosition, RealmError, RealmResult,
};
use log::info;
use rand::rngs::StdRng;
use rand::Rng;

/// Naming themes, cycled every five dungeons.
const THEME_PREFIXES: [&str; 10] = [
    "Crypt of",
    "Cavern of",
    "Sanctuary of",
    "Fortress of",
    "Temple of",
    "Tower of",
    "Dungeon of",
    "Shrine of",
    "Labyrinth of",
    "Ruins of",
];

fn name_suffixes(level: u32) -> &'static [&'static str] {
    match level {
        0..=50 => &["Beginnings", "First Steps", "Dawn", "Awakening", "Novice Trials"],
        51..=100 => &["Shadows", "Mist", "Twilight", "Echoes", "Whispers"],
        101..=200 => &["Storms", "Flames", "Thunder", "Lightning", "Fury"],
        201..=300 => &["Darkness", "Void", "Abyss", "Nightmare", "Terror"],
        301..=400 => &["Destruction", "Chaos", "Apocalypse", "Ruin", "Devastation"],
        _ => &["Eternity", "Infinity", "Transcendence", "Ascension", "Divinity"],
    }
}

/// Entrance position for a dungeon of `level`. Low levels stay near the
/// centre; the hardest ones use the whole map.
pub fn dungeon_position(level: u32, map_width: f64, rng: &mut StdRng) -> MapPosition {
    let (spread, y_span, y_base) = if level <= 100 {
        (40_000.0, 50.0, 10.0)
    } else if level <= 250 {
        (70_000.0, 100.0, 20.0)
    } else {
        (map_width, 200.0, 50.0)
    };
    MapPosition::new(
        (rng.gen::<f64>() - 0.5) * spread,
        rng.gen::<f64>() * y_span + y_base,
        (rng.gen::<f64>() - 0.5) * spread,
    )
}

/// Generates every dungeon in the world.
///
/// # Examples
///
/// ```
/// use shadowrealm::{DungeonGenerator, GenerationConfig, Generator};
/// use shadowrealm::generation::utils::create_rng;
///
/// let config = GenerationConfig::for_testing(3);
/// let dungeons = DungeonGenerator::new().generate(&config, &mut create_rng(&config)).unwrap();
/// assert_eq!(dungeons.len(), 50);
/// assert_eq!(dungeons[0].id, "dungeon_01");
/// assert_eq!(dungeons[49].level, 491);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DungeonGenerator {
    /// Plain floors before the boss floor
    pub plain_floors: u32,
}

impl DungeonGenerator {
    pub fn new() -> Self {
        Self { plain_floors: 2 }
    }

    /// Builds the dungeon at ladder position `index` (zero-based).
    pub fn build(&self, index: u32, config: &GenerationConfig, rng: &mut StdRng) -> Dungeon {
        let level = config.dungeon_level(index);
        let id = format!("dungeon_{:02}", index + 1);
        let position = dungeon_position(level, config.map_size.width, rng);

        let prefix = THEME_PREFIXES[(index as usize / 5) % THEME_PREFIXES.len()];
        let name = format!("{} {}", prefix, utils::pick(name_suffixes(level), rng));

        let mut floors: Vec<DungeonFloor> = (1..=self.plain_floors)
            .map(|floor_number| DungeonFloor {
                id: format!("{}_floor_{}", id, floor_number),
                dungeon_id: id.clone(),
                floor_number,
                enemies: EnemyGenerator::new(level, floor_number).roll(rng),
                boss: None,
                is_cleared: false,
                required_level: level,
            })
            .collect();
        floors.push(DungeonFloor {
            id: format!("{}_floor_boss", id),
            dungeon_id: id.clone(),
            floor_number: self.plain_floors + 1,
            enemies: Vec::new(),
            boss: Some(BossGenerator::new(level, id.clone()).roll(rng)),
            is_cleared: false,
            required_level: level,
        });

        Dungeon {
            id,
            name,
            level,
            position,
            floors,
            is_active: true,
            players_inside: Vec::new(),
            created_at: now_millis(),
        }
    }
}

impl Default for DungeonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator<Vec<Dungeon>> for DungeonGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> RealmResult<Vec<Dungeon>> {
        let dungeons: Vec<Dungeon> = (0..config.dungeon_count)
            .map(|index| self.build(index, config, rng))
            .collect();
        self.validate(&dungeons, config)?;
        info!("Generated {} dungeons", dungeons.len());
        Ok(dungeons)
    }

    fn validate(&self, dungeons: &Vec<Dungeon>, config: &GenerationConfig) -> RealmResult<()> {
        if dungeons.len() != config.dungeon_count as usize {
            return Err(RealmError::GenerationFailed(format!(
                "expected {} dungeons, got {}",
                config.dungeon_count,
                dungeons.len()
            )));
        }
        for (index, dungeon) in dungeons.iter().enumerate() {
            if dungeon.level != config.dungeon_level(index as u32) {
                return Err(RealmError::GenerationFailed(format!(
                    "{} has level {}",
                    dungeon.id, dungeon.level
                )));
            }
            if dungeon.floors.len() != self.plain_floors as usize + 1 || !dungeon.has_valid_layout() {
                return Err(RealmError::GenerationFailed(format!(
                    "{} does not end in a single boss floor",
                    dungeon.id
                )));
            }
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "DungeonGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    #[test]
    fn test_dungeon_generator_creation() {
        assert_eq!(DungeonGenerator::new().plain_floors, 2);
        assert_eq!(DungeonGenerator::default(), DungeonGenerator::new());
    }

    #[test]
    fn test_names_follow_themes() {
        let config = GenerationConfig::for_testing(17);
        let mut rng = create_rng(&config);
        let generator = DungeonGenerator::new();
        assert!(generator.build(0, &config, &mut rng).name.starts_with("Crypt of "));
        assert!(generator.build(5, &config, &mut rng).name.starts_with("Cavern of "));
        assert!(generator.build(49, &config, &mut rng).name.starts_with("Ruins of "));
    }

    #[test]
    fn test_position_spread_by_level() {
        let mut rng = create_rng(&GenerationConfig::for_testing(2));
        for _ in 0..200 {
            let low = dungeon_position(91, 100_000.0, &mut rng);
            assert!(low.x.abs() <= 20_000.0 && low.z.abs() <= 20_000.0);
            assert!((10.0..60.0).contains(&low.y));

            let mid = dungeon_position(241, 100_000.0, &mut rng);
            assert!(mid.x.abs() <= 35_000.0);
            assert!((20.0..120.0).contains(&mid.y));

            let high = dungeon_position(491, 100_000.0, &mut rng);
            assert!(high.z.abs() <= 50_000.0);
            assert!((50.0..250.0).contains(&high.y));
        }
    }

    #[test]
    fn test_floor_ids() {
        let config = GenerationConfig::for_testing(1);
        let dungeon = DungeonGenerator::new().build(9, &config, &mut create_rng(&config));
        assert_eq!(dungeon.id, "dungeon_10");
        assert_eq!(dungeon.level, 91);
        let ids: Vec<&str> = dungeon.floors.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, ["dungeon_10_floor_1", "dungeon_10_floor_2", "dungeon_10_floor_boss"]);
        assert_eq!(dungeon.boss().map(|b| b.id.as_str()), Some("boss_dungeon_10"));
    }
}
