//! # World Generation
//!
//! Assembles the overworld: the dungeon ladder, fixed biomes, landmarks and
//! safe zones, and a height map.
//!
//! The height map is two layered sinusoids with a little Perlin jitter on
//! top, floored at sea level.

use crate::{
    Area, Biome, BiomeKind, DungeonGenerator, GameMap, GenerationConfig, Generator, Landmark,
    LandmarkKind, MapPosition, RealmError, RealmResult, SafeZone, SafeZoneKind, TerrainData,
};
use log::info;
use noise::{NoiseFn, Perlin};
use rand::rngs::StdRng;

const JITTER_AMPLITUDE: f64 = 20.0;
const JITTER_FREQUENCY: f64 = 0.37;

/// The overworld's biomes.
pub fn biomes() -> Vec<Biome> {
    let biome = |id: &str, name: &str, kind, x, y, width, height, color: &str| Biome {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        area: Area {
            x,
            y,
            width,
            height,
        },
        color: color.to_string(),
    };
    vec![
        biome("forest_1", "Whispering Woods", BiomeKind::Forest, -40_000.0, -40_000.0, 30_000.0, 30_000.0, "#2d5016"),
        biome("mountain_1", "Frozen Peaks", BiomeKind::Mountain, 10_000.0, -45_000.0, 35_000.0, 25_000.0, "#4a5568"),
        biome("desert_1", "Scorching Sands", BiomeKind::Desert, -45_000.0, 15_000.0, 40_000.0, 30_000.0, "#d69e2e"),
        biome("swamp_1", "Murky Marshlands", BiomeKind::Swamp, 5_000.0, 20_000.0, 25_000.0, 25_000.0, "#2d3748"),
        biome("plains_1", "Golden Plains", BiomeKind::Plains, -15_000.0, -15_000.0, 30_000.0, 30_000.0, "#38a169"),
        biome("tundra_1", "Icy Wasteland", BiomeKind::Tundra, 25_000.0, 25_000.0, 20_000.0, 20_000.0, "#e2e8f0"),
    ]
}

/// Named points of interest.
pub fn landmarks() -> Vec<Landmark> {
    let landmark = |id: &str, name: &str, kind, position, size| Landmark {
        id: id.to_string(),
        name: name.to_string(),
        kind,
        position,
        size,
    };
    vec![
        landmark("landmark_1", "Ancient Tower", LandmarkKind::Tower, MapPosition::new(0.0, 150.0, 0.0), 50.0),
        landmark("landmark_2", "Crystal Lake", LandmarkKind::Lake, MapPosition::new(-20_000.0, 0.0, 15_000.0), 200.0),
        landmark("landmark_3", "Dragon Mountain", LandmarkKind::Mountain, MapPosition::new(30_000.0, 300.0, -30_000.0), 500.0),
        landmark("landmark_4", "Lost Ruins", LandmarkKind::Ruins, MapPosition::new(-35_000.0, 20.0, -20_000.0), 100.0),
        landmark("landmark_5", "Enchanted Forest", LandmarkKind::Forest, MapPosition::new(-25_000.0, 10.0, -25_000.0), 300.0),
    ]
}

/// Towns and shelters where combat is not allowed.
pub fn safe_zones() -> Vec<SafeZone> {
    let zone = |id: &str, name: &str, x, z, radius, kind| SafeZone {
        id: id.to_string(),
        name: name.to_string(),
        position: MapPosition::new(x, 0.0, z),
        radius,
        kind,
    };
    vec![
        zone("safe_zone_1", "Central City", 0.0, 0.0, 1_000.0, SafeZoneKind::Town),
        zone("safe_zone_2", "Northern Outpost", 0.0, -40_000.0, 500.0, SafeZoneKind::Outpost),
        zone("safe_zone_3", "Eastern Sanctuary", 40_000.0, 0.0, 750.0, SafeZoneKind::Sanctuary),
        zone("safe_zone_4", "Southern Trading Post", 0.0, 40_000.0, 500.0, SafeZoneKind::Outpost),
        zone("safe_zone_5", "Western Haven", -40_000.0, 0.0, 750.0, SafeZoneKind::Sanctuary),
    ]
}

/// Square height map of `resolution` samples per side, indexed `[x][z]`.
pub fn height_map(resolution: usize, seed: u64) -> Vec<Vec<f64>> {
    let perlin = Perlin::new(seed as u32);
    (0..resolution)
        .map(|x| {
            (0..resolution)
                .map(|z| {
                    let (fx, fz) = (x as f64, z as f64);
                    let base = (fx * 0.1).sin() * (fz * 0.1).cos() * 50.0
                        + (fx * 0.05).sin() * (fz * 0.05).cos() * 100.0;
                    // Perlin output is roughly [-1, 1]; shift it into [0, amplitude]
                    let sample = perlin.get([fx * JITTER_FREQUENCY, fz * JITTER_FREQUENCY]);
                    let jitter = ((sample + 1.0) * 0.5).clamp(0.0, 1.0) * JITTER_AMPLITUDE;
                    (base + jitter).max(0.0)
                })
                .collect()
        })
        .collect()
}

/// Generates the complete [`GameMap`].
///
/// # Examples
///
/// ```
/// use shadowrealm::{GenerationConfig, Generator, WorldGenerator};
/// use shadowrealm::generation::utils::create_rng;
///
/// let config = GenerationConfig::for_testing(5);
/// let map = WorldGenerator::new().generate(&config, &mut create_rng(&config)).unwrap();
/// assert_eq!(map.name, "Realm of Shadows");
/// assert_eq!(map.dungeons.len(), 50);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorldGenerator {
    dungeons: DungeonGenerator,
}

impl WorldGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Generator<GameMap> for WorldGenerator {
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> RealmResult<GameMap> {
        let dungeons = self.dungeons.generate(config, rng)?;
        let map = GameMap {
            id: "main_world".to_string(),
            name: "Realm of Shadows".to_string(),
            size: config.map_size,
            dungeons,
            safe_zones: safe_zones(),
            terrain: TerrainData {
                height_map: height_map(config.height_map_resolution, config.seed),
                biomes: biomes(),
                landmarks: landmarks(),
            },
        };
        self.validate(&map, config)?;
        info!(
            "Generated {} with {} dungeons and a {}x{} height map",
            map.name,
            map.dungeons.len(),
            config.height_map_resolution,
            config.height_map_resolution
        );
        Ok(map)
    }

    fn validate(&self, map: &GameMap, config: &GenerationConfig) -> RealmResult<()> {
        self.dungeons.validate(&map.dungeons, config)?;
        let rows = &map.terrain.height_map;
        let square = rows.len() == config.height_map_resolution
            && rows.iter().all(|row| row.len() == config.height_map_resolution);
        if !square {
            return Err(RealmError::GenerationFailed(
                "height map is not square".to_string(),
            ));
        }
        if rows.iter().flatten().any(|h| !h.is_finite() || *h < 0.0) {
            return Err(RealmError::GenerationFailed(
                "height map has negative or non-finite samples".to_string(),
            ));
        }
        Ok(())
    }

    fn generator_type(&self) -> &'static str {
        "WorldGenerator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::utils::create_rng;

    #[test]
    fn test_fixed_tables() {
        assert_eq!(biomes().len(), 6);
        assert_eq!(landmarks().len(), 5);
        let zones = safe_zones();
        assert_eq!(zones.len(), 5);
        assert_eq!(zones[0].name, "Central City");
        assert_eq!(zones[0].kind, SafeZoneKind::Town);
    }

    #[test]
    fn test_height_map_shape() {
        let map = height_map(20, 9);
        assert_eq!(map.len(), 20);
        assert!(map.iter().all(|row| row.len() == 20));
        assert!(map.iter().flatten().all(|h| *h >= 0.0 && *h <= 170.0));
        assert_eq!(height_map(20, 9), map);
    }

    #[test]
    fn test_world_generation() {
        let config = GenerationConfig::for_testing(12);
        let map = WorldGenerator::new()
            .generate(&config, &mut create_rng(&config))
            .unwrap();
        assert_eq!(map.id, "main_world");
        assert_eq!(map.size.width, 100_000.0);
        assert_eq!(map.terrain.height_map.len(), config.height_map_resolution);
        assert!(map.safe_zone_at(MapPosition::new(100.0, 0.0, 100.0)).is_some());
        assert_eq!(map.dungeons_for_level(25).len(), 3);
    }
}
