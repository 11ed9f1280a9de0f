//! # Generation Module
//!
//! Procedural content generation for the world: loot, enemies, bosses, the
//! fifty-dungeon ladder and the overworld map.
//!
//! Flavour (names, descriptions) is free to vary, but the scaling laws that
//! decide rarity, health, damage and enemy counts are balance-critical and
//! fixed. Every generator draws from a caller-supplied seeded [`StdRng`], so a
//! given [`GenerationConfig`] always produces the same stats.

pub mod dungeon;
pub mod encounters;
pub mod items;
pub mod terrain;

pub use dungeon::*;
pub use encounters::*;
pub use items::*;
pub use terrain::*;

use crate::{MapSize, RealmResult};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Configuration for procedural generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Random seed for reproducible generation
    pub seed: u64,
    /// Number of dungeons in the world
    pub dungeon_count: u32,
    /// Level difference between consecutive dungeons
    pub level_step: u32,
    /// Height map samples per side
    pub height_map_resolution: usize,
    /// World extents in meters
    pub map_size: MapSize,
}

impl GenerationConfig {
    /// Creates the standard world configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use shadowrealm::GenerationConfig;
    ///
    /// let config = GenerationConfig::new(7);
    /// assert_eq!(config.dungeon_count, 50);
    /// assert_eq!(config.level_step, 10);
    /// ```
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            dungeon_count: 50,
            level_step: 10,
            height_map_resolution: 200,
            map_size: MapSize {
                width: 100_000.0,
                height: 1_000.0,
                depth: 100_000.0,
            },
        }
    }

    /// Same balance as [`GenerationConfig::new`] with a coarse height map.
    pub fn for_testing(seed: u64) -> Self {
        Self {
            height_map_resolution: 16,
            ..Self::new(seed)
        }
    }

    /// Level of the dungeon at `index` (zero-based).
    pub fn dungeon_level(&self, index: u32) -> u32 {
        index * self.level_step + 1
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(42)
    }
}

/// Trait for procedural generators.
pub trait Generator<T> {
    /// Generates content using the provided configuration and random number generator.
    fn generate(&self, config: &GenerationConfig, rng: &mut StdRng) -> RealmResult<T>;

    /// Validates that the generated content meets requirements.
    fn validate(&self, content: &T, config: &GenerationConfig) -> RealmResult<()>;

    /// Gets the generator type name for logging and debugging.
    fn generator_type(&self) -> &'static str;
}

/// Utility functions for generation algorithms.
pub mod utils {
    use crate::Rarity;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::GenerationConfig;

    /// Creates a seeded random number generator from the config.
    pub fn create_rng(config: &GenerationConfig) -> StdRng {
        StdRng::seed_from_u64(config.seed)
    }

    /// Rarity weights (common to legendary, summing to 100) for loot found
    /// in a dungeon of `dungeon_level`.
    ///
    /// # Examples
    ///
    /// ```
    /// use shadowrealm::generation::utils::rarity_weights;
    ///
    /// assert_eq!(rarity_weights(5), [50, 30, 15, 4, 1]);
    /// assert_eq!(rarity_weights(20), [30, 35, 25, 8, 2]);
    /// assert_eq!(rarity_weights(100), [20, 25, 30, 20, 5]);
    /// ```
    pub fn rarity_weights(dungeon_level: u32) -> [u32; 5] {
        if dungeon_level <= 10 {
            [50, 30, 15, 4, 1]
        } else if dungeon_level <= 30 {
            [30, 35, 25, 8, 2]
        } else {
            [20, 25, 30, 20, 5]
        }
    }

    /// Picks the rarity whose cumulative weight first reaches `draw`.
    ///
    /// `draw` is expected in `[0, 100)`; anything past the total falls back
    /// to common.
    pub fn rarity_for_draw(weights: [u32; 5], draw: f64) -> Rarity {
        let mut cumulative = 0.0;
        for (rarity, weight) in Rarity::all().into_iter().zip(weights) {
            cumulative += weight as f64;
            if draw < cumulative {
                return rarity;
            }
        }
        Rarity::Common
    }

    /// Samples a loot rarity for a dungeon of `dungeon_level`.
    pub fn sample_rarity(dungeon_level: u32, rng: &mut StdRng) -> Rarity {
        let draw = rng.gen::<f64>() * 100.0;
        rarity_for_draw(rarity_weights(dungeon_level), draw)
    }

    /// Picks one entry of a non-empty pool.
    pub fn pick<'a>(pool: &[&'a str], rng: &mut StdRng) -> &'a str {
        if pool.is_empty() {
            return "";
        }
        pool[rng.gen_range(0..pool.len())]
    }

    /// Uniform value in `[0, span)`, or 0 for an empty span.
    pub fn below(span: u32, rng: &mut StdRng) -> u32 {
        if span == 0 {
            0
        } else {
            rng.gen_range(0..span)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use super::*;
    use crate::Rarity;

    #[test]
    fn test_generation_config_creation() {
        let config = GenerationConfig::new(12345);
        assert_eq!(config.seed, 12345);
        assert_eq!(config.dungeon_level(0), 1);
        assert_eq!(config.dungeon_level(49), 491);
        assert_eq!(GenerationConfig::default().seed, 42);
        assert!(GenerationConfig::for_testing(1).height_map_resolution < config.height_map_resolution);
    }

    #[test]
    fn test_rarity_weights_sum_to_hundred() {
        for level in [1, 10, 11, 30, 31, 491] {
            assert_eq!(rarity_weights(level).iter().sum::<u32>(), 100);
        }
    }

    #[test]
    fn test_cumulative_thresholds() {
        let weights = rarity_weights(5);
        assert_eq!(rarity_for_draw(weights, 0.0), Rarity::Common);
        assert_eq!(rarity_for_draw(weights, 49.9), Rarity::Common);
        assert_eq!(rarity_for_draw(weights, 50.0), Rarity::Uncommon);
        assert_eq!(rarity_for_draw(weights, 80.0), Rarity::Rare);
        assert_eq!(rarity_for_draw(weights, 95.5), Rarity::Epic);
        assert_eq!(rarity_for_draw(weights, 99.5), Rarity::Legendary);
    }

    #[test]
    fn test_sampled_rarities_follow_tier() {
        let config = GenerationConfig::for_testing(99);
        let mut rng = create_rng(&config);
        let mut counts = [0u32; 5];
        for _ in 0..10_000 {
            counts[sample_rarity(5, &mut rng) as usize] += 1;
        }
        // Roughly 50% common, 1% legendary for the lowest tier.
        assert!((4_500..5_500).contains(&counts[0]));
        assert!(counts[4] < 300);
    }

    #[test]
    fn test_utils_rng_creation() {
        use rand::Rng;
        let config = GenerationConfig::new(12345);
        let a: u64 = create_rng(&config).gen();
        let b: u64 = create_rng(&config).gen();
        assert_eq!(a, b);
    }
}
