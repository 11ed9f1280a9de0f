//! # Item Generation
//!
//! Loot rolled for a given dungeon level. Rarity shifts upward with level
//! and scales every stat.

use super::utils;
use crate::{new_id, GenerationConfig, Generator, Item, ItemStats, ItemType, Rarity, RealmError, RealmResult};
use rand::rngs::StdRng;
use rand::Rng;

const WEAPON_NAMES: &[&str] = &["Sword", "Staff", "Bow", "Dagger", "Mace", "Axe", "Wand", "Spear"];
const ARMOR_NAMES: &[&str] = &["Helmet", "Chestplate", "Leggings", "Boots", "Gloves", "Shield"];
const CONSUMABLE_NAMES: &[&str] = &["Health Potion", "Mana Potion", "Elixir", "Scroll", "Food"];
const MATERIAL_NAMES: &[&str] = &["Ore", "Gem", "Crystal", "Essence", "Fragment"];
const ACCESSORY_NAMES: &[&str] = &["Ring", "Amulet", "Bracelet", "Earring", "Charm"];

fn base_names(item_type: ItemType) -> &'static [&'static str] {
    match item_type {
        ItemType::Weapon => WEAPON_NAMES,
        ItemType::Armor => ARMOR_NAMES,
        ItemType::Consumable => CONSUMABLE_NAMES,
        ItemType::Material => MATERIAL_NAMES,
        ItemType::Accessory => ACCESSORY_NAMES,
    }
}

fn prefixes(rarity: Rarity) -> &'static [&'static str] {
    match rarity {
        Rarity::Common => &["Simple", "Basic", "Plain"],
        Rarity::Uncommon => &["Fine", "Quality", "Sturdy"],
        Rarity::Rare => &["Superior", "Excellent", "Masterwork"],
        Rarity::Epic => &["Legendary", "Mythical", "Ancient"],
        Rarity::Legendary => &["Divine", "Celestial", "Eternal"],
    }
}

/// Generates one item for a dungeon of a given level.
///
/// # Examples
///
/// ```
/// use shadowrealm::{GenerationConfig, Generator, ItemGenerator, Rarity};
/// use shadowrealm::generation::utils::create_rng;
///
/// let config = GenerationConfig::default();
/// let mut rng = create_rng(&config);
/// let item = ItemGenerator::new(40).with_rarity(Rarity::Epic).generate(&config, &mut rng).unwrap();
/// assert_eq!(item.rarity, Rarity::Epic);
/// assert!((39..=41).contains(&item.level));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemGenerator {
    pub dungeon_level: u32,
    /// Skip the rarity roll and use this tier
    pub forced_rarity: Option<Rarity>,
}

impl ItemGenerator {
    pub fn new(dungeon_level: u32) -> Self {
        Self {
            dungeon_level,
            forced_rarity: None,
        }
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.forced_rarity = Some(rarity);
        self
    }

    /// Rolls one item. Infallible; [`Generator::generate`] wraps this.
    pub fn roll(&self, rng: &mut StdRng) -> Item {
        let rarity = match self.forced_rarity {
            Some(rarity) => rarity,
            None => utils::sample_rarity(self.dungeon_level, rng),
        };
        let types = ItemType::all();
        let item_type = types[rng.gen_range(0..types.len())];
        // One level of variance either way
        let level = (self.dungeon_level + rng.gen_range(0..3)).saturating_sub(1);
        let stats = roll_stats(item_type, level, rarity.stat_multiplier(), rng);

        let base = utils::pick(base_names(item_type), rng);
        let prefix = utils::pick(prefixes(rarity), rng);

        Item {
            id: new_id("item"),
            name: format!("{} {}", prefix, base),
            item_type,
            rarity,
            level,
            stats,
            description: format!(
                "A {} {} found in a level {} dungeon.",
                rarity.as_str(),
                item_type.as_str(),
                self.dungeon_level
            ),
        }
    }

    /// Rolls `count` items.
    pub fn roll_many(&self, count: usize, rng: &mut StdRng) -> Vec<Item> {
        (0..count).map(|_| self.roll(rng)).collect()
    }
}

/// `(base + U[0, spread)) * multiplier`, floored.
fn scaled(base: u32, spread: f64, multiplier: f64, rng: &mut StdRng) -> u32 {
    ((base as f64 + rng.gen::<f64>() * spread) * multiplier).floor() as u32
}

fn roll_stats(item_type: ItemType, level: u32, multiplier: f64, rng: &mut StdRng) -> ItemStats {
    let is_weapon = item_type == ItemType::Weapon;
    let mut stats = ItemStats::default();

    if is_weapon {
        stats.damage = Some(scaled(level * 10, 20.0, multiplier, rng));
    }
    if item_type == ItemType::Armor {
        stats.defense = Some(scaled(level * 8, 15.0, multiplier, rng));
    }
    if rng.gen::<f64>() > 0.7 {
        stats.health = Some(scaled(level * 15, 30.0, multiplier, rng));
    }
    if rng.gen::<f64>() > 0.8 {
        stats.mana = Some(scaled(level * 12, 25.0, multiplier, rng));
    }
    if rng.gen::<f64>() > 0.9 {
        stats.critical_chance = Some(scaled(0, 15.0, multiplier, rng));
    }
    if rng.gen::<f64>() > 0.9 {
        stats.critical_damage = Some(scaled(0, 50.0, multiplier, rng));
    }
    if is_weapon && rng.gen::<f64>() > 0.95 {
        stats.healing_power = Some(scaled(level * 5, 10.0, multiplier, rng));
    }
    stats
}

impl Generator<Item> for ItemGenerator {
    fn generate(&self, _config: &GenerationConfig, rng: &mut StdRng) -> RealmResult<Item> {
        Ok(self.roll(rng))
    }

    fn validate(&self, item: &Item, _config: &GenerationConfig) -> RealmResult<()> {
        if item.level + 1 < self.dungeon_level || item.level > self.dungeon_level + 1 {
            return Err(RealmError::GenerationFailed(format!(
                "item level {} too far from dungeon level {}",
                item.level, self.dungeon_level
            )));
        }
        match item.item_type {
            ItemType::Weapon if item.stats.damage.is_none() => Err(RealmError::GenerationFailed(
                "weapon without damage".to_string(),
            )),
            ItemType::Armor if item.stats.defense.is_none() => Err(RealmError::GenerationFailed(
                "armor without defense".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn generator_type(&self) -> &'static str {
        "ItemGenerator"
    }
}
