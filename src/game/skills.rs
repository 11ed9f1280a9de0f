//! # Skills
//!
//! Immutable skill templates for every class and the hotbar that enforces
//! cooldowns and mana costs before a skill use is broadcast.
//!
//! A player "has" a skill when its class matches and its level is high
//! enough. There is no per-player skill levelling.

use super::{CharacterClass, Player};
use crate::config;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Whether a skill is cast or always on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillKind {
    Active,
    Passive,
}

/// A skill template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub character_class: CharacterClass,
    pub skill_type: SkillKind,
    pub damage: u32,
    pub healing: u32,
    pub mana_cost: u32,
    pub cooldown_ms: u64,
    pub level_required: u32,
}

impl Skill {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn is_passive(&self) -> bool {
        self.skill_type == SkillKind::Passive
    }

    pub fn available_to(&self, class: CharacterClass, level: u32) -> bool {
        self.character_class == class && self.level_required <= level
    }
}

#[allow(clippy::too_many_arguments)]
const fn skill(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    character_class: CharacterClass,
    skill_type: SkillKind,
    damage: u32,
    healing: u32,
    mana_cost: u32,
    cooldown_ms: u64,
    level_required: u32,
) -> Skill {
    Skill {
        id,
        name,
        description,
        character_class,
        skill_type,
        damage,
        healing,
        mana_cost,
        cooldown_ms,
        level_required,
    }
}

use CharacterClass::{Dps, Healer, Tank};
use SkillKind::{Active, Passive};

/// Every skill in the game, grouped by class.
pub static SKILLS: [Skill; 60] = [
    skill("heal_1", "Minor Heal", "Restores 50 health to target", Healer, Active, 0, 50, 20, 2000, 1),
    skill("heal_2", "Greater Heal", "Restores 100 health to target", Healer, Active, 0, 100, 40, 4000, 5),
    skill("heal_3", "Group Heal", "Heals all nearby allies for 75 health", Healer, Active, 0, 75, 60, 8000, 10),
    skill("heal_4", "Regeneration", "Heals target for 20 health over 10 seconds", Healer, Active, 0, 20, 30, 6000, 8),
    skill("heal_5", "Divine Protection", "Reduces damage taken by 50% for 10 seconds", Healer, Active, 0, 0, 50, 15000, 12),
    skill("heal_6", "Resurrection", "Revives a fallen ally with 50% health", Healer, Active, 0, 0, 100, 30000, 15),
    skill("heal_7", "Mana Shield", "Absorbs damage using mana instead of health", Healer, Active, 0, 0, 40, 12000, 18),
    skill("heal_8", "Purify", "Removes all debuffs from target", Healer, Active, 0, 0, 35, 8000, 14),
    skill("heal_9", "Holy Light", "Deals 80 damage to undead enemies or heals 80 to allies", Healer, Active, 80, 80, 45, 5000, 16),
    skill("heal_10", "Sanctuary", "Creates a healing zone that restores 15 health per second", Healer, Active, 0, 15, 70, 20000, 20),
    skill("heal_11", "Blessing of Vitality", "Increases max health by 25% for 5 minutes", Healer, Active, 0, 0, 60, 300000, 22),
    skill("heal_12", "Spirit Link", "Links health between caster and target", Healer, Active, 0, 0, 80, 25000, 25),
    skill("heal_13", "Mass Resurrection", "Revives all fallen allies in area", Healer, Active, 0, 0, 200, 60000, 30),
    skill("heal_14", "Divine Favor", "Next 3 spells cost no mana", Healer, Active, 0, 0, 0, 45000, 28),
    skill("heal_15", "Healing Mastery", "Passive: All healing spells are 25% more effective", Healer, Passive, 0, 0, 0, 0, 35),
    skill("heal_16", "Mana Burn", "Drains 60 mana from enemy and deals damage equal to mana drained", Healer, Active, 60, 0, 40, 10000, 32),
    skill("heal_17", "Guardian Angel", "Prevents target from dying for 5 seconds", Healer, Active, 0, 0, 120, 120000, 40),
    skill("heal_18", "Tranquility", "Channeled spell that heals all allies for 30 health per second", Healer, Active, 0, 30, 100, 60000, 38),
    skill("heal_19", "Divine Wrath", "Deals massive damage based on missing health of caster", Healer, Active, 200, 0, 80, 30000, 45),
    skill("heal_20", "Ascension", "Ultimate: Become invulnerable and heal all allies to full health", Healer, Active, 0, 999, 200, 300000, 50),
    skill("tank_1", "Shield Bash", "Deals 40 damage and stuns enemy for 2 seconds", Tank, Active, 40, 0, 15, 6000, 1),
    skill("tank_2", "Taunt", "Forces enemy to attack you for 5 seconds", Tank, Active, 0, 0, 20, 8000, 3),
    skill("tank_3", "Shield Wall", "Reduces damage taken by 75% for 8 seconds", Tank, Active, 0, 0, 40, 20000, 7),
    skill("tank_4", "Charge", "Rush to target dealing 60 damage and stunning for 1 second", Tank, Active, 60, 0, 25, 10000, 5),
    skill("tank_5", "Intimidating Shout", "Causes nearby enemies to flee for 3 seconds", Tank, Active, 0, 0, 30, 15000, 9),
    skill("tank_6", "Revenge", "Next attack deals 100% more damage after taking damage", Tank, Active, 80, 0, 35, 12000, 11),
    skill("tank_7", "Guardian Stance", "Reduces damage taken by 30% but also reduces damage dealt by 20%", Tank, Active, 0, 0, 50, 5000, 13),
    skill("tank_8", "Shield Slam", "Deals 70 damage and reduces enemy damage by 25% for 6 seconds", Tank, Active, 70, 0, 40, 8000, 15),
    skill("tank_9", "Berserker Rage", "Increases damage by 50% but takes 25% more damage for 10 seconds", Tank, Active, 0, 0, 60, 25000, 17),
    skill("tank_10", "Fortress", "Becomes immobile but immune to all damage for 5 seconds", Tank, Active, 0, 0, 80, 45000, 20),
    skill("tank_11", "Armor Mastery", "Passive: Reduces all physical damage by 15%", Tank, Passive, 0, 0, 0, 0, 22),
    skill("tank_12", "Rallying Cry", "Increases all nearby allies damage and defense by 20% for 30 seconds", Tank, Active, 0, 0, 70, 60000, 25),
    skill("tank_13", "Earthquake", "Deals 90 damage to all nearby enemies and slows them", Tank, Active, 90, 0, 100, 20000, 28),
    skill("tank_14", "Last Stand", "When health drops below 25%, gain 100% damage resistance for 8 seconds", Tank, Passive, 0, 0, 0, 120000, 30),
    skill("tank_15", "Shield Mastery", "Passive: 25% chance to block attacks completely", Tank, Passive, 0, 0, 0, 0, 32),
    skill("tank_16", "Whirlwind", "Spin attack that hits all nearby enemies for 85 damage", Tank, Active, 85, 0, 60, 15000, 35),
    skill("tank_17", "Unbreakable", "Immune to stuns, slows, and debuffs for 12 seconds", Tank, Active, 0, 0, 90, 90000, 38),
    skill("tank_18", "Sacrifice", "Take all damage intended for nearby allies for 10 seconds", Tank, Active, 0, 0, 120, 120000, 40),
    skill("tank_19", "Meteor Strike", "Leap into air and crash down dealing 250 damage in large area", Tank, Active, 250, 0, 150, 60000, 45),
    skill("tank_20", "Immortal Guardian", "Ultimate: Cannot die for 15 seconds and reflect all damage back to attackers", Tank, Active, 0, 0, 200, 300000, 50),
    skill("dps_1", "Quick Strike", "Fast attack dealing 45 damage", Dps, Active, 45, 0, 10, 1500, 1),
    skill("dps_2", "Power Shot", "Charged attack dealing 80 damage", Dps, Active, 80, 0, 25, 4000, 3),
    skill("dps_3", "Stealth", "Become invisible for 6 seconds, next attack deals double damage", Dps, Active, 0, 0, 40, 15000, 6),
    skill("dps_4", "Poison Blade", "Next 5 attacks deal additional 15 poison damage over time", Dps, Active, 15, 0, 35, 12000, 8),
    skill("dps_5", "Multi-Shot", "Attack hits up to 3 enemies for 60 damage each", Dps, Active, 60, 0, 45, 8000, 10),
    skill("dps_6", "Critical Strike", "Guaranteed critical hit dealing 120 damage", Dps, Active, 120, 0, 50, 10000, 12),
    skill("dps_7", "Shadow Step", "Teleport behind enemy and deal 70 damage", Dps, Active, 70, 0, 40, 12000, 14),
    skill("dps_8", "Berserker Mode", "Attack speed increased by 100% for 8 seconds", Dps, Active, 0, 0, 60, 25000, 16),
    skill("dps_9", "Explosive Arrow", "Ranged attack that explodes for 100 damage in area", Dps, Active, 100, 0, 55, 15000, 18),
    skill("dps_10", "Assassinate", "Instantly kill enemy below 30% health", Dps, Active, 999, 0, 80, 30000, 20),
    skill("dps_11", "Dual Wield Mastery", "Passive: 30% chance to attack twice", Dps, Passive, 0, 0, 0, 0, 22),
    skill("dps_12", "Shadow Clone", "Create a clone that fights alongside you for 20 seconds", Dps, Active, 50, 0, 100, 45000, 25),
    skill("dps_13", "Flame Strike", "Weapon ignites dealing 90 damage plus 20 fire damage over 5 seconds", Dps, Active, 90, 0, 65, 18000, 28),
    skill("dps_14", "Evasion", "Dodge all attacks for 5 seconds", Dps, Active, 0, 0, 70, 35000, 30),
    skill("dps_15", "Weapon Mastery", "Passive: All attacks have 20% chance to ignore armor", Dps, Passive, 0, 0, 0, 0, 32),
    skill("dps_16", "Chain Lightning", "Lightning jumps between up to 5 enemies dealing 85 damage each", Dps, Active, 85, 0, 90, 20000, 35),
    skill("dps_17", "Time Slow", "Slows all enemies by 75% for 8 seconds", Dps, Active, 0, 0, 120, 60000, 38),
    skill("dps_18", "Perfect Strike", "Next attack cannot miss and deals 200 damage", Dps, Active, 200, 0, 100, 25000, 40),
    skill("dps_19", "Meteor Storm", "Rain meteors in large area for 10 seconds, each dealing 80 damage", Dps, Active, 80, 0, 180, 90000, 45),
    skill("dps_20", "Avatar of Destruction", "Ultimate: Transform into pure damage, all attacks deal 300% damage for 20 seconds", Dps, Active, 0, 0, 200, 300000, 50),
];

/// Looks a skill up by id.
pub fn find_skill(id: &str) -> Option<&'static Skill> {
    SKILLS.iter().find(|skill| skill.id == id)
}

/// Skills a character of `class` at `level` qualifies for, in table order.
///
/// # Examples
///
/// ```
/// use shadowrealm::{skills_for, CharacterClass};
///
/// let skills = skills_for(CharacterClass::Dps, 1);
/// assert_eq!(skills.len(), 1);
/// assert_eq!(skills[0].name, "Quick Strike");
/// ```
pub fn skills_for(class: CharacterClass, level: u32) -> Vec<&'static Skill> {
    SKILLS
        .iter()
        .filter(|skill| skill.available_to(class, level))
        .collect()
}

/// Why a hotbar skill could not be used.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkillUseError {
    #[error("Skill {0} is not on the hotbar")]
    NotOnHotbar(String),

    #[error("{name} is on cooldown for another {remaining_ms} ms")]
    OnCooldown { name: &'static str, remaining_ms: u64 },

    #[error("{name} needs {needed} mana, {available} available")]
    NotEnoughMana {
        name: &'static str,
        needed: u32,
        available: u32,
    },

    #[error("{0} is passive and cannot be activated")]
    Passive(&'static str),
}

/// The skills a player has slotted, with their running cooldowns.
#[derive(Debug, Clone, Default)]
pub struct SkillBar {
    slots: Vec<&'static Skill>,
    cooldowns: HashMap<&'static str, Duration>,
}

impl SkillBar {
    /// Fills the bar with the first qualifying skills for this player.
    pub fn for_player(player: &Player) -> Self {
        let mut slots = skills_for(player.character_class, player.level);
        slots.truncate(config::HOTBAR_SIZE);
        Self {
            slots,
            cooldowns: HashMap::new(),
        }
    }

    pub fn slots(&self) -> &[&'static Skill] {
        &self.slots
    }

    /// Remaining cooldown of a skill; zero when ready.
    pub fn cooldown_remaining(&self, skill_id: &str) -> Duration {
        self.cooldowns.get(skill_id).copied().unwrap_or(Duration::ZERO)
    }

    /// Validates and consumes a skill use.
    ///
    /// On success mana has been deducted from `player` and the cooldown has
    /// started; the caller is then expected to broadcast the use.
    pub fn try_use(
        &mut self,
        skill_id: &str,
        player: &mut Player,
    ) -> Result<&'static Skill, SkillUseError> {
        let skill = self
            .slots
            .iter()
            .copied()
            .find(|skill| skill.id == skill_id)
            .ok_or_else(|| SkillUseError::NotOnHotbar(skill_id.to_string()))?;

        if skill.is_passive() {
            return Err(SkillUseError::Passive(skill.name));
        }

        let remaining = self.cooldown_remaining(skill.id);
        if !remaining.is_zero() {
            return Err(SkillUseError::OnCooldown {
                name: skill.name,
                remaining_ms: remaining.as_millis() as u64,
            });
        }

        if !player.spend_mana(skill.mana_cost) {
            return Err(SkillUseError::NotEnoughMana {
                name: skill.name,
                needed: skill.mana_cost,
                available: player.mana,
            });
        }

        if !skill.cooldown().is_zero() {
            self.cooldowns.insert(skill.id, skill.cooldown());
        }
        Ok(skill)
    }

    /// Ticks every cooldown down by `elapsed`.
    pub fn advance(&mut self, elapsed: Duration) {
        self.cooldowns.retain(|_, remaining| {
            *remaining = remaining.saturating_sub(elapsed);
            !remaining.is_zero()
        });
    }
}
